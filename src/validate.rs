use regex::Regex;
use thiserror::Error;

/// Actor names are used as the key of the context's name→id registry and
/// must be representable as a path segment in human-readable traces.
pub fn validate_name(name: &str) -> Result<(), InvalidName> {
    let rgx = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    if !rgx.is_match(name) {
        Err(InvalidName { name: name.into() })
    } else {
        Ok(())
    }
}

#[derive(Error, Debug, Clone)]
#[error("invalid actor name \"{name}\": must contain only a-Z, 0-9, _, or -")]
pub struct InvalidName {
    pub name: String,
}
