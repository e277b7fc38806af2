//! §6 binary-rewriting contract — interface only. The rewriter that
//! retargets compiled code onto the controlled-task shim is out of scope
//! (spec "Out of scope"); this module is the narrow surface the runtime
//! needs to refuse to run an artifact the rewriter didn't actually
//! produce, or produced with a different configuration than the one this
//! run is about to use.

use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::errors::RuntimeError;

/// `{tool_version, hash(configuration-subset)}` (spec §6), stamped onto a
/// rewritten artifact by the (out-of-scope) rewriter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSignature {
    pub tool_version: String,
    pub configuration_hash: String,
}

impl ArtifactSignature {
    pub fn new(tool_version: impl Into<String>, configuration: &Configuration) -> Self {
        ArtifactSignature {
            tool_version: tool_version.into(),
            configuration_hash: hash_configuration_subset(configuration),
        }
    }
}

/// Hashes the subset of `Configuration` that affects rewriting decisions
/// (the scheduling strategy and step budgets — the fields a rewritten
/// artifact's behavior actually depends on); verbosity/telemetry/trace
/// path are not rewrite-relevant and are excluded so that changing them
/// does not spuriously invalidate an artifact.
fn hash_configuration_subset(configuration: &Configuration) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    format!("{:?}", configuration.strategy).hash(&mut hasher);
    configuration.max_unfair_scheduling_steps.hash(&mut hasher);
    configuration.max_fair_scheduling_steps.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Verifies a rewritten artifact's stamped signature against the
/// signature this run would produce. The runtime refuses to run an
/// artifact stamped with a mismatched signature (spec §6).
pub fn verify_artifact_signature(
    stamped: &ArtifactSignature,
    tool_version: &str,
    configuration: &Configuration,
) -> Result<(), RuntimeError> {
    let expected = ArtifactSignature::new(tool_version, configuration);
    if stamped == &expected {
        Ok(())
    } else {
        Err(RuntimeError::RewrittenArtifactMismatch {
            expected: format!("{}:{}", expected.tool_version, expected.configuration_hash),
            found: format!("{}:{}", stamped.tool_version, stamped.configuration_hash),
        })
    }
}
