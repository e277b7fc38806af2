//! C4 ambient — actor factories. Grounded on the teacher's `Props`/
//! `ActorProducer`/`ActorFactory`/`ActorFactoryArgs`, trimmed to what a
//! single-threaded context needs: `produce()` is called at most once per
//! `Context::create`, never shared across real threads, so the teacher's
//! `Arc<Mutex<Box<dyn ActorProducer>>>` collapses to a plain boxed `FnMut`.

use crate::actor::actor_trait::Actor;

pub trait ActorFactory: Actor {
    fn create() -> Self;
}

pub trait ActorFactoryArgs<Args>: Actor {
    fn create_args(args: Args) -> Self;
}

trait ActorProducer {
    type Actor: Actor;
    fn produce(&mut self) -> Self::Actor;
}

struct Producer<A, F: FnMut() -> A> {
    f: F,
}

impl<A: Actor, F: FnMut() -> A> ActorProducer for Producer<A, F> {
    type Actor = A;
    fn produce(&mut self) -> A {
        (self.f)()
    }
}

/// A deferred actor construction, handed to `Context::create` so the
/// context decides *when* to run user construction code (after the name
/// has been validated and the id reserved).
pub struct Props<A: Actor> {
    factory: Box<dyn FnMut() -> A>,
}

impl<A: Actor + 'static> Props<A> {
    pub fn new(f: impl FnMut() -> A + 'static) -> Self {
        Props { factory: Box::new(f) }
    }

    pub fn new_from_factory() -> Self
    where
        A: ActorFactory,
    {
        Props::new(A::create)
    }

    pub fn new_args<Args: Clone + 'static>(args: Args) -> Self
    where
        A: ActorFactoryArgs<Args>,
    {
        Props::new(move || A::create_args(args.clone()))
    }

    pub fn produce(mut self) -> A {
        (self.factory)()
    }
}
