//! Publish/subscribe capability used to deliver tracer events.
//!
//! The tracer only ever calls [`PubSub::publish`]; subscribers register with
//! [`PubSub::subscribe`] independently of the tracer lifecycle. [`Hub`] is an
//! in-process implementation, any other transport can be injected instead.

mod hub;

use tokio_util::sync::CancellationToken;

use crate::error::PubSubError;

pub use hub::Hub;

/// Subscription request: `run` is invoked once per message published on `topic`
pub struct Command<T> {
    pub topic: String,
    pub run: Box<dyn Fn(T) -> anyhow::Result<()> + Send + Sync>,
}

impl<T> Command<T> {
    pub fn new<F>(topic: impl Into<String>, run: F) -> Self
    where
        F: Fn(T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self { topic: topic.into(), run: Box::new(run) }
    }
}

impl<T> std::fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command").field("topic", &self.topic).finish_non_exhaustive()
    }
}

/// Ends the subscription it was returned for.
///
/// Dropping it leaves the subscription active.
#[derive(Debug, Clone)]
pub struct CancelFunc {
    token: CancellationToken,
}

impl CancelFunc {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// PubSub describes the required functionalities of a publication/subscription object.
pub trait PubSub<T>: Send + Sync {
    fn subscribe(&self, command: Command<T>) -> Result<CancelFunc, PubSubError>;

    /// Deliver `message` to every current subscriber of `topic`. Must not block.
    fn publish(&self, message: T, topic: &str);
}
