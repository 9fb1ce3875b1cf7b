use thiserror::Error;

/// Errors returned by the tracer lifecycle operations.
#[derive(Debug, Error)]
pub enum TracerError {
    #[error("tracer: already running")]
    AlreadyRunning,
    #[error("tracer: must be started from within a tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    PubSub(#[from] PubSubError),
}

/// Errors returned when registering a subscription.
#[derive(Debug, Error)]
pub enum PubSubError {
    #[error("pubsub: subscription topic must not be empty")]
    EmptyTopic,
    #[error("pubsub: subscriptions require a tokio runtime")]
    NoRuntime,
}
