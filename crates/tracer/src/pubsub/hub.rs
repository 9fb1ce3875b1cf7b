use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{CancelFunc, Command, PubSub};
use crate::error::PubSubError;

/// In-process pub/sub hub.
///
/// Every subscription owns a delivery task fed by an unbounded channel, so
/// publishers never wait on slow handlers. Channels of cancelled
/// subscriptions are pruned on the next publish to their topic.
pub struct Hub<T> {
    topics: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<T>>>>,
}

impl<T> Hub<T> {
    pub fn new() -> Self {
        Self { topics: Mutex::new(HashMap::new()) }
    }

    /// Number of subscriptions still attached to `topic`
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock()
            .get(topic)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<mpsc::UnboundedSender<T>>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for Hub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> PubSub<T> for Hub<T> {
    fn subscribe(&self, command: Command<T>) -> Result<CancelFunc, PubSubError> {
        let Command { topic, run } = command;
        if topic.is_empty() {
            return Err(PubSubError::EmptyTopic);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PubSubError::NoRuntime)?;

        let (tx, mut rx) = mpsc::unbounded_channel::<T>();
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let task_topic = topic.clone();

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    message = rx.recv() => match message {
                        Some(message) => {
                            if let Err(e) = run(message) {
                                warn!(topic = %task_topic, "subscriber handler failed: {:#}", e);
                            }
                        }
                        None => break,
                    },
                }
            }
            debug!(topic = %task_topic, "subscription closed");
        });

        self.lock().entry(topic).or_default().push(tx);

        Ok(CancelFunc::new(token))
    }

    fn publish(&self, message: T, topic: &str) {
        let mut topics = self.lock();
        let Some(subs) = topics.get_mut(topic) else {
            return;
        };

        subs.retain(|tx| tx.send(message.clone()).is_ok());
        if subs.is_empty() {
            topics.remove(topic);
        }
    }
}
