use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::Notify, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::registry::Registry;
use crate::{
    message::{Message, TOPIC_CONN},
    pinger::Pinger,
    pubsub::PubSub,
};

/// Background loop owning the probe batches of one tracer run.
///
/// At most one batch is live at a time: every refresh, timeout or stop
/// cancels the current batch token before anything else happens. Probes of a
/// cancelled batch never publish.
pub(crate) struct Scheduler {
    pub(crate) registry: Arc<Registry>,
    pub(crate) pubsub: Arc<dyn PubSub<Message>>,
    pub(crate) refresh: Arc<Notify>,
    pub(crate) refresh_rate: Duration,
}

impl Scheduler {
    /// Drive batches until `stop` is cancelled.
    pub(crate) async fn run(self, stop: CancellationToken) {
        let mut batch: Option<CancellationToken> = None;

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    if let Some(batch) = batch.take() {
                        batch.cancel();
                    }
                    break;
                }
                _ = self.refresh.notified() => trace!("refresh requested"),
                _ = sleep(self.refresh_rate) => trace!("refresh rate elapsed"),
            }

            if let Some(previous) = batch.take() {
                previous.cancel();
            }
            batch = Some(self.launch(&stop));
        }

        debug!("scheduler loop terminated");
    }

    /// Spawn one probe per traced endpoint, all sharing a fresh batch token.
    fn launch(&self, stop: &CancellationToken) -> CancellationToken {
        let token = stop.child_token();
        let pingers = self.registry.snapshot();

        debug!(endpoints = pingers.len(), "launching probe batch");
        for pinger in pingers {
            tokio::spawn(probe(pinger, self.pubsub.clone(), token.clone()));
        }

        token
    }
}

async fn probe(
    pinger: Arc<dyn Pinger>,
    pubsub: Arc<dyn PubSub<Message>>,
    token: CancellationToken,
) {
    let id = pinger.id();
    let addr = pinger.addr();
    let start = Instant::now();

    let outcome = tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!(%id, "probe canceled before completion");
            return;
        }
        res = pinger.ping(&token) => res,
    };

    // The batch may have been superseded while the result came in
    if token.is_cancelled() {
        debug!(%id, "dropping result of canceled probe");
        return;
    }

    let message = Message::new(id, addr, outcome, start.elapsed().as_millis() as u64);
    trace!(id = %message.id, connectivity = %message.connectivity(), "publishing probe result");
    pubsub.publish(message, TOPIC_CONN);
}
