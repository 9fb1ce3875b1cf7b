use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{registry::Registry, scheduler::Scheduler, status::Status};
use crate::{
    Result,
    config::TracerConfig,
    error::TracerError,
    message::Message,
    pinger::Pinger,
    pubsub::{CancelFunc, Command, Hub, PubSub},
};

/// Tracer monitors remote endpoints and reports whether they are reachable.
///
/// Endpoints are registered with [`Tracer::trace`]; while running, every
/// endpoint is pinged once per refresh and the outcome is published as a
/// [`Message`] on [`TOPIC_CONN`](crate::TOPIC_CONN).
pub struct Tracer {
    pubsub: Arc<dyn PubSub<Message>>,
    registry: Arc<Registry>,
    refresh: Arc<Notify>,
    config: TracerConfig,
    state: Mutex<Lifecycle>,
}

#[derive(Default)]
struct Lifecycle {
    status: Status,
    /// Stop token of the current run, `None` while stopped
    stop: Option<CancellationToken>,
}

impl Tracer {
    /// Create a tracer with the default configuration, publishing on an
    /// in-process [`Hub`]
    pub fn new() -> Self {
        Self::with_config(TracerConfig::default())
    }

    pub fn with_config(config: TracerConfig) -> Self {
        Self::with_pubsub(config, Arc::new(Hub::new()))
    }

    /// Create a tracer publishing through an injected transport
    pub fn with_pubsub(config: TracerConfig, pubsub: Arc<dyn PubSub<Message>>) -> Self {
        Self {
            pubsub,
            registry: Arc::new(Registry::default()),
            refresh: Arc::new(Notify::new()),
            config,
            state: Mutex::new(Lifecycle::default()),
        }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Start the scheduler loop in its own task and return immediately.
    ///
    /// Fails if the tracer is already running or if no tokio runtime is
    /// available to host the loop.
    pub fn run(&self) -> Result<()> {
        let mut state = self.lock_state();
        if state.status == Status::Running {
            return Err(TracerError::AlreadyRunning);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TracerError::NoRuntime)?;

        let stop = CancellationToken::new();
        let scheduler = Scheduler {
            registry: self.registry.clone(),
            pubsub: self.pubsub.clone(),
            refresh: self.refresh.clone(),
            refresh_rate: self.config.effective_refresh_rate(),
        };
        runtime.spawn(scheduler.run(stop.clone()));

        state.status = Status::Running;
        state.stop = Some(stop);
        info!(refresh_rate = ?self.config.effective_refresh_rate(), "tracer running");

        Ok(())
    }

    /// Switch to [`Status::Stopped`] and terminate the scheduler loop,
    /// cancelling any in-flight probe. Closing a stopped tracer does nothing.
    pub fn close(&self) {
        let mut state = self.lock_state();
        state.status = Status::Stopped;
        if let Some(stop) = state.stop.take() {
            stop.cancel();
            info!("tracer stopped");
        }
    }

    pub fn status(&self) -> Status {
        self.lock_state().status
    }

    /// Keep track of `pinger`, replacing any endpoint traced under the same
    /// id, and trigger an immediate refresh.
    pub fn trace(&self, pinger: Arc<dyn Pinger>) -> Result<()> {
        let id = pinger.id();
        if self.registry.insert(pinger).is_some() {
            debug!(%id, "replaced traced endpoint");
        } else {
            debug!(%id, "tracing endpoint");
        }
        self.refresh();

        Ok(())
    }

    /// Stop tracking the endpoint stored under `id` and trigger an
    /// immediate refresh. Unknown ids are ignored.
    pub fn untrace(&self, id: &str) {
        if self.registry.remove(id).is_some() {
            debug!(%id, "untraced endpoint");
        }
        self.refresh();
    }

    /// Ids of the traced endpoints, sorted
    pub fn traced(&self) -> Vec<String> {
        self.registry.ids()
    }

    /// Subscribe to the tracer's transport, usually with
    /// [`TOPIC_CONN`](crate::TOPIC_CONN) as topic
    pub fn subscribe(&self, command: Command<Message>) -> Result<CancelFunc> {
        Ok(self.pubsub.subscribe(command)?)
    }

    fn refresh(&self) {
        // Stores a permit when the loop is busy or not running, never blocks
        self.refresh.notify_one();
    }

    fn lock_state(&self) -> MutexGuard<'_, Lifecycle> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Tracer {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TOPIC_CONN, pinger::Addr};
    use std::time::Duration;
    use tokio::{sync::mpsc, time::timeout};

    struct Pg {
        id: String,
    }

    #[async_trait::async_trait]
    impl Pinger for Pg {
        fn addr(&self) -> Addr {
            Addr::new("tcp", "host:port")
        }

        fn id(&self) -> String {
            self.id.clone()
        }

        async fn ping(&self, _cancel: &CancellationToken) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_twice_fails() {
        let tr = Tracer::new();

        tr.run().unwrap();
        assert_eq!(tr.status(), Status::Running);

        assert!(matches!(tr.run(), Err(TracerError::AlreadyRunning)));
        assert_eq!(tr.status(), Status::Running);

        tr.close();
        assert_eq!(tr.status(), Status::Stopped);
    }

    #[test]
    fn test_run_outside_runtime() {
        let tr = Tracer::new();

        assert!(matches!(tr.run(), Err(TracerError::NoRuntime)));
        assert_eq!(tr.status(), Status::Stopped);
    }

    #[test]
    fn test_trace_and_close_without_run_do_not_block() {
        let tr = Tracer::new();

        tr.trace(Arc::new(Pg { id: "fake".into() })).unwrap();
        tr.trace(Arc::new(Pg { id: "other".into() })).unwrap();
        tr.untrace("other");
        tr.untrace("missing");
        tr.close();
        tr.close();

        assert_eq!(tr.traced(), vec!["fake".to_string()]);
        assert_eq!(tr.status(), Status::Stopped);
    }

    #[tokio::test]
    async fn test_endpoint_traced_before_run_is_probed() {
        // Long refresh rate: only the pending refresh signal can trigger a batch
        let tr = Tracer::with_config(TracerConfig::default());
        tr.trace(Arc::new(Pg { id: "early".into() })).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _cancel = tr
            .subscribe(Command::new(TOPIC_CONN, move |m: Message| {
                let _ = tx.send(m);
                Ok(())
            }))
            .unwrap();

        tr.run().unwrap();

        let m = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(m.id, "early");
        assert!(m.is_online());
        tr.close();
    }
}
