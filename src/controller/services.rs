use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    config::Config,
    controller::QnaController,
    events::Bus,
    notify::{FanoutNotifier, NotifierRef},
    store::{MemoryStore, StoreRef},
    subscribers::{Subscribe, SubscriberSet},
};

/// Wired runtime: controller, event bus and the subscriber listener.
pub struct QnaServices {
    controller: QnaController,
    bus: Bus,
    stop: oneshot::Sender<()>,
    listener: JoinHandle<()>,
}

impl QnaServices {
    /// Starts a builder with the given configuration.
    pub fn builder(config: Config) -> QnaServicesBuilder {
        QnaServicesBuilder::new(config)
    }

    pub fn controller(&self) -> &QnaController {
        &self.controller
    }

    /// The bus every component publishes to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Stops the listener after forwarding the events already on the bus, then
    /// waits for subscribers to drain their queues.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.listener.await {
            warn!(error = %e, "event listener ended abnormally");
        }
    }
}

/// Builder for [`QnaServices`].
///
/// Defaults: an in-process [`MemoryStore`], and an empty [`FanoutNotifier`]
/// (confirms every notice).
pub struct QnaServicesBuilder {
    config: Config,
    store: Option<StoreRef>,
    notifier: Option<NotifierRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl QnaServicesBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: None,
            notifier: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the document store.
    pub fn with_store(mut self, store: StoreRef) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the notifier the saga confirms actions with.
    pub fn with_notifier(mut self, notifier: NotifierRef) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive retry and action events through dedicated workers
    /// with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the services and spawns the subscriber listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> QnaServices {
        let bus = Bus::new(self.config.bus_capacity_clamped());
        let set = SubscriberSet::new(self.subscribers, bus.clone());
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as StoreRef);
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(FanoutNotifier::default()) as NotifierRef);

        let (stop, stop_rx) = oneshot::channel();
        let listener = subscriber_listener(&bus, set, stop_rx);
        let controller = QnaController::new(store, notifier, Arc::new(self.config), bus.clone());

        QnaServices {
            controller,
            bus,
            stop,
            listener,
        }
    }
}

/// Forwards bus events to the subscriber set until stopped.
fn subscriber_listener(
    bus: &Bus,
    set: SubscriberSet,
    mut stop: oneshot::Receiver<()>,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = &mut stop => {
                    while let Ok(ev) = rx.try_recv() {
                        set.emit(&ev);
                    }
                    break;
                }
            }
        }
        debug!(subscribers = set.len(), "event listener stopped");
        set.shutdown().await;
    })
}
