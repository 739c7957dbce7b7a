use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::notification::domain::actuator::Actuator;
use crate::notification::domain::notification_event::NotificationEvent;

/// What happened to an event handed to [`NotificationDispatcher::dispatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Queued,
    /// The queue was full; the oldest pending event was discarded to make room.
    DisplacedStale,
    Dropped,
}

/// Delivers notifications to the actuator on a dedicated thread so the
/// caller never blocks on the network.
///
/// The queue is bounded. When it is full the oldest pending event gives way
/// to the new one, so the actuator always ends up with the newest decision.
/// Send failures are logged and not retried.
pub struct NotificationDispatcher {
    tx: Option<Sender<NotificationEvent>>,
    evict: Receiver<NotificationEvent>,
    handle: Option<JoinHandle<usize>>,
}

impl NotificationDispatcher {
    pub fn spawn(actuator: Box<dyn Actuator>, capacity: usize) -> std::io::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded::<NotificationEvent>(capacity.max(1));
        let evict = rx.clone();
        let handle = thread::Builder::new()
            .name("notifier".into())
            .spawn(move || deliver_all(actuator, rx))?;
        Ok(Self {
            tx: Some(tx),
            evict,
            handle: Some(handle),
        })
    }

    /// Enqueues `event` without blocking.
    pub fn dispatch(&self, event: NotificationEvent) -> DispatchOutcome {
        let Some(tx) = self.tx.as_ref() else {
            return DispatchOutcome::Dropped;
        };
        match tx.try_send(event) {
            Ok(()) => DispatchOutcome::Queued,
            Err(TrySendError::Full(event)) => {
                if let Ok(stale) = self.evict.try_recv() {
                    log::warn!(
                        "Notification queue full, discarding stale {} event",
                        stale.decision.as_status()
                    );
                }
                match tx.try_send(event) {
                    Ok(()) => DispatchOutcome::DisplacedStale,
                    Err(e) => {
                        log::warn!(
                            "Notification queue full, dropping {} event",
                            e.into_inner().decision.as_status()
                        );
                        DispatchOutcome::Dropped
                    }
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Notification thread has exited, event dropped");
                DispatchOutcome::Dropped
            }
        }
    }

    /// Closes the queue, waits for pending events to be delivered and
    /// returns how many were sent successfully.
    pub fn shutdown(mut self) -> usize {
        self.close()
    }

    /// Discards queued events that have not reached the actuator yet and
    /// returns how many were discarded. An in-flight send is unaffected.
    pub fn discard_pending(&self) -> usize {
        let discarded = self.evict.try_iter().count();
        if discarded > 0 {
            log::warn!("Discarding {discarded} pending notifications");
        }
        discarded
    }

    /// Like [`shutdown`](Self::shutdown), but pending events are discarded
    /// first. Stopping waits for at most the one send already in flight,
    /// so it is bounded by a single actuator timeout.
    pub fn shutdown_now(self) -> usize {
        self.discard_pending();
        self.shutdown()
    }

    fn close(&mut self) -> usize {
        self.tx = None;
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(delivered)) => delivered,
            Some(Err(_)) => {
                log::error!("Notification thread panicked");
                0
            }
            None => 0,
        }
    }
}

impl Drop for NotificationDispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

fn deliver_all(mut actuator: Box<dyn Actuator>, rx: Receiver<NotificationEvent>) -> usize {
    let mut delivered = 0;
    for event in rx {
        let payload = event.payload();
        match actuator.send(&payload) {
            Ok(()) => {
                log::info!(
                    "Actuator notified: {} {:?}",
                    payload.status,
                    payload.details.detected_faces
                );
                delivered += 1;
            }
            Err(e) => log::warn!("Failed to notify actuator ({}): {e}", payload.status),
        }
    }
    delivered
}
