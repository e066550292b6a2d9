//! Serialized event loop for a [`SessionController`].
//!
//! Transport adapters and [`TokioTimers`] post [`SessionEvent`]s into one
//! unbounded channel; [`SessionDriver::run`] applies them one at a time, so the
//! controller never sees concurrent mutation.

use crate::error::Result;
use crate::protocol::session::SessionController;
use crate::transport::{SessionEvent, Timers};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, instrument, warn};

/// Handle used to post events to a driver
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Create the event queue shared by a driver, its transport, and its timers
pub fn event_channel() -> (EventSender, mpsc::UnboundedReceiver<SessionEvent>) {
    mpsc::unbounded_channel()
}

/// Timers backed by tokio tasks that post into the event queue.
///
/// Holds only weak handles to the queue, so the driver still ends once every
/// caller-held [`EventSender`] is dropped. Must be used from within a tokio runtime.
pub struct TokioTimers {
    events: mpsc::WeakUnboundedSender<SessionEvent>,
    keep_alive: Option<JoinHandle<()>>,
    pairing: Option<JoinHandle<()>>,
}

impl TokioTimers {
    pub fn new(events: EventSender) -> Self {
        Self {
            events: events.downgrade(),
            keep_alive: None,
            pairing: None,
        }
    }
}

impl Timers for TokioTimers {
    fn start_keep_alive(&mut self, interval: Duration) {
        if let Some(task) = self.keep_alive.take() {
            task.abort();
        }
        let events = self.events.clone();
        self.keep_alive = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(sender) = events.upgrade() else {
                    break;
                };
                if sender.send(SessionEvent::KeepAlive).is_err() {
                    break;
                }
            }
        }));
    }

    fn start_pairing_expiry(&mut self, ttl: Duration) {
        self.cancel_pairing_expiry();
        let events = self.events.clone();
        self.pairing = Some(tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(sender) = events.upgrade() {
                let _ = sender.send(SessionEvent::PairingExpired);
            }
        }));
    }

    fn cancel_pairing_expiry(&mut self) {
        if let Some(task) = self.pairing.take() {
            task.abort();
        }
    }

    fn cancel_all(&mut self) {
        if let Some(task) = self.keep_alive.take() {
            task.abort();
        }
        self.cancel_pairing_expiry();
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Owns a controller and feeds it events until shutdown
pub struct SessionDriver {
    controller: SessionController,
    events: UnboundedReceiverStream<SessionEvent>,
}

impl SessionDriver {
    pub fn new(controller: SessionController, events: mpsc::UnboundedReceiver<SessionEvent>) -> Self {
        Self {
            controller,
            events: UnboundedReceiverStream::new(events),
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Process events until `Shutdown` or until every sender is gone.
    ///
    /// Errors from binary frames were already counted by the controller and
    /// only drop that frame. Any other error closes the session and is returned.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> Result<SessionController> {
        while let Some(event) = self.events.next().await {
            if event == SessionEvent::Shutdown {
                info!("Shutdown requested");
                self.controller.shutdown()?;
                return Ok(self.controller);
            }

            let is_frame = matches!(event, SessionEvent::Binary(_));
            match self.controller.handle(event) {
                Ok(()) => {}
                Err(err) if is_frame => {
                    debug!(error = %err, "Frame dropped");
                }
                Err(err) => {
                    error!(error = %err, state = %self.controller.state(), "Session failed");
                    if let Err(close_err) = self.controller.disconnect(None, false, false) {
                        warn!(error = %close_err, "Failed to close after session error");
                    }
                    return Err(err);
                }
            }
        }

        debug!("Event channel closed");
        self.controller.shutdown()?;
        Ok(self.controller)
    }
}
