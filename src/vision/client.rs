//! Recognition client
//!
//! Runs each recognition request on a worker thread and delivers the
//! result over a channel, to be applied on the UI thread.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use super::recognizer::{RecognitionRequest, TextRecognizer};
use crate::error::RecognitionError;

/// Identifies one submitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of one recognition request
#[derive(Debug, Clone)]
pub struct RecognitionEvent {
    pub id: RequestId,
    pub outcome: Result<String, RecognitionError>,
    pub elapsed: Duration,
}

/// Callback run after each delivered event, e.g. to wake the UI
pub type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Asynchronous front end to a text recognizer
pub struct RecognitionClient {
    recognizer: Arc<dyn TextRecognizer>,
    sender: Sender<RecognitionEvent>,
    receiver: Receiver<RecognitionEvent>,
    next_id: u64,
    notifier: Option<Notifier>,
}

impl RecognitionClient {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            recognizer,
            sender,
            receiver,
            next_id: 1,
            notifier: None,
        }
    }

    /// Install a callback invoked whenever a result is delivered
    pub fn set_notifier(&mut self, notifier: Notifier) {
        self.notifier = Some(notifier);
    }

    /// Submit a request; the result arrives later via `try_recv`
    pub fn submit(&mut self, request: RecognitionRequest) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;

        let recognizer = self.recognizer.clone();
        let sender = self.sender.clone();
        let notifier = self.notifier.clone();

        debug!(
            "Submitting recognition request {} ({}x{})",
            id,
            request.bitmap.width(),
            request.bitmap.height()
        );

        let spawned = std::thread::Builder::new()
            .name(format!("ocr-worker-{}", id.0))
            .spawn(move || {
                let start = Instant::now();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| recognizer.recognize(&request)))
                    .unwrap_or_else(|payload| {
                        error!("Recognizer panicked on request {}", id);
                        Err(RecognitionError::Panicked(panic_message(payload.as_ref())))
                    });

                deliver(&sender, notifier.as_ref(), RecognitionEvent {
                    id,
                    outcome,
                    elapsed: start.elapsed(),
                });
            });

        if let Err(e) = spawned {
            error!("Failed to spawn recognition worker: {}", e);
            deliver(&self.sender, self.notifier.as_ref(), RecognitionEvent {
                id,
                outcome: Err(RecognitionError::Spawn(e.to_string())),
                elapsed: Duration::ZERO,
            });
        }

        id
    }

    /// Take a delivered result without blocking
    pub fn try_recv(&self) -> Option<RecognitionEvent> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next result
    pub fn recv_timeout(&self, timeout: Duration) -> Option<RecognitionEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            // The client holds a sender, so this cannot happen while it lives
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

fn deliver(sender: &Sender<RecognitionEvent>, notifier: Option<&Notifier>, event: RecognitionEvent) {
    let id = event.id;
    if sender.send(event).is_err() {
        warn!("Dropping result of request {}: client is gone", id);
        return;
    }
    if let Some(notify) = notifier {
        notify();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
