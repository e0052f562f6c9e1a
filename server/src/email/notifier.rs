//! Notification Dispatch
//!
//! Handlers queue [`Notification`]s after their transaction commits. A single
//! background worker renders and sends them. Delivery is best-effort:
//! failures are logged and never reach the request that queued them.

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use super::templates::EmailType;
use super::EmailService;

/// A queued notification email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient address.
    pub to: String,
    pub kind: EmailType,
    /// Positional template parameters.
    pub params: Vec<String>,
}

impl Notification {
    pub fn new<I, P>(to: impl Into<String>, kind: EmailType, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            to: to.into(),
            kind,
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn subject(&self) -> String {
        self.kind.subject(&self.params)
    }

    pub fn body(&self) -> String {
        self.kind.body(&self.params)
    }
}

/// Notifications waiting for delivery before new ones are dropped.
pub const NOTIFICATION_QUEUE_CAPACITY: usize = 4096;

/// Cloneable handle used by handlers to queue notifications.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    /// Spawn the delivery worker and return a handle to it.
    ///
    /// With `email = None` the worker only logs what it would have sent.
    pub fn spawn(email: Option<EmailService>) -> Self {
        let (tx, rx) = mpsc::channel(NOTIFICATION_QUEUE_CAPACITY);
        tokio::spawn(run_delivery_worker(rx, email));
        Self { tx }
    }

    /// A notifier whose queue is handed back to the caller instead of a worker.
    pub fn channel() -> (Self, mpsc::Receiver<Notification>) {
        Self::with_capacity(NOTIFICATION_QUEUE_CAPACITY)
    }

    /// Like [`Notifier::channel`] with an explicit queue size.
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue one notification. Never blocks and never fails the caller.
    ///
    /// When the queue is full (SMTP stalled) the notification is dropped.
    pub fn notify(&self, notification: Notification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => warn!(
                kind = %dropped.kind,
                to = %dropped.to,
                "Notification queue full, dropping notification"
            ),
            Err(TrySendError::Closed(dropped)) => warn!(
                kind = %dropped.kind,
                "Notification worker is gone, dropping notification"
            ),
        }
    }

    /// Queue a batch of notifications.
    pub fn notify_all(&self, notifications: impl IntoIterator<Item = Notification>) {
        for notification in notifications {
            self.notify(notification);
        }
    }
}

async fn run_delivery_worker(
    mut rx: mpsc::Receiver<Notification>,
    email: Option<EmailService>,
) {
    info!(smtp = email.is_some(), "Notification worker started");

    while let Some(notification) = rx.recv().await {
        let Some(service) = &email else {
            debug!(
                kind = %notification.kind,
                to = %notification.to,
                "SMTP not configured, skipping notification"
            );
            continue;
        };

        if let Err(e) = service
            .send(&notification.to, &notification.subject(), notification.body())
            .await
        {
            error!(
                kind = %notification.kind,
                to = %notification.to,
                error = %e,
                "Failed to deliver notification"
            );
        }
    }

    info!("Notification worker stopped");
}
