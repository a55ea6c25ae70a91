//! Email outbox: a bounded queue drained by a single background worker.
//!
//! ```text
//! handler → EmailQueue::enqueue (never blocks) → channel → EmailWorker → EmailService
//! ```
//!
//! Each queued email carries the tracing span that was current when it was queued, so delivery
//! logs appear under the request that caused them. Delivery failures are logged and dropped;
//! nothing is reported back to the request. On shutdown the worker stops accepting new emails,
//! delivers whatever is already queued, then exits.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info};

use crate::email::{ContactMessage, EmailService};

/// An email waiting to be rendered and sent
#[derive(Debug, Clone)]
pub enum EmailJob {
    PasswordReset {
        to_email: String,
        to_name: String,
        token: String,
    },
    Contact(ContactMessage),
}

impl EmailJob {
    fn kind(&self) -> &'static str {
        match self {
            EmailJob::PasswordReset { .. } => "password_reset",
            EmailJob::Contact(_) => "contact",
        }
    }
}

#[derive(Debug)]
pub struct QueuedEmail {
    pub job: EmailJob,
    span: Span,
}

/// Cheap, cloneable handle used by request handlers to queue emails
#[derive(Debug, Clone)]
pub struct EmailQueue {
    sender: mpsc::Sender<QueuedEmail>,
}

impl EmailQueue {
    /// A queue and the receiving end a worker drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<QueuedEmail>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Queue an email without waiting. Returns false (and logs) if it was dropped.
    pub fn enqueue(&self, job: EmailJob) -> bool {
        let kind = job.kind();
        match self.sender.try_send(QueuedEmail {
            job,
            span: Span::current(),
        }) {
            Ok(()) => {
                debug!(kind, "Queued email");
                true
            }
            Err(TrySendError::Full(_)) => {
                error!(kind, "Email queue is full, dropping email");
                false
            }
            Err(TrySendError::Closed(_)) => {
                error!(kind, "Email worker is not running, dropping email");
                false
            }
        }
    }
}

pub struct EmailWorker {
    service: EmailService,
    receiver: mpsc::Receiver<QueuedEmail>,
}

impl EmailWorker {
    /// Creates a worker and the queue that feeds it.
    pub fn new(service: EmailService, capacity: usize) -> (Self, EmailQueue) {
        let (queue, receiver) = EmailQueue::channel(capacity);
        (Self::from_receiver(service, receiver), queue)
    }

    pub fn from_receiver(service: EmailService, receiver: mpsc::Receiver<QueuedEmail>) -> Self {
        Self { service, receiver }
    }

    /// Deliver emails until shutdown is signalled or every queue handle is dropped.
    ///
    /// Spawn this as a tokio task and await its handle during shutdown.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Email worker started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, draining email queue");
                    self.receiver.close();
                    while let Some(email) = self.receiver.recv().await {
                        self.deliver(email).await;
                    }
                    break;
                }

                maybe_email = self.receiver.recv() => match maybe_email {
                    Some(email) => self.deliver(email).await,
                    None => {
                        info!("Email queue closed");
                        break;
                    }
                },
            }
        }

        info!("Email worker stopped");
    }

    async fn deliver(&self, email: QueuedEmail) {
        let QueuedEmail { job, span } = email;
        let kind = job.kind();

        async {
            let result = match &job {
                EmailJob::PasswordReset { to_email, to_name, token } => {
                    self.service.send_password_reset_email(to_email, Some(to_name), token).await
                }
                EmailJob::Contact(contact) => self.service.send_contact_email(contact).await,
            };

            match result {
                Ok(()) => info!(kind, "Email sent"),
                Err(e) => error!(kind, error = %e, "Failed to send email"),
            }
        }
        .instrument(span)
        .await
    }
}
