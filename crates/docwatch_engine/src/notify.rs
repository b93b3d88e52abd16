use docwatch_core::OwnerId;
use tokio::sync::mpsc;

/// A message for the transport to deliver verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub owner: OwnerId,
    pub text: String,
}

impl Notice {
    pub fn new(owner: OwnerId, text: impl Into<String>) -> Self {
        Self {
            owner,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("transport closed")]
    Closed,
    #[error("delivery failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notice: Notice) -> Result<(), NotifyError>;
}

/// Hands notices to the transport task over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::UnboundedSender<Notice>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait::async_trait]
impl Notifier for ChannelNotifier {
    async fn deliver(&self, notice: Notice) -> Result<(), NotifyError> {
        self.tx.send(notice).map_err(|_| NotifyError::Closed)
    }
}
