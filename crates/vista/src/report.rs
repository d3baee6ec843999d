//! User-facing notifications.
//!
//! Components never talk to the user directly. They hand a [`Notice`] to a
//! [`Reporter`] supplied by the host, and write diagnostics through `tracing`.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

pub trait Reporter: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Logs notices; the default when the host has no notification surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(target: "vista::notice", "{}", notice.message),
            NoticeLevel::Warning => warn!(target: "vista::notice", "{}", notice.message),
            NoticeLevel::Error => error!(target: "vista::notice", "{}", notice.message),
        }
    }
}

/// Forwards notices to a channel drained by the host's UI loop.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Reporter for ChannelReporter {
    fn notify(&self, notice: Notice) {
        if let Err(e) = self.tx.send(notice) {
            warn!(message = %e.0, "Notice dropped, receiver is gone");
        }
    }
}
