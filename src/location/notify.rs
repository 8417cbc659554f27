// src/location/notify.rs

use crate::location::LocationNotice;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// Receives user-facing notices from the location manager.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: LocationNotice);
}

/// Writes notices to the log. Used when the host supplies no notifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: LocationNotice) {
        match &notice {
            LocationNotice::Failed { .. } => warn!(notice = ?notice, "{}", notice.message()),
            _ => info!(notice = ?notice, "{}", notice.message()),
        }
    }
}

/// Forwards notices to a channel, e.g. for a host UI loop.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: UnboundedSender<LocationNotice>,
}

impl ChannelNotifier {
    pub fn new(sender: UnboundedSender<LocationNotice>) -> Self {
        Self { sender }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: LocationNotice) {
        // A closed receiver only means nobody is listening any more.
        let _ = self.sender.send(notice);
    }
}
