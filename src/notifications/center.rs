//! Notification Center
//!
//! The bounded, newest-first notification history. Storage is the source of
//! truth across restarts: the list is rehydrated on load and written back
//! after every change.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::notifications::desktop::{DesktopNotifier, Permission};
use crate::notifications::models::{AppNotification, InboundMessage, NotificationPayload};
use crate::storage::KeyValueStore;

pub const NOTIFICATIONS_KEY: &str = "notifications";
pub const MAX_NOTIFICATIONS: usize = 50;

pub struct NotificationCenter {
    storage: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn DesktopNotifier>,
    items: RwLock<Vec<AppNotification>>,
    arrivals: broadcast::Sender<AppNotification>,
}

impl NotificationCenter {
    /// Rehydrate the history from storage. A corrupt stored value is logged
    /// and the history starts empty.
    pub fn load(storage: Arc<dyn KeyValueStore>, notifier: Arc<dyn DesktopNotifier>) -> Self {
        let mut items = match storage.get(NOTIFICATIONS_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<AppNotification>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    warn!(error = %e, "Failed to parse stored notifications, starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        items.truncate(MAX_NOTIFICATIONS);
        debug!(count = items.len(), "Loaded notifications");

        let (arrivals, _) = broadcast::channel(MAX_NOTIFICATIONS);
        Self {
            storage,
            notifier,
            items: RwLock::new(items),
            arrivals,
        }
    }

    /// Snapshot of the history, newest first
    pub fn notifications(&self) -> Vec<AppNotification> {
        self.items.read().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.items.read().iter().filter(|n| !n.read).count()
    }

    /// Receive each notification as it is added
    pub fn subscribe(&self) -> broadcast::Receiver<AppNotification> {
        self.arrivals.subscribe()
    }

    /// Apply `change` to the list and persist the result
    fn mutate<R>(&self, change: impl FnOnce(&mut Vec<AppNotification>) -> R) -> R {
        let mut items = self.items.write();
        let result = change(&mut items);
        match serde_json::to_string(&*items) {
            Ok(json) => self.storage.set(NOTIFICATIONS_KEY, &json),
            Err(e) => warn!(error = %e, "Failed to serialize notifications"),
        }
        result
    }

    /// Record a locally raised notification
    pub fn add(&self, payload: NotificationPayload) -> AppNotification {
        let notification = AppNotification::from_payload(payload);
        self.mutate(|items| {
            items.insert(0, notification.clone());
            items.truncate(MAX_NOTIFICATIONS);
        });
        // No receivers is fine
        let _ = self.arrivals.send(notification.clone());
        notification
    }

    /// Handle a text frame from the notification socket
    pub fn handle_message(&self, text: &str) -> Option<AppNotification> {
        match InboundMessage::decode(text) {
            Ok(InboundMessage::Notification(payload)) => {
                let notification = self.add(payload);
                info!(id = %notification.id, kind = %notification.kind, "Received notification");
                if self.notifier.permission() == Permission::Granted {
                    self.notifier.show(&notification);
                }
                Some(notification)
            }
            Ok(InboundMessage::Ignored) => {
                debug!("Ignoring non-notification message");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse socket message");
                None
            }
        }
    }

    pub fn mark_as_read(&self, id: &str) {
        self.mutate(|items| {
            if let Some(notification) = items.iter_mut().find(|n| n.id == id) {
                notification.read = true;
            }
        });
    }

    pub fn mark_all_as_read(&self) {
        self.mutate(|items| items.iter_mut().for_each(|n| n.read = true));
    }

    pub fn clear_notification(&self, id: &str) {
        self.mutate(|items| items.retain(|n| n.id != id));
    }

    pub fn clear_all(&self) {
        self.mutate(|items| items.clear());
    }

    /// Ask for desktop notification permission if it has not been decided.
    /// Returns whether notifications may be shown.
    pub fn request_permission(&self) -> bool {
        if !self.notifier.is_supported() {
            return false;
        }
        match self.notifier.permission() {
            Permission::Granted => true,
            Permission::Denied => false,
            Permission::Default => self.notifier.request_permission() == Permission::Granted,
        }
    }
}
