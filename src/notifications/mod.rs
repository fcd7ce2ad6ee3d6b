//! # Notifications Module
//!
//! A durable, bounded notification history with a best-effort live feed on
//! top. The history works on its own (cache-only mode); the WebSocket channel
//! only adds to it.

pub mod backoff;
pub mod center;
pub mod channel;
pub mod desktop;
pub mod models;

pub use backoff::ReconnectBackoff;
pub use center::{NotificationCenter, MAX_NOTIFICATIONS, NOTIFICATIONS_KEY};
pub use channel::NotificationChannel;
pub use desktop::{DesktopNotifier, Permission, TerminalNotifier, Unsupported};
pub use models::{AppNotification, InboundMessage, NotificationAction, NotificationKind, NotificationPayload, NotificationSender};
