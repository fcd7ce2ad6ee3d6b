//! OS-level notification surface.

use parking_lot::Mutex;
use tracing::debug;

use crate::notifications::models::AppNotification;

/// Notification permission, as a browser or desktop shell reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Not yet asked
    Default,
    Granted,
    Denied,
}

pub trait DesktopNotifier: Send + Sync {
    fn is_supported(&self) -> bool;
    fn permission(&self) -> Permission;
    /// Ask the user; returns the resulting permission
    fn request_permission(&self) -> Permission;
    fn show(&self, notification: &AppNotification);
}

/// Platform without native notifications
#[derive(Debug, Default)]
pub struct Unsupported;

impl DesktopNotifier for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    fn permission(&self) -> Permission {
        Permission::Denied
    }

    fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    fn show(&self, _notification: &AppNotification) {}
}

/// Rings the terminal bell once permission is granted. The text itself is
/// printed by whoever follows [`NotificationCenter::subscribe`].
///
/// [`NotificationCenter::subscribe`]: crate::notifications::NotificationCenter::subscribe
#[derive(Debug)]
pub struct TerminalNotifier {
    permission: Mutex<Permission>,
}

impl TerminalNotifier {
    pub fn new(permission: Permission) -> Self {
        Self {
            permission: Mutex::new(permission),
        }
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new(Permission::Default)
    }
}

impl DesktopNotifier for TerminalNotifier {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> Permission {
        *self.permission.lock()
    }

    fn request_permission(&self) -> Permission {
        let mut permission = self.permission.lock();
        if *permission == Permission::Default {
            *permission = Permission::Granted;
        }
        *permission
    }

    fn show(&self, notification: &AppNotification) {
        debug!(id = %notification.id, "Ringing terminal bell");
        eprint!("\x07");
    }
}
