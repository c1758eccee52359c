//! Transient toast queue. Each entry expires on its own timer after the display
//! window; later emissions never reset or coalesce earlier ones.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{EventKind, SimulationClock};

/// Default display window in milliseconds.
pub const NOTIFICATION_TTL_MS: u64 = 4000;

/// Emissions retained in the log; the oldest are dropped beyond this.
pub const LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub kind: NotificationKind,
    /// Simulation time of emission.
    pub emitted_at: u64,
}

#[derive(Debug, Resource)]
pub struct Notifications {
    ttl_ms: u64,
    next_id: u64,
    active: Vec<Notification>,
    /// Recent emissions in order, kept after expiry for timelines and assertions.
    log: Vec<Notification>,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::with_ttl(NOTIFICATION_TTL_MS)
    }
}

impl Notifications {
    pub fn with_ttl(ttl_ms: u64) -> Self {
        Self {
            ttl_ms,
            next_id: 0,
            active: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Show `message` and schedule its removal `ttl_ms` from now.
    pub fn emit(
        &mut self,
        clock: &mut SimulationClock,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        let notification = Notification {
            id,
            message: message.into(),
            kind,
            emitted_at: clock.now(),
        };
        debug!(id = id.0, ?kind, message = %notification.message, "notification emitted");
        self.active.push(notification.clone());
        if self.log.len() == LOG_CAPACITY {
            self.log.remove(0);
        }
        self.log.push(notification);
        clock.schedule_in(self.ttl_ms, EventKind::NotificationExpired(id));
        id
    }

    /// Remove exactly the entry with `id`. Returns `false` if it was already gone.
    pub fn expire(&mut self, id: NotificationId) -> bool {
        let before = self.active.len();
        self.active.retain(|notification| notification.id != id);
        before != self.active.len()
    }

    pub fn active(&self) -> &[Notification] {
        &self.active
    }

    /// The last [LOG_CAPACITY] emissions, oldest first.
    pub fn log(&self) -> &[Notification] {
        &self.log
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.log.last()
    }

    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.log.iter().filter(|n| n.kind == kind).count()
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }
}
