//! Transient user feedback. Any operation may push; the shell shows the
//! front of the queue and dismisses it when done.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{get_current_time_ms, AppError};

/// Oldest notifications are dropped beyond this many.
pub const MAX_QUEUED_NOTIFICATIONS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

impl NotificationKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Success => 2000,
            Self::Error => 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub auto_dismiss_ms: u64,
    /// Raw error text for the secondary detail view.
    pub detail: Option<String>,
    pub created_at_ms: u64,
}

impl Notification {
    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > self.auto_dismiss_ms
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    queue: VecDeque<Notification>,
    next_id: u64,
}

impl NotificationQueue {
    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Success, message.into(), None)
    }

    /// Shows the user-facing message and keeps the full error as detail.
    pub fn error(&mut self, error: &AppError) -> u64 {
        self.push(
            NotificationKind::Error,
            error.user_facing_message(),
            Some(error.detail()),
        )
    }

    #[must_use]
    pub fn current(&self) -> Option<&Notification> {
        self.queue.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.queue.len();
        self.queue.retain(|n| n.id != id);
        self.queue.len() != before
    }

    /// Drops expired notifications from the front. Returns whether anything changed.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        let mut changed = false;
        while self.queue.front().is_some_and(|n| n.is_expired(now_ms)) {
            self.queue.pop_front();
            changed = true;
        }
        changed
    }

    fn push(&mut self, kind: NotificationKind, message: String, detail: Option<String>) -> u64 {
        self.next_id += 1;
        let id = self.next_id;

        if self.queue.len() >= MAX_QUEUED_NOTIFICATIONS {
            self.queue.pop_front();
        }
        self.queue.push_back(Notification {
            id,
            kind,
            message,
            auto_dismiss_ms: kind.default_duration_ms(),
            detail,
            created_at_ms: get_current_time_ms(),
        });
        id
    }
}
