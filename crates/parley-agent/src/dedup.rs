// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event deduplication over a trailing time window.
//!
//! Platforms redeliver webhook events when an acknowledgement is slow or lost.
//! [`Deduplicator`] remembers each platform message id for a fixed window and
//! rejects repeats. Entries expire on their own: every call sweeps the front
//! of an insertion-ordered queue, so memory stays bounded by the traffic of
//! one window.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Default)]
struct Seen {
    first_seen: HashMap<String, Instant>,
    order: VecDeque<(Instant, String)>,
}

impl Seen {
    /// Drop every entry older than `expiry`, oldest first.
    fn sweep(&mut self, now: Instant, expiry: Duration) {
        while let Some((at, _)) = self.order.front() {
            if now.duration_since(*at) <= expiry {
                break;
            }
            if let Some((at, id)) = self.order.pop_front() {
                // A refreshed id has a newer timestamp in the map; keep it.
                if self.first_seen.get(&id) == Some(&at) {
                    self.first_seen.remove(&id);
                }
            }
        }
    }
}

/// Remembers recently accepted event ids.
pub struct Deduplicator {
    expiry: Duration,
    seen: Mutex<Seen>,
}

impl Deduplicator {
    pub fn new(expiry: Duration) -> Self {
        Self {
            expiry,
            seen: Mutex::new(Seen::default()),
        }
    }

    /// Returns `true` the first time `event_id` is seen within the window,
    /// `false` for a repeat. Never fails.
    pub fn accept(&self, event_id: &str) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.sweep(now, self.expiry);

        if seen.first_seen.contains_key(event_id) {
            return false;
        }
        seen.first_seen.insert(event_id.to_string(), now);
        seen.order.push_back((now, event_id.to_string()));
        true
    }

    /// Number of ids currently remembered.
    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .first_seen
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
