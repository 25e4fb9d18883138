//! Periodic demotion of idle users.
//!
//! A user whose last activity is older than the configured threshold is fully
//! unbound, exactly like a disconnect: the connection handle is cleared and the
//! user leaves its room. The still-open socket is told via `session-expired`
//! and may send `reconnect-user` to come back.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time;

use crate::gateway::events::{EventName, SessionExpired};
use crate::gateway::fanout::Target;
use crate::gateway::router;
use crate::AppState;

use super::presence::broadcast_presence;
use super::sessions::Unbound;
use super::ChatStore;

impl ChatStore {
    /// Stamp `last_activity` for a user. Returns whether the user exists.
    pub fn record_activity(&mut self, user_id: &str, now: DateTime<Utc>) -> bool {
        match self.users.get_mut(user_id) {
            Some(user) => {
                user.last_activity = now;
                true
            }
            None => false,
        }
    }

    /// Unbind every online user idle for longer than `threshold`.
    pub fn sweep_inactive(&mut self, now: DateTime<Utc>, threshold: Duration) -> Vec<Unbound> {
        let stale: Vec<String> = self
            .users()
            .filter(|u| u.online)
            .filter(|u| {
                now.signed_duration_since(u.last_activity)
                    .to_std()
                    .map(|idle| idle > threshold)
                    .unwrap_or(false)
            })
            .map(|u| u.id.clone())
            .collect();

        stale
            .iter()
            .filter_map(|id| self.release(id, now))
            .collect()
    }
}

/// Run one sweep against the shared state and notify clients. Presence is
/// broadcast even when nobody was demoted. Returns the number of users
/// demoted.
pub fn run_sweep(state: &AppState) -> usize {
    let mut store = state.store.lock();
    let expired = store.sweep_inactive(Utc::now(), state.config.inactivity_threshold);

    for unbound in &expired {
        tracing::info!(
            user_id = %unbound.user.id,
            username = %unbound.user.username,
            "marked user as inactive"
        );
        state.broadcast.emit(
            Target::one(&unbound.connection),
            EventName::SESSION_EXPIRED,
            &SessionExpired {
                user_id: &unbound.user.id,
            },
        );
        router::announce_departure(&state.broadcast, &store, unbound);
    }

    broadcast_presence(&state.broadcast, &store);
    expired.len()
}

/// Spawn the background sweeper on the configured interval.
pub fn spawn(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(state.config.sweep_interval);
        ticker.tick().await; // First tick fires immediately; skip it.
        loop {
            ticker.tick().await;
            let expired = run_sweep(&state);
            tracing::debug!(expired, "inactivity sweep finished");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{join, store};
    use super::*;

    const THRESHOLD: Duration = Duration::from_secs(30 * 60);

    #[test]
    fn idle_users_are_unbound() {
        let mut store = store();
        let (conn, alice) = join(&mut store, "alice");
        let (_, bob) = join(&mut store, "bob");

        let later = Utc::now() + chrono::Duration::minutes(31);
        store.record_activity(&bob.id, later);

        let expired = store.sweep_inactive(later, THRESHOLD);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].user.id, alice.id);
        assert_eq!(expired[0].connection, conn);
        assert_eq!(expired[0].left_room.as_deref(), Some("general"));

        let alice = store.user(&alice.id).unwrap();
        assert!(!alice.online);
        assert!(alice.connection.is_none());
        assert!(store.resolve(&conn).is_none());
        assert!(store.user(&bob.id).unwrap().online);
    }

    #[test]
    fn recent_activity_is_kept() {
        let mut store = store();
        join(&mut store, "alice");

        let soon = Utc::now() + chrono::Duration::minutes(29);
        assert!(store.sweep_inactive(soon, THRESHOLD).is_empty());
        assert_eq!(store.online_count(), 1);
    }

    #[test]
    fn offline_users_are_not_swept_again() {
        let mut store = store();
        let (conn, _) = join(&mut store, "alice");
        store.unbind(&conn);

        let later = Utc::now() + chrono::Duration::hours(2);
        assert!(store.sweep_inactive(later, THRESHOLD).is_empty());
    }

    #[test]
    fn record_activity_unknown_user() {
        let mut store = store();
        assert!(!store.record_activity("usr_missing", Utc::now()));
    }
}
