use chrono::NaiveDate;

use crate::SnapshotStore;

/// How many messages a single user may relay per calendar day.
pub const DAILY_MESSAGE_LIMIT: u32 = 10;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    pub allowed: bool,
    /// Messages already counted for this user today.
    pub count: u32,
}

impl SnapshotStore {
    /// May this user send another message today?
    ///
    /// `today` is the process-local calendar date at call time, not the
    /// message's own send day; a message arriving right at midnight counts
    /// under whichever day the server clock saw.
    pub fn check_daily_limit(&self, user_id: i64, today: NaiveDate) -> QuotaStatus {
        self.read(|snapshot| {
            let count = snapshot
                .daily_limits
                .get(&today.to_string())
                .and_then(|day| day.get(&user_id.to_string()))
                .copied()
                .unwrap_or(0);
            QuotaStatus {
                allowed: count < DAILY_MESSAGE_LIMIT,
                count,
            }
        })
    }

    /// Count one more message for this user today. A full load-mutate-save
    /// cycle of its own; the dispatcher calls it only after a successful
    /// forward so failed sends never consume quota.
    pub fn increment_daily_count(&self, user_id: i64, today: NaiveDate) {
        self.mutate(|snapshot| {
            let count = snapshot
                .daily_limits
                .entry(today.to_string())
                .or_default()
                .entry(user_id.to_string())
                .or_insert(0);
            *count += 1;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, Local};

    fn temp_store() -> (tempfile::TempDir, SnapshotStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path().join("bot_data.json"));
        (dir, store)
    }

    #[test]
    fn fresh_user_is_allowed_with_zero_count() {
        let (_dir, store) = temp_store();
        let status = store.check_daily_limit(100, Local::now().date_naive());
        assert_eq!(status, QuotaStatus { allowed: true, count: 0 });
    }

    #[test]
    fn allowed_up_to_the_limit_then_rejected() {
        let (_dir, store) = temp_store();
        let today = Local::now().date_naive();

        for n in 0..DAILY_MESSAGE_LIMIT {
            let status = store.check_daily_limit(100, today);
            assert!(status.allowed, "message {} should be admitted", n + 1);
            assert_eq!(status.count, n);
            store.increment_daily_count(100, today);
        }

        let status = store.check_daily_limit(100, today);
        assert_eq!(status, QuotaStatus { allowed: false, count: DAILY_MESSAGE_LIMIT });
    }

    #[test]
    fn users_are_counted_independently() {
        let (_dir, store) = temp_store();
        let today = Local::now().date_naive();

        store.increment_daily_count(100, today);
        store.increment_daily_count(100, today);
        store.increment_daily_count(200, today);

        assert_eq!(store.check_daily_limit(100, today).count, 2);
        assert_eq!(store.check_daily_limit(200, today).count, 1);
    }

    #[test]
    fn days_are_counted_independently() {
        let (_dir, store) = temp_store();
        let today = Local::now().date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap();

        store.increment_daily_count(100, yesterday);
        assert_eq!(store.check_daily_limit(100, today).count, 0);
        assert_eq!(store.check_daily_limit(100, yesterday).count, 1);
    }
}
