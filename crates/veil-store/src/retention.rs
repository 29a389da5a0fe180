use chrono::{DateTime, Days, Local, NaiveDate};
use tracing::debug;

use veil_types::Snapshot;

/// Identity mappings older than this are dropped on load.
const IDENTITY_RETENTION_SECS: f64 = 24.0 * 3600.0;

/// Delete expired state from the snapshot, in place.
///
/// Identity records go once they are 24h old (or structurally broken: a
/// timestamp that is not a finite positive number). Quota buckets are keyed
/// by calendar day and go once the day is strictly earlier than yesterday —
/// a bucket therefore lives somewhere between 24h and 48h depending on
/// time-of-day, which is the intended coarse granularity.
///
/// Returns true iff anything was deleted, so the caller knows to persist the
/// pruned snapshot. Idempotent for a fixed `now`.
pub fn prune(snapshot: &mut Snapshot, now: DateTime<Local>) -> bool {
    let mut changed = false;

    let cutoff = now.timestamp() as f64 - IDENTITY_RETENTION_SECS;
    snapshot.user_info.retain(|key, record| {
        let keep =
            record.timestamp.is_finite() && record.timestamp > 0.0 && record.timestamp > cutoff;
        if !keep {
            debug!("Pruning identity record {key}");
            changed = true;
        }
        keep
    });

    let oldest_kept = now
        .date_naive()
        .checked_sub_days(Days::new(1))
        .unwrap_or_else(|| now.date_naive());
    snapshot.daily_limits.retain(|day, _| {
        let keep = matches!(
            NaiveDate::parse_from_str(day, "%Y-%m-%d"),
            Ok(date) if date >= oldest_kept
        );
        if !keep {
            debug!("Pruning quota bucket {day}");
            changed = true;
        }
        keep
    });

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use veil_types::IdentityRecord;

    fn record(timestamp: f64) -> IdentityRecord {
        IdentityRecord {
            user_id: 1,
            first_name: "Alice".into(),
            last_name: None,
            username: None,
            message_text: None,
            timestamp,
        }
    }

    fn hours_ago(now: DateTime<Local>, hours: f64) -> f64 {
        now.timestamp() as f64 - hours * 3600.0
    }

    #[test]
    fn drops_records_past_the_retention_window() {
        let now = Local::now();
        let mut snapshot = Snapshot::default();
        snapshot.user_info.insert("1_a".into(), record(hours_ago(now, 25.0)));
        snapshot.user_info.insert("1_b".into(), record(hours_ago(now, 1.0)));

        assert!(prune(&mut snapshot, now));
        assert!(!snapshot.user_info.contains_key("1_a"));
        assert!(snapshot.user_info.contains_key("1_b"));
    }

    #[test]
    fn drops_records_with_broken_timestamps() {
        let now = Local::now();
        let mut snapshot = Snapshot::default();
        snapshot.user_info.insert("1_nan".into(), record(f64::NAN));
        snapshot.user_info.insert("1_neg".into(), record(-5.0));

        assert!(prune(&mut snapshot, now));
        assert!(snapshot.user_info.is_empty());
    }

    #[test]
    fn keeps_today_and_yesterday_buckets_only() {
        let now = Local::now();
        let today = now.date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap();
        let old = today.checked_sub_days(Days::new(2)).unwrap();

        let mut snapshot = Snapshot::default();
        for day in [&today, &yesterday, &old] {
            snapshot
                .daily_limits
                .insert(day.to_string(), BTreeMap::from([("1".to_string(), 3u32)]));
        }
        snapshot
            .daily_limits
            .insert("not-a-date".into(), BTreeMap::new());

        assert!(prune(&mut snapshot, now));
        assert!(snapshot.daily_limits.contains_key(&today.to_string()));
        assert!(snapshot.daily_limits.contains_key(&yesterday.to_string()));
        assert!(!snapshot.daily_limits.contains_key(&old.to_string()));
        assert!(!snapshot.daily_limits.contains_key("not-a-date"));
    }

    #[test]
    fn prune_is_idempotent() {
        let now = Local::now();
        let mut snapshot = Snapshot::default();
        snapshot.user_info.insert("1_old".into(), record(hours_ago(now, 30.0)));
        snapshot.user_info.insert("1_new".into(), record(hours_ago(now, 2.0)));

        assert!(prune(&mut snapshot, now));
        assert!(!prune(&mut snapshot, now), "second prune must be a no-op");
    }

    #[test]
    fn clean_snapshot_reports_no_change() {
        let now = Local::now();
        let mut snapshot = Snapshot::default();
        snapshot.user_info.insert("1_k".into(), record(hours_ago(now, 1.0)));
        snapshot
            .daily_limits
            .insert(now.date_naive().to_string(), BTreeMap::new());

        assert!(!prune(&mut snapshot, now));
    }
}
