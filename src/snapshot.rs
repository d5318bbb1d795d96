//! Timezone snapshot resolution.
//!
//! Answers "which IANA zones are at local hour H right now?" as a pure
//! function of a UTC instant. A zone is a candidate when its local hour
//! equals the target; among candidates, only the zones sitting at the
//! minimal minute-of-hour win (closest to the top of the hour, measured
//! forward: a zone at :59 is 59 minutes past, not one minute shy).
//!
//! The zone list itself is the table compiled into chrono-tz; it only
//! changes with the tz database, so it is never re-derived per call. Local
//! times are always computed fresh.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::{TZ_VARIANTS, Tz};
use std::collections::HashMap;

/// The computed local-time state of one zone at one instant.
///
/// Ephemeral: computed fresh for every resolution call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSnapshot {
    pub local_hour: u32,
    pub minute_offset: u32,
    /// Local calendar date, `YYYY-MM-DD`.
    pub local_date: String,
    /// Local wall-clock time, `HH:MM:SS`.
    pub local_time: String,
    /// Current abbreviated zone name for display, e.g. `EST`, `CEST`.
    pub abbreviation: String,
}

/// Resolve the zones currently at `target_hour` across the full IANA table.
///
/// # Arguments
/// * `now` - The UTC instant to evaluate
/// * `target_hour` - Local hour to match, 0-23
///
/// # Returns
/// Mapping of winning zone names to their snapshots. Empty when no zone is
/// currently in the target hour.
pub fn resolve(now: DateTime<Utc>, target_hour: u32) -> HashMap<String, ZoneSnapshot> {
    resolve_zones(now, target_hour, &TZ_VARIANTS)
}

/// Resolve against an explicit zone set.
///
/// Same contract as [`resolve`], restricted to `zones`. Split out so the
/// tie-break can be exercised against a fixed set of zones.
pub fn resolve_zones(
    now: DateTime<Utc>,
    target_hour: u32,
    zones: &[Tz],
) -> HashMap<String, ZoneSnapshot> {
    let mut candidates: Vec<(&str, ZoneSnapshot)> = Vec::new();

    for tz in zones {
        let local = now.with_timezone(tz);
        if local.hour() != target_hour {
            continue;
        }
        candidates.push((
            tz.name(),
            ZoneSnapshot {
                local_hour: local.hour(),
                minute_offset: local.minute(),
                local_date: local.format("%Y-%m-%d").to_string(),
                local_time: local.format("%H:%M:%S").to_string(),
                abbreviation: local.format("%Z").to_string(),
            },
        ));
    }

    let Some(best_minute) = candidates.iter().map(|(_, s)| s.minute_offset).min() else {
        return HashMap::new();
    };

    candidates
        .into_iter()
        .filter(|(_, snapshot)| snapshot.minute_offset == best_minute)
        .map(|(name, snapshot)| (name.to_string(), snapshot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// 2026-01-15 22:00:00 UTC: New York (UTC-5) reads 17:00:00, Chicago
    /// (UTC-6) reads 16:00:00.
    fn winter_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 22, 0, 0).unwrap()
    }

    #[test]
    fn test_resolve_zones_exact_hour_match() {
        let zones = [chrono_tz::America::New_York, chrono_tz::America::Chicago];
        let winners = resolve_zones(winter_instant(), 17, &zones);

        assert_eq!(winners.len(), 1);
        let snapshot = &winners["America/New_York"];
        assert_eq!(snapshot.local_time, "17:00:00");
        assert_eq!(snapshot.local_date, "2026-01-15");
        assert_eq!(snapshot.abbreviation, "EST");
    }

    #[test]
    fn test_resolve_zones_empty_when_no_zone_matches() {
        // Both zones are in the 16:00/17:00 band; nobody reads 03:00
        let zones = [chrono_tz::America::New_York, chrono_tz::America::Chicago];
        assert!(resolve_zones(winter_instant(), 3, &zones).is_empty());
    }

    #[test]
    fn test_resolve_zones_minute_tie_break_prefers_minimum_forward_minute() {
        // At 22:30 UTC, Kolkata (UTC+5:30) reads 04:00 while Kathmandu
        // (UTC+5:45) reads 04:15. Both are candidates for hour 4; only the
        // zone at the smaller forward minute wins.
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 22, 30, 0).unwrap();
        let zones = [chrono_tz::Asia::Kolkata, chrono_tz::Asia::Kathmandu];
        let winners = resolve_zones(now, 4, &zones);

        assert_eq!(winners.len(), 1);
        assert!(winners.contains_key("Asia/Kolkata"));
        assert_eq!(winners["Asia/Kolkata"].minute_offset, 0);
    }

    #[test]
    fn test_resolve_zones_returns_all_tied_winners() {
        // Whole-hour-offset zones cluster at the same minute
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 22, 10, 0).unwrap();
        let zones = [chrono_tz::America::New_York, chrono_tz::America::Toronto];
        let winners = resolve_zones(now, 17, &zones);

        assert_eq!(winners.len(), 2);
        assert!(winners.contains_key("America/New_York"));
        assert!(winners.contains_key("America/Toronto"));
    }

    #[test]
    fn test_resolve_full_table_all_winners_share_hour_and_minute() {
        let now = Utc.with_ymd_and_hms(2026, 6, 20, 9, 41, 0).unwrap();
        for target_hour in [0, 5, 17, 23] {
            let winners = resolve(now, target_hour);
            assert!(!winners.is_empty());
            let minutes: Vec<u32> = winners.values().map(|s| s.minute_offset).collect();
            for snapshot in winners.values() {
                assert_eq!(snapshot.local_hour, target_hour);
                assert_eq!(snapshot.minute_offset, minutes[0]);
            }
        }
    }

    #[test]
    fn test_resolve_is_deterministic_per_zone() {
        let now = winter_instant();
        let first = resolve(now, 17);
        let second = resolve(now, 17);
        assert_eq!(first, second);
    }
}
