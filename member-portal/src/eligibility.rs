//! Medical-scheme eligibility
//!
//! Pure date arithmetic around the one-year enrollment window. Every
//! function takes the current instant as a parameter; nothing here reads a
//! clock or touches state.

use chrono::{DateTime, Duration, Utc};

/// Enrollment opens this long after record creation.
pub const ELIGIBILITY_WINDOW_DAYS: i64 = 365;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Whether the record is still inside the one-year window.
///
/// An absent creation timestamp counts as "not new": records whose view row
/// lacks `created_at` are not locked out of enrollment.
pub fn is_new_member(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match created_at {
        Some(created) => now - created < Duration::days(ELIGIBILITY_WINDOW_DAYS),
        None => false,
    }
}

/// Human-readable eligibility status: unlock date plus remaining days.
///
/// The day count is the ceiling of the remaining time, so any partial day
/// still counts as one; it is never negative. Empty when the creation
/// timestamp is unknown.
pub fn remaining_message(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created) = created_at else {
        return String::new();
    };
    let unlock = created + Duration::days(ELIGIBILITY_WINDOW_DAYS);
    let remaining_ms = (unlock - now).num_milliseconds().max(0);
    // remaining_ms is clamped to >= 0 and DAY_MS > 0, so the unsigned
    // div_ceil (stable) matches the signed computation exactly.
    let days = (remaining_ms as u64).div_ceil(DAY_MS as u64);
    format!(
        "Medical available after {} ({} days)",
        unlock.format("%Y-%m-%d"),
        days
    )
}

/// Whether enrolling in the medical scheme is blocked right now.
///
/// Blocked for never-saved new records, records inside the one-year window,
/// and read-only (approved) records - unless the member is already
/// enrolled, who must never be silently unenrolled.
pub fn enrollment_blocked(
    new_record: bool,
    created_at: Option<DateTime<Utc>>,
    read_only: bool,
    already_enrolled: bool,
    now: DateTime<Utc>,
) -> bool {
    if already_enrolled {
        return false;
    }
    new_record || read_only || is_new_member(created_at, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_new_member_inside_window() {
        let now = at("2026-08-07T12:00:00Z");
        assert!(is_new_member(Some(now - Duration::days(10)), now));
        assert!(is_new_member(Some(now - Duration::days(364)), now));
    }

    #[test]
    fn test_not_new_at_and_past_boundary() {
        let now = at("2026-08-07T12:00:00Z");
        assert!(!is_new_member(Some(now - Duration::days(365)), now));
        assert!(!is_new_member(Some(now - Duration::days(400)), now));
    }

    #[test]
    fn test_boundary_is_exact_milliseconds() {
        let now = at("2026-08-07T12:00:00Z");
        let just_inside = now - Duration::days(365) + Duration::milliseconds(1);
        assert!(is_new_member(Some(just_inside), now));
    }

    #[test]
    fn test_absent_created_at_is_not_new() {
        assert!(!is_new_member(None, at("2026-08-07T12:00:00Z")));
    }

    #[test]
    fn test_remaining_days_are_ceiling() {
        let now = at("2026-08-07T12:00:00Z");
        // One millisecond short of a full year elapsed: one partial day left.
        let created = now - Duration::days(365) + Duration::milliseconds(1);
        let msg = remaining_message(Some(created), now);
        assert!(msg.ends_with("(1 days)"), "{msg}");
    }

    #[test]
    fn test_remaining_never_negative() {
        let now = at("2026-08-07T12:00:00Z");
        let msg = remaining_message(Some(now - Duration::days(700)), now);
        assert!(msg.ends_with("(0 days)"), "{msg}");
    }

    #[test]
    fn test_remaining_for_ten_day_old_record() {
        let now = at("2026-08-07T00:00:00Z");
        let msg = remaining_message(Some(now - Duration::days(10)), now);
        // Unlock lands 355 days out.
        assert!(msg.contains("2027-07-28"), "{msg}");
        assert!(msg.ends_with("(355 days)"), "{msg}");
    }

    #[test]
    fn test_blocked_matrix() {
        let now = at("2026-08-07T12:00:00Z");
        let old = Some(now - Duration::days(400));
        let fresh = Some(now - Duration::days(10));

        assert!(!enrollment_blocked(false, old, false, false, now));
        assert!(enrollment_blocked(false, fresh, false, false, now));
        assert!(enrollment_blocked(true, None, false, false, now));
        assert!(enrollment_blocked(false, old, true, false, now));
        // Already enrolled is never blocked, whatever the other inputs say.
        assert!(!enrollment_blocked(true, fresh, true, true, now));
    }
}
