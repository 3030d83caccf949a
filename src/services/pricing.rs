use chrono::NaiveDateTime;

use crate::models::Workspace;

const SECONDS_PER_HOUR: i64 = 60 * 60;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Upper bound for any listed rate, in minor units. Keeps quotes for long
/// stays well inside `i64`.
pub const MAX_RATE: i64 = 1_000_000_000;

/// Price of holding `workspace` for `[start, end)`, in minor units, or `None`
/// if it does not fit in an `i64`.
///
/// Stays shorter than a day are billed per started hour when the workspace
/// has an hourly rate; everything else is billed per started day. Any
/// non-empty interval is at least one unit.
pub fn quote(workspace: &Workspace, start: &NaiveDateTime, end: &NaiveDateTime) -> Option<i64> {
    let seconds = (*end - *start).num_seconds().max(0);
    match workspace.hourly_rate {
        Some(hourly) if seconds < SECONDS_PER_DAY => {
            ceil_div(seconds, SECONDS_PER_HOUR).max(1).checked_mul(hourly)
        }
        _ => ceil_div(seconds, SECONDS_PER_DAY)
            .max(1)
            .checked_mul(workspace.daily_rate),
    }
}

fn ceil_div(n: i64, d: i64) -> i64 {
    n / d + i64::from(n % d != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
            .unwrap()
    }

    fn workspace(hourly: Option<i64>, daily: i64) -> Workspace {
        Workspace {
            id: "ws".to_string(),
            owner_id: "owner".to_string(),
            name: "Desk".to_string(),
            description: String::new(),
            location: "Nairobi".to_string(),
            category: "Coworking".to_string(),
            hourly_rate: hourly,
            daily_rate: daily,
            monthly_rate: None,
            images: vec![],
            created_at: dt("2025-01-01 00:00"),
        }
    }

    #[test]
    fn test_hourly_rounds_up_started_hours() {
        let ws = workspace(Some(500), 3000);
        assert_eq!(quote(&ws, &dt("2025-06-16 09:00"), &dt("2025-06-16 10:00")), Some(500));
        assert_eq!(quote(&ws, &dt("2025-06-16 09:00"), &dt("2025-06-16 10:01")), Some(1000));
        assert_eq!(quote(&ws, &dt("2025-06-16 09:00"), &dt("2025-06-16 09:15")), Some(500));
    }

    #[test]
    fn test_daily_rate_without_hourly() {
        let ws = workspace(None, 3000);
        assert_eq!(quote(&ws, &dt("2025-06-16 09:00"), &dt("2025-06-16 10:00")), Some(3000));
        assert_eq!(quote(&ws, &dt("2025-06-16 09:00"), &dt("2025-06-18 09:00")), Some(6000));
    }

    #[test]
    fn test_multi_day_switches_to_daily() {
        let ws = workspace(Some(500), 3000);
        assert_eq!(quote(&ws, &dt("2025-06-16 00:00"), &dt("2025-06-17 00:00")), Some(3000));
        assert_eq!(quote(&ws, &dt("2025-06-16 00:00"), &dt("2025-06-17 06:00")), Some(6000));
    }

    #[test]
    fn test_sub_minute_stay_is_billed_one_hour() {
        let ws = workspace(Some(500), 3000);
        assert_eq!(
            quote(&ws, &dt("2025-06-16 09:00:00"), &dt("2025-06-16 09:00:30")),
            Some(500)
        );
        assert_eq!(
            quote(&ws, &dt("2025-06-16 09:00:00"), &dt("2025-06-16 10:00:01")),
            Some(1000)
        );
    }

    #[test]
    fn test_overflowing_price_is_none() {
        let ws = workspace(Some(i64::MAX / 2), i64::MAX / 2);
        assert_eq!(quote(&ws, &dt("2025-06-16 09:00"), &dt("2025-06-16 12:00")), None);
        assert_eq!(quote(&ws, &dt("2025-06-16 09:00"), &dt("2025-06-19 09:00")), None);
        assert_eq!(
            quote(&ws, &dt("2025-06-16 09:00"), &dt("2025-06-16 10:00")),
            Some(i64::MAX / 2)
        );
    }
}
