use chrono::NaiveDate;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreakUpdate {
    /// Already active today; nothing to write.
    Unchanged,
    /// Store this streak together with today's date.
    Set(i32),
}

/// Daily streak transition for activity on `today`.
///
/// Same day keeps the streak, the day after the last activity extends it,
/// anything else (first activity, a missed day, a date in the future)
/// restarts it at 1.
pub fn next_streak(
    last_activity: Option<NaiveDate>,
    current_streak: i32,
    today: NaiveDate,
) -> StreakUpdate {
    match last_activity {
        Some(last) if last == today => StreakUpdate::Unchanged,
        Some(last) if today.pred_opt() == Some(last) => {
            StreakUpdate::Set(current_streak.max(0).saturating_add(1))
        }
        _ => StreakUpdate::Set(1),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{StreakUpdate, next_streak};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn same_day_is_unchanged() {
        assert_eq!(next_streak(Some(day(10)), 4, day(10)), StreakUpdate::Unchanged);
    }

    #[test]
    fn consecutive_day_extends() {
        assert_eq!(next_streak(Some(day(9)), 4, day(10)), StreakUpdate::Set(5));
        assert_eq!(next_streak(Some(day(9)), 0, day(10)), StreakUpdate::Set(1));
    }

    #[test]
    fn gaps_and_first_activity_restart() {
        assert_eq!(next_streak(None, 0, day(10)), StreakUpdate::Set(1));
        assert_eq!(next_streak(Some(day(7)), 12, day(10)), StreakUpdate::Set(1));
        assert_eq!(next_streak(Some(day(11)), 3, day(10)), StreakUpdate::Set(1));
    }

    #[test]
    fn month_boundary_counts_as_consecutive() {
        let last = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        assert_eq!(next_streak(Some(last), 2, day(1)), StreakUpdate::Set(3));
    }
}
