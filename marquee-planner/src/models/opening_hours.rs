//! Venue opening hours
//!
//! Mirrors the `regularOpeningHours` shape of the Places API: a week of
//! open/close points, days numbered 0 (Sunday) through 6 (Saturday). A period
//! with no close point means the venue never closes.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: u32 = 24 * 60;
const MINUTES_PER_WEEK: u32 = 7 * MINUTES_PER_DAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTime {
    /// 0 = Sunday
    pub day: u8,
    pub hour: u8,
    #[serde(default)]
    pub minute: u8,
}

impl DayTime {
    fn minute_of_week(&self) -> u32 {
        u32::from(self.day % 7) * MINUTES_PER_DAY + u32::from(self.hour) * 60 + u32::from(self.minute)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningPeriod {
    pub open: DayTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<DayTime>,
}

impl OpeningPeriod {
    fn contains(&self, minute_of_week: u32) -> bool {
        let Some(close) = self.close else {
            return true;
        };

        let open = self.open.minute_of_week();
        let mut close = close.minute_of_week();
        if close <= open {
            // Wraps past Saturday midnight
            close += MINUTES_PER_WEEK;
        }

        (open..close).contains(&minute_of_week)
            || (open..close).contains(&(minute_of_week + MINUTES_PER_WEEK))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    /// Display lines, e.g. "Monday: 5:00 – 11:00 PM"
    #[serde(default)]
    pub weekday_text: Vec<String>,
    #[serde(default)]
    pub periods: Vec<OpeningPeriod>,
}

impl OpeningHours {
    /// Whether the venue is open at a wall-clock time
    ///
    /// Returns `None` when no periods are known.
    pub fn is_open_at(&self, at: &NaiveDateTime) -> Option<bool> {
        if self.periods.is_empty() {
            return None;
        }
        let minute_of_week = at.weekday().num_days_from_sunday() * MINUTES_PER_DAY
            + at.hour() * 60
            + at.minute();
        Some(self.periods.iter().any(|p| p.contains(minute_of_week)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        // 2025-03-02 is a Sunday
        NaiveDate::from_ymd_opt(2025, 3, 2 + day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn period(day: u8, open: (u8, u8), close_day: u8, close: (u8, u8)) -> OpeningPeriod {
        OpeningPeriod {
            open: DayTime { day, hour: open.0, minute: open.1 },
            close: Some(DayTime { day: close_day, hour: close.0, minute: close.1 }),
        }
    }

    #[test]
    fn test_unknown_hours() {
        assert_eq!(OpeningHours::default().is_open_at(&dt(0, 12, 0)), None);
    }

    #[test]
    fn test_same_day_period() {
        let hours = OpeningHours {
            weekday_text: vec![],
            periods: vec![period(2, (17, 0), 2, (23, 0))],
        };
        // Tuesday
        assert_eq!(hours.is_open_at(&dt(2, 18, 0)), Some(true));
        assert_eq!(hours.is_open_at(&dt(2, 23, 0)), Some(false));
        assert_eq!(hours.is_open_at(&dt(2, 16, 59)), Some(false));
        // Wednesday
        assert_eq!(hours.is_open_at(&dt(3, 18, 0)), Some(false));
    }

    #[test]
    fn test_period_past_midnight() {
        let hours = OpeningHours {
            weekday_text: vec![],
            periods: vec![period(5, (18, 0), 6, (2, 0))],
        };
        // Friday 23:30 and Saturday 01:30
        assert_eq!(hours.is_open_at(&dt(5, 23, 30)), Some(true));
        assert_eq!(hours.is_open_at(&dt(6, 1, 30)), Some(true));
        assert_eq!(hours.is_open_at(&dt(6, 2, 30)), Some(false));
    }

    #[test]
    fn test_period_wrapping_end_of_week() {
        let hours = OpeningHours {
            weekday_text: vec![],
            periods: vec![period(6, (20, 0), 0, (3, 0))],
        };
        // Saturday 22:00 and Sunday 02:00
        assert_eq!(hours.is_open_at(&dt(6, 22, 0)), Some(true));
        assert_eq!(hours.is_open_at(&dt(0, 2, 0)), Some(true));
        assert_eq!(hours.is_open_at(&dt(0, 4, 0)), Some(false));
    }

    #[test]
    fn test_always_open() {
        let hours = OpeningHours {
            weekday_text: vec![],
            periods: vec![OpeningPeriod {
                open: DayTime { day: 0, hour: 0, minute: 0 },
                close: None,
            }],
        };
        assert_eq!(hours.is_open_at(&dt(4, 3, 0)), Some(true));
    }
}
