use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use nestbot_config::ScheduleConfig;

/// A once-a-day trigger at a fixed local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    tz: Tz,
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(tz: Tz, at: NaiveTime) -> Self {
        Self { tz, at }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.tz(), config.daily_time())
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// The local calendar date at `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    /// The first trigger instant strictly after `now`.
    ///
    /// A local time skipped by a DST jump moves to the next day that has it.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_today = self.today(now);
        for offset in 0..=3 {
            let Some(date) = local_today.checked_add_days(Days::new(offset)) else {
                break;
            };
            if let Some(at) = self.tz.from_local_datetime(&date.and_time(self.at)).earliest() {
                let at = at.with_timezone(&Utc);
                if at > now {
                    return at;
                }
            }
        }
        now + chrono::Duration::days(1)
    }

    /// Time left until the next trigger, for `tokio::time::sleep`.
    pub fn until_next_run(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.next_run_after(now) - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn local_date_follows_timezone() {
        // Krasnoyarsk is UTC+7 all year round.
        let schedule = DailySchedule::new(chrono_tz::Asia::Krasnoyarsk, nine());
        assert_eq!(
            schedule.today(utc(2025, 3, 14, 18, 0)),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
        );
    }

    #[test]
    fn next_run_is_later_today_or_tomorrow() {
        let schedule = DailySchedule::new(chrono_tz::Asia::Krasnoyarsk, nine());
        // 08:00 local → 09:00 local the same day (02:00 UTC).
        assert_eq!(schedule.next_run_after(utc(2025, 3, 15, 1, 0)), utc(2025, 3, 15, 2, 0));
        // Exactly 09:00 local → tomorrow.
        assert_eq!(schedule.next_run_after(utc(2025, 3, 15, 2, 0)), utc(2025, 3, 16, 2, 0));
        // 10:00 local → tomorrow.
        assert_eq!(schedule.next_run_after(utc(2025, 3, 15, 3, 0)), utc(2025, 3, 16, 2, 0));
    }

    #[test]
    fn skipped_local_time_moves_to_next_day() {
        // 02:30 does not exist in Berlin on 2025-03-30.
        let at = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        let schedule = DailySchedule::new(chrono_tz::Europe::Berlin, at);
        let next = schedule.next_run_after(utc(2025, 3, 29, 12, 0));
        // 2025-03-31 02:30 CEST is 00:30 UTC.
        assert_eq!(next, utc(2025, 3, 31, 0, 30));
    }

    #[test]
    fn wait_is_positive_and_at_most_a_day() {
        let schedule = DailySchedule::new(chrono_tz::UTC, nine());
        let wait = schedule.until_next_run(utc(2025, 3, 15, 9, 0));
        assert_eq!(wait, std::time::Duration::from_secs(24 * 60 * 60));
        let wait = schedule.until_next_run(utc(2025, 3, 15, 8, 59));
        assert_eq!(wait, std::time::Duration::from_secs(60));
    }
}
