//! Daily wall-clock schedule

use thiserror::Error;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, Time};

use crate::zone::Zone;

/// Identifier of the one scheduled job
pub const DAILY_REPORT_JOB_ID: &str = "daily_report";

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid report time {hour:02}:{minute:02}")]
    InvalidTime { hour: u8, minute: u8 },
}

/// Fires once a day at `hour:minute` local time in a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: Time,
    zone: Zone,
}

impl DailySchedule {
    pub fn new(hour: u8, minute: u8, zone: Zone) -> Result<Self, ScheduleError> {
        let at = Time::from_hms(hour, minute, 0)
            .map_err(|_| ScheduleError::InvalidTime { hour, minute })?;
        Ok(Self { at, zone })
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn time_of_day(&self) -> Time {
        self.at
    }

    /// The first firing strictly after `now`
    pub fn next_after(&self, now: OffsetDateTime) -> OffsetDateTime {
        let today = self.zone.to_local(now).date();
        let fire = self.zone.resolve(PrimitiveDateTime::new(today, self.at));
        if fire > now {
            return fire;
        }

        match today.next_day() {
            Some(tomorrow) => self.zone.resolve(PrimitiveDateTime::new(tomorrow, self.at)),
            None => fire + Duration::days(1),
        }
    }

    /// How long to wait from `now` until the next firing
    pub fn until_next(&self, now: OffsetDateTime) -> std::time::Duration {
        let wait = self.next_after(now) - now;
        std::time::Duration::try_from(wait).unwrap_or_default()
    }
}
