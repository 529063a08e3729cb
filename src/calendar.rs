use crate::config::{ConfigError, HORIZON_DAYS, PlannerConfig};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MICROS_PER_HOUR: f64 = 3_600_000_000.0;

/// Localized label of a working day in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayLabel {
    Lunes,
    Martes,
    #[serde(rename = "Miércoles", alias = "Miercoles")]
    Miercoles,
    Jueves,
    Viernes,
}

impl DayLabel {
    /// Week order, Monday first.
    pub const WEEK: [DayLabel; HORIZON_DAYS] = [
        DayLabel::Lunes,
        DayLabel::Martes,
        DayLabel::Miercoles,
        DayLabel::Jueves,
        DayLabel::Viernes,
    ];

    /// Weekend days have no label.
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Mon => Some(DayLabel::Lunes),
            Weekday::Tue => Some(DayLabel::Martes),
            Weekday::Wed => Some(DayLabel::Miercoles),
            Weekday::Thu => Some(DayLabel::Jueves),
            Weekday::Fri => Some(DayLabel::Viernes),
            Weekday::Sat | Weekday::Sun => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayLabel::Lunes => "Lunes",
            DayLabel::Martes => "Martes",
            DayLabel::Miercoles => "Miércoles",
            DayLabel::Jueves => "Jueves",
            DayLabel::Viernes => "Viernes",
        }
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        match wanted.as_str() {
            "lunes" => Ok(DayLabel::Lunes),
            "martes" => Ok(DayLabel::Martes),
            "miércoles" | "miercoles" => Ok(DayLabel::Miercoles),
            "jueves" => Ok(DayLabel::Jueves),
            "viernes" => Ok(DayLabel::Viernes),
            _ => Err(format!("unknown day label '{}'", s.trim())),
        }
    }
}

/// The five working days of the planning week and their shared shift window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanningCalendar {
    day_starts: Vec<NaiveDateTime>,
    start_hour: u32,
    end_hour: u32,
}

impl PlanningCalendar {
    pub fn from_config(config: &PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let day_starts = (0..HORIZON_DAYS as i64)
            .map(|offset| at_hour(config.week_start + Duration::days(offset), config.start_hour))
            .collect();
        Ok(Self {
            day_starts,
            start_hour: config.start_hour,
            end_hour: config.end_hour,
        })
    }

    pub fn day_starts(&self) -> &[NaiveDateTime] {
        &self.day_starts
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    /// Start of the first working day; every line clock begins here.
    pub fn first_start(&self) -> NaiveDateTime {
        self.day_starts[0]
    }

    /// End hour of the last working day. Nothing is scheduled at or after it.
    pub fn horizon_end(&self) -> NaiveDateTime {
        let last = self.day_starts[self.day_starts.len() - 1];
        at_hour(last.date(), self.end_hour)
    }

    /// Shift end on the calendar date of `at`.
    pub fn day_end(&self, at: NaiveDateTime) -> NaiveDateTime {
        at_hour(at.date(), self.end_hour)
    }

    /// Hours left before the shift ends on the date of `at`; zero or negative
    /// once the shift is over.
    pub fn hours_left(&self, at: NaiveDateTime) -> f64 {
        hours_between(at, self.day_end(at))
    }

    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        self.day_starts.iter().position(|start| start.date() == date)
    }

    /// Start of the working day after the one containing `at`, if any.
    pub fn next_day_start(&self, at: NaiveDateTime) -> Option<NaiveDateTime> {
        let idx = self.day_index(at.date())?;
        self.day_starts.get(idx + 1).copied()
    }

    pub fn day_label(&self, at: NaiveDateTime) -> Option<DayLabel> {
        self.day_index(at.date())
            .and_then(|idx| DayLabel::from_weekday(self.day_starts[idx].weekday()))
    }

    /// True when `[start, end]` sits inside a single working day's shift.
    pub fn contains_window(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        let Some(idx) = self.day_index(start.date()) else {
            return false;
        };
        start >= self.day_starts[idx] && end <= self.day_end(start) && start <= end
    }
}

fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour))
}

pub(crate) fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / MICROS_PER_HOUR,
        None => delta.num_seconds() as f64 / 3600.0,
    }
}

/// Duration of `hours`, rounded to the microsecond.
pub(crate) fn hours_to_duration(hours: f64) -> Duration {
    Duration::microseconds((hours * MICROS_PER_HOUR).round() as i64)
}
