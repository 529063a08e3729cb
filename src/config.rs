use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

/// Production line identifier (1-based).
pub type LineId = u8;

/// Number of consecutive working days in the planning horizon.
pub const HORIZON_DAYS: usize = 5;

/// Latest shift end hour. The day end must fall on the same calendar date.
pub const MAX_END_HOUR: u32 = 23;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("week start {date} is a {weekday}, expected a Monday")]
    WeekStartNotMonday { date: NaiveDate, weekday: Weekday },
    #[error("start hour {start} must be before end hour {end} (end at most {MAX_END_HOUR})")]
    InvalidHours { start: u32, end: u32 },
    #[error("setup delay must be non-negative, got {0} minutes")]
    NegativeSetup(i64),
    #[error("planner needs at least one production line")]
    NoLines,
    #[error("no automatic lines configured")]
    NoAutomaticLines,
    #[error("every line is automatic, no manual lines remain")]
    NoManualLines,
    #[error("automatic line {line} is outside 1..={line_count}")]
    UnknownAutomaticLine { line: LineId, line_count: LineId },
    #[error("automatic line {0} listed more than once")]
    DuplicateAutomaticLine(LineId),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Planner constants. `Default` gives the Mon 2026-01-12 week, 08:00-15:00
/// shifts, a 2 minute setup, 12 lines with 1 and 2 automatic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub week_start: NaiveDate,
    pub start_hour: u32,
    pub end_hour: u32,
    pub setup_minutes: i64,
    pub line_count: LineId,
    /// Candidate lines for automatic rows, in priority order.
    pub automatic_lines: Vec<LineId>,
    /// Brand tokens that force the automatic modality.
    pub automatic_keywords: Vec<String>,
    /// Operators staffed per active line.
    pub crew_per_line: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            week_start: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
            start_hour: 8,
            end_hour: 15,
            setup_minutes: 2,
            line_count: 12,
            automatic_lines: vec![1, 2],
            automatic_keywords: vec!["MKA".to_string(), "MILKA".to_string()],
            crew_per_line: 6,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weekday = self.week_start.weekday();
        if weekday != Weekday::Mon {
            return Err(ConfigError::WeekStartNotMonday {
                date: self.week_start,
                weekday,
            });
        }
        if self.start_hour >= self.end_hour || self.end_hour > MAX_END_HOUR {
            return Err(ConfigError::InvalidHours {
                start: self.start_hour,
                end: self.end_hour,
            });
        }
        if self.setup_minutes < 0 {
            return Err(ConfigError::NegativeSetup(self.setup_minutes));
        }
        if self.line_count == 0 {
            return Err(ConfigError::NoLines);
        }
        if self.automatic_lines.is_empty() {
            return Err(ConfigError::NoAutomaticLines);
        }

        let mut seen = HashSet::new();
        for &line in &self.automatic_lines {
            if line == 0 || line > self.line_count {
                return Err(ConfigError::UnknownAutomaticLine {
                    line,
                    line_count: self.line_count,
                });
            }
            if !seen.insert(line) {
                return Err(ConfigError::DuplicateAutomaticLine(line));
            }
        }
        if self.manual_lines().is_empty() {
            return Err(ConfigError::NoManualLines);
        }
        Ok(())
    }

    /// Every line id on the floor, ascending.
    pub fn lines(&self) -> RangeInclusive<LineId> {
        1..=self.line_count
    }

    /// Lines not reserved for automatic work, ascending.
    pub fn manual_lines(&self) -> Vec<LineId> {
        self.lines()
            .filter(|line| !self.automatic_lines.contains(line))
            .collect()
    }
}

pub fn load_config_from_json<P: AsRef<Path>>(path: P) -> Result<PlannerConfig, ConfigError> {
    let file = File::open(path)?;
    let config: PlannerConfig = serde_json::from_reader(file)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config_to_json<P: AsRef<Path>>(
    config: &PlannerConfig,
    path: P,
) -> Result<(), ConfigError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}
