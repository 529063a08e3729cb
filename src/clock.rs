use crate::calendar::PlanningCalendar;
use crate::config::{LineId, PlannerConfig};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Next free instant of every production line.
///
/// The registry is shared by all demand rows of a run and is never reset
/// between rows. Clocks only move forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineClocks {
    clocks: BTreeMap<LineId, NaiveDateTime>,
}

impl LineClocks {
    pub fn new<I>(lines: I, start: NaiveDateTime) -> Self
    where
        I: IntoIterator<Item = LineId>,
    {
        Self {
            clocks: lines.into_iter().map(|line| (line, start)).collect(),
        }
    }

    /// Every configured line, free from the first working day's start.
    pub fn for_calendar(config: &PlannerConfig, calendar: &PlanningCalendar) -> Self {
        Self::new(config.lines(), calendar.first_start())
    }

    pub fn available_at(&self, line: LineId) -> Option<NaiveDateTime> {
        self.clocks.get(&line).copied()
    }

    /// Moves `line` forward to `to`. Earlier instants are ignored.
    pub(crate) fn advance(&mut self, line: LineId, to: NaiveDateTime) {
        if let Some(clock) = self.clocks.get_mut(&line) {
            *clock = (*clock).max(to);
        }
    }

    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LineId, NaiveDateTime)> + '_ {
        self.clocks.iter().map(|(line, at)| (*line, *at))
    }
}
