//! Greedy first-fit allocation of demand rows onto production lines.
//!
//! Rows are processed strictly in input order. Each row picks its modality,
//! then consumes capacity from the first candidate line that still has time
//! left in the week, day by day, until the row is covered or the week runs
//! out. Line clocks carry over from row to row.

use crate::calendar::{PlanningCalendar, hours_to_duration};
use crate::clock::LineClocks;
use crate::config::{ConfigError, LineId, PlannerConfig};
use crate::demand::DemandRow;
use crate::modality::{LineAssignment, ModalitySelector};
use crate::plan::{Plan, RowOutcome, RowStatus, ScheduledSegment, TruncationReason};
use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info, instrument, warn};

/// Where a single row's allocation loop stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowState {
    /// Try to place a chunk on the current line.
    Processing,
    /// Current line is past the horizon; move to the next candidate.
    AdvanceLine,
    /// Current line's shift is over; snap it to the next working day.
    AdvanceDay,
    /// Whole quantity placed.
    RowExhausted,
    /// Remaining quantity dropped.
    RowAbandoned(TruncationReason),
}

pub struct GreedyAllocator<'a> {
    calendar: &'a PlanningCalendar,
    selector: ModalitySelector,
    setup: Duration,
}

impl<'a> GreedyAllocator<'a> {
    pub fn new(config: &PlannerConfig, calendar: &'a PlanningCalendar) -> Self {
        Self {
            calendar,
            selector: ModalitySelector::from_config(config),
            setup: Duration::minutes(config.setup_minutes),
        }
    }

    pub fn selector(&self) -> &ModalitySelector {
        &self.selector
    }

    /// Allocates `rows` in order against the shared `clocks`.
    #[instrument(skip_all, fields(rows = rows.len()))]
    pub fn allocate(&self, rows: &[DemandRow], clocks: &mut LineClocks) -> Plan {
        let mut segments = Vec::new();
        let mut outcomes = Vec::with_capacity(rows.len());
        for (row_index, row) in rows.iter().enumerate() {
            let outcome = self.allocate_row(row_index, row, clocks, &mut segments);
            outcomes.push(outcome);
        }

        let plan = Plan::new(segments, outcomes);
        info!(
            segments = plan.segments().len(),
            truncated = plan.truncated_rows().count(),
            "allocation finished"
        );
        plan
    }

    fn allocate_row(
        &self,
        row_index: usize,
        row: &DemandRow,
        clocks: &mut LineClocks,
        segments: &mut Vec<ScheduledSegment>,
    ) -> RowOutcome {
        let LineAssignment {
            modality,
            rate,
            candidates,
        } = self.selector.select(row);
        let brand = row.brand.to_uppercase();
        let horizon_end = self.calendar.horizon_end();

        let mut pos = first_open_candidate(&candidates, clocks, horizon_end);
        let mut remaining = row.quantity;
        let mut state = if remaining == 0 {
            RowState::RowExhausted
        } else {
            RowState::Processing
        };

        loop {
            if matches!(state, RowState::RowExhausted | RowState::RowAbandoned(_)) {
                break;
            }
            let Some(&line) = candidates.get(pos) else {
                state = RowState::RowAbandoned(TruncationReason::HorizonExhausted);
                break;
            };

            match state {
                RowState::Processing => {
                    let Some(now) = clocks.available_at(line) else {
                        state = RowState::AdvanceLine;
                        continue;
                    };
                    if now >= horizon_end {
                        state = RowState::AdvanceLine;
                        continue;
                    }
                    let hours_left = self.calendar.hours_left(now);
                    if hours_left <= 0.0 {
                        state = RowState::AdvanceDay;
                        continue;
                    }
                    let Some(day) = self.calendar.day_label(now) else {
                        state = RowState::AdvanceDay;
                        continue;
                    };

                    let chunk = whole_boxes(hours_left * rate).min(remaining);
                    if chunk == 0 {
                        state = RowState::RowAbandoned(TruncationReason::NoThroughput);
                        continue;
                    }

                    let end = now + hours_to_duration(chunk as f64 / rate);
                    debug!(line, %day, %now, %end, chunk, "segment scheduled");
                    segments.push(ScheduledSegment {
                        row_index,
                        line,
                        day,
                        product: row.product.clone(),
                        brand: brand.clone(),
                        modality,
                        start: now,
                        end,
                        quantity: chunk,
                    });
                    remaining -= chunk;
                    clocks.advance(line, end + self.setup);
                    if remaining == 0 {
                        state = RowState::RowExhausted;
                    }
                }
                RowState::AdvanceLine => {
                    state = match candidates.iter().position(|&next| next > line) {
                        Some(next) => {
                            pos = next;
                            RowState::Processing
                        }
                        None => RowState::RowAbandoned(TruncationReason::HorizonExhausted),
                    };
                }
                RowState::AdvanceDay => {
                    let next_start = clocks
                        .available_at(line)
                        .and_then(|now| self.calendar.next_day_start(now));
                    state = match next_start {
                        Some(next_start) => {
                            debug!(line, %next_start, "line moved to next working day");
                            clocks.advance(line, next_start);
                            RowState::Processing
                        }
                        None => RowState::RowAbandoned(TruncationReason::HorizonExhausted),
                    };
                }
                RowState::RowExhausted | RowState::RowAbandoned(_) => break,
            }
        }

        let status = match state {
            RowState::RowAbandoned(reason) => RowStatus::Truncated { reason },
            _ => RowStatus::Completed,
        };
        let scheduled = row.quantity - remaining;
        if let RowStatus::Truncated { reason } = status {
            warn!(
                row_index,
                product = %row.product,
                requested = row.quantity,
                scheduled,
                unscheduled = remaining,
                ?reason,
                "demand row truncated"
            );
        }

        RowOutcome {
            row_index,
            product: row.product.clone(),
            brand,
            modality,
            requested: row.quantity,
            scheduled,
            unscheduled: remaining,
            status,
        }
    }
}

/// Plans `rows` on a fresh calendar and fresh line clocks.
pub fn plan_demand(config: &PlannerConfig, rows: &[DemandRow]) -> Result<Plan, ConfigError> {
    let calendar = PlanningCalendar::from_config(config)?;
    let mut clocks = LineClocks::for_calendar(config, &calendar);
    Ok(GreedyAllocator::new(config, &calendar).allocate(rows, &mut clocks))
}

/// First candidate still open before the horizon end, else the first one.
fn first_open_candidate(
    candidates: &[LineId],
    clocks: &LineClocks,
    horizon_end: NaiveDateTime,
) -> usize {
    candidates
        .iter()
        .position(|&line| {
            clocks
                .available_at(line)
                .is_some_and(|at| at < horizon_end)
        })
        .unwrap_or(0)
}

/// Floors a box count; non-finite and non-positive amounts are zero.
fn whole_boxes(amount: f64) -> u64 {
    let floored = amount.floor();
    if floored.is_finite() && floored > 0.0 {
        floored as u64
    } else {
        0
    }
}
