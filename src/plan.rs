use crate::calendar::DayLabel;
use crate::config::LineId;
use crate::modality::Modality;
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const COL_LINE: &str = "Line";
pub const COL_DAY: &str = "Day";
pub const COL_PRODUCT: &str = "Product";
pub const COL_BRAND: &str = "Brand";
pub const COL_MODALITY: &str = "Modality";
pub const COL_START_TIME: &str = "Start Time";
pub const COL_END_TIME: &str = "End Time";
pub const COL_QUANTITY: &str = "Quantity";

pub const SHEET_FULL_PLAN: &str = "Plan_Completo";
pub const SHEET_FILTERED_VIEW: &str = "Vista_Filtrada";

/// A contiguous run of one demand row on one line within one working day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSegment {
    /// Position of the demand row this segment serves.
    pub row_index: usize,
    pub line: LineId,
    pub day: DayLabel,
    pub product: String,
    /// Brand, upper-cased.
    pub brand: String,
    pub modality: Modality,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub quantity: u64,
}

impl ScheduledSegment {
    pub fn start_time(&self) -> String {
        self.start.format("%H:%M").to_string()
    }

    pub fn end_time(&self) -> String {
        self.end.format("%H:%M").to_string()
    }

    pub fn to_row(&self) -> PlanRow {
        PlanRow {
            line: self.line,
            day: self.day,
            product: self.product.clone(),
            brand: self.brand.clone(),
            modality: self.modality,
            start_time: self.start_time(),
            end_time: self.end_time(),
            quantity: self.quantity,
        }
    }
}

/// Tabular form of a segment, as shown to users and exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRow {
    #[serde(rename = "Line")]
    pub line: LineId,
    #[serde(rename = "Day")]
    pub day: DayLabel,
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Modality")]
    pub modality: Modality,
    #[serde(rename = "Start Time")]
    pub start_time: String,
    #[serde(rename = "End Time")]
    pub end_time: String,
    #[serde(rename = "Quantity")]
    pub quantity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationReason {
    /// Every candidate line ran past the last working day.
    HorizonExhausted,
    /// Not one whole box fits in the time left on the line's current day.
    NoThroughput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowStatus {
    Completed,
    Truncated { reason: TruncationReason },
}

/// What happened to one demand row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub row_index: usize,
    pub product: String,
    pub brand: String,
    pub modality: Modality,
    pub requested: u64,
    pub scheduled: u64,
    pub unscheduled: u64,
    #[serde(flatten)]
    pub status: RowStatus,
}

impl RowOutcome {
    pub fn is_truncated(&self) -> bool {
        matches!(self.status, RowStatus::Truncated { .. })
    }
}

/// Selection applied to a plan before display or export.
///
/// An empty dimension matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFilter {
    #[serde(default)]
    pub days: Vec<DayLabel>,
    #[serde(default)]
    pub lines: Vec<LineId>,
    #[serde(default)]
    pub brands: Vec<String>,
}

impl PlanFilter {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.lines.is_empty() && self.brands.is_empty()
    }

    pub fn matches(&self, segment: &ScheduledSegment) -> bool {
        let day_ok = self.days.is_empty() || self.days.contains(&segment.day);
        let line_ok = self.lines.is_empty() || self.lines.contains(&segment.line);
        let brand_ok = self.brands.is_empty()
            || self
                .brands
                .iter()
                .any(|brand| brand.trim().to_uppercase() == segment.brand);
        day_ok && line_ok && brand_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanMetrics {
    /// Distinct lines used anywhere in the plan.
    pub active_lines: usize,
    pub headcount: u64,
    /// Boxes in the filtered view.
    pub total_boxes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLoad {
    pub day: DayLabel,
    pub quantity: u64,
}

/// Result of one allocation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    segments: Vec<ScheduledSegment>,
    outcomes: Vec<RowOutcome>,
}

impl Plan {
    pub(crate) fn new(segments: Vec<ScheduledSegment>, outcomes: Vec<RowOutcome>) -> Self {
        Self { segments, outcomes }
    }

    /// Segments in creation order.
    pub fn segments(&self) -> &[ScheduledSegment] {
        &self.segments
    }

    /// One entry per demand row, in input order.
    pub fn outcomes(&self) -> &[RowOutcome] {
        &self.outcomes
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn truncated_rows(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_truncated())
    }

    pub fn segments_for_row(&self, row_index: usize) -> impl Iterator<Item = &ScheduledSegment> {
        self.segments
            .iter()
            .filter(move |segment| segment.row_index == row_index)
    }

    pub fn total_quantity(&self) -> u64 {
        self.segments.iter().map(|segment| segment.quantity).sum()
    }

    /// Distinct days in order of first appearance.
    pub fn days(&self) -> Vec<DayLabel> {
        let mut days = Vec::new();
        for segment in &self.segments {
            if !days.contains(&segment.day) {
                days.push(segment.day);
            }
        }
        days
    }

    pub fn lines(&self) -> Vec<LineId> {
        self.segments
            .iter()
            .map(|segment| segment.line)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct brands in order of first appearance.
    pub fn brands(&self) -> Vec<String> {
        let mut brands: Vec<String> = Vec::new();
        for segment in &self.segments {
            if !brands.iter().any(|brand| brand == &segment.brand) {
                brands.push(segment.brand.clone());
            }
        }
        brands
    }

    pub fn view(&self) -> PlanView<'_> {
        PlanView {
            segments: self.segments.iter().collect(),
        }
    }

    pub fn filter(&self, filter: &PlanFilter) -> PlanView<'_> {
        PlanView {
            segments: self
                .segments
                .iter()
                .filter(|segment| filter.matches(segment))
                .collect(),
        }
    }

    /// Line count and headcount come from the whole plan, boxes from `view`.
    pub fn metrics(&self, view: &PlanView<'_>, crew_per_line: u32) -> PlanMetrics {
        let active_lines = self.lines().len();
        PlanMetrics {
            active_lines,
            headcount: active_lines as u64 * u64::from(crew_per_line),
            total_boxes: view.total_quantity(),
        }
    }

    pub fn rows(&self) -> Vec<PlanRow> {
        self.segments.iter().map(ScheduledSegment::to_row).collect()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        segments_to_dataframe(self.segments.iter())
    }
}

/// Filtered, order-preserving window over a plan's segments.
#[derive(Debug, Clone)]
pub struct PlanView<'a> {
    segments: Vec<&'a ScheduledSegment>,
}

impl<'a> PlanView<'a> {
    pub fn segments(&self) -> &[&'a ScheduledSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_quantity(&self) -> u64 {
        self.segments.iter().map(|segment| segment.quantity).sum()
    }

    /// Boxes per working day, Monday to Friday, zero for idle days.
    pub fn load_by_day(&self) -> Vec<DayLoad> {
        DayLabel::WEEK
            .iter()
            .map(|&day| DayLoad {
                day,
                quantity: self
                    .segments
                    .iter()
                    .filter(|segment| segment.day == day)
                    .map(|segment| segment.quantity)
                    .sum(),
            })
            .collect()
    }

    pub fn rows(&self) -> Vec<PlanRow> {
        self.segments.iter().map(|segment| segment.to_row()).collect()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        segments_to_dataframe(self.segments.iter().copied())
    }
}

/// Full plan plus the currently filtered view, exported side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanWorkbook {
    #[serde(rename = "Plan_Completo")]
    pub full_plan: Vec<PlanRow>,
    #[serde(rename = "Vista_Filtrada")]
    pub filtered_view: Vec<PlanRow>,
}

impl PlanWorkbook {
    pub fn new(plan: &Plan, view: &PlanView<'_>) -> Self {
        Self {
            full_plan: plan.rows(),
            filtered_view: view.rows(),
        }
    }
}

fn segments_to_dataframe<'a, I>(segments: I) -> PolarsResult<DataFrame>
where
    I: Iterator<Item = &'a ScheduledSegment>,
{
    let segments: Vec<&ScheduledSegment> = segments.collect();

    let lines: Vec<u32> = segments.iter().map(|s| u32::from(s.line)).collect();
    let days: Vec<&str> = segments.iter().map(|s| s.day.as_str()).collect();
    let products: Vec<&str> = segments.iter().map(|s| s.product.as_str()).collect();
    let brands: Vec<&str> = segments.iter().map(|s| s.brand.as_str()).collect();
    let modalities: Vec<&str> = segments.iter().map(|s| s.modality.as_str()).collect();
    let starts: Vec<String> = segments.iter().map(|s| s.start_time()).collect();
    let ends: Vec<String> = segments.iter().map(|s| s.end_time()).collect();
    let quantities: Vec<u64> = segments.iter().map(|s| s.quantity).collect();

    let columns: Vec<Column> = vec![
        Series::new(PlSmallStr::from_static(COL_LINE), lines).into_column(),
        Series::new(PlSmallStr::from_static(COL_DAY), days).into_column(),
        Series::new(PlSmallStr::from_static(COL_PRODUCT), products).into_column(),
        Series::new(PlSmallStr::from_static(COL_BRAND), brands).into_column(),
        Series::new(PlSmallStr::from_static(COL_MODALITY), modalities).into_column(),
        Series::new(PlSmallStr::from_static(COL_START_TIME), starts).into_column(),
        Series::new(PlSmallStr::from_static(COL_END_TIME), ends).into_column(),
        Series::new(PlSmallStr::from_static(COL_QUANTITY), quantities).into_column(),
    ];
    DataFrame::new(columns)
}
