pub mod allocator;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod demand;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod modality;
pub mod plan;
pub mod session;
pub mod tabular;

pub use allocator::{GreedyAllocator, plan_demand};
pub use calendar::{DayLabel, PlanningCalendar};
pub use clock::LineClocks;
pub use config::{
    ConfigError, HORIZON_DAYS, LineId, PlannerConfig, load_config_from_json, save_config_to_json,
};
pub use demand::DemandRow;
pub use modality::{LineAssignment, Modality, ModalitySelector};
pub use plan::{
    DayLoad, Plan, PlanFilter, PlanMetrics, PlanRow, PlanView, PlanWorkbook, RowOutcome,
    RowStatus, ScheduledSegment, TruncationReason,
};
pub use session::PlanningSession;
pub use tabular::{
    TabularError, TabularResult, XLSX_CONTENT_TYPE, demand_from_dataframe, load_demand_from_csv,
    load_demand_from_path, load_demand_from_xlsx, load_plan_rows_from_csv, load_workbook_from_json,
    read_demand_csv, read_demand_xlsx, save_plan_to_csv, save_workbook_to_csv_dir,
    save_workbook_to_json, save_workbook_to_xlsx, write_plan_csv, write_workbook_xlsx,
};
