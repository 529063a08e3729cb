use crate::allocator::plan_demand;
use crate::config::{ConfigError, PlannerConfig};
use crate::demand::DemandRow;
use crate::plan::{DayLoad, Plan, PlanFilter, PlanMetrics, PlanView, PlanWorkbook};

/// One planning run held in memory: config, uploaded demand, resulting plan
/// and the active view filter.
#[derive(Debug, Clone, Default)]
pub struct PlanningSession {
    config: PlannerConfig,
    demand: Vec<DemandRow>,
    plan: Option<Plan>,
    filter: PlanFilter,
}

impl PlanningSession {
    pub fn new(config: PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Swaps the config and re-plans any loaded demand from scratch.
    pub fn set_config(&mut self, config: PlannerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.plan.is_some() {
            self.plan = Some(plan_demand(&config, &self.demand)?);
        }
        self.config = config;
        Ok(())
    }

    pub fn demand(&self) -> &[DemandRow] {
        &self.demand
    }

    /// Replaces the demand and plans it on fresh line clocks. The view
    /// filter is reset.
    pub fn plan_demand(&mut self, demand: Vec<DemandRow>) -> Result<&Plan, ConfigError> {
        let plan = plan_demand(&self.config, &demand)?;
        self.demand = demand;
        self.filter = PlanFilter::default();
        Ok(self.plan.insert(plan))
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn filter(&self) -> &PlanFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: PlanFilter) {
        self.filter = filter;
    }

    pub fn clear_filter(&mut self) {
        self.filter = PlanFilter::default();
    }

    /// The plan through the session filter.
    pub fn view(&self) -> Option<PlanView<'_>> {
        self.view_with(&self.filter)
    }

    pub fn view_with(&self, filter: &PlanFilter) -> Option<PlanView<'_>> {
        self.plan.as_ref().map(|plan| plan.filter(filter))
    }

    pub fn metrics(&self) -> Option<PlanMetrics> {
        self.metrics_with(&self.filter)
    }

    pub fn metrics_with(&self, filter: &PlanFilter) -> Option<PlanMetrics> {
        let plan = self.plan.as_ref()?;
        let view = plan.filter(filter);
        Some(plan.metrics(&view, self.config.crew_per_line))
    }

    pub fn load_by_day(&self) -> Option<Vec<DayLoad>> {
        self.view().map(|view| view.load_by_day())
    }

    pub fn workbook(&self) -> Option<PlanWorkbook> {
        self.workbook_with(&self.filter)
    }

    pub fn workbook_with(&self, filter: &PlanFilter) -> Option<PlanWorkbook> {
        let plan = self.plan.as_ref()?;
        Some(PlanWorkbook::new(plan, &plan.filter(filter)))
    }
}
