use std::time::{Duration, Instant};

use mimir::{Database, Module, Result, SlotInfo};

use crate::data::CycleInfo;

/// Stamps every tick with its start time. Runs first; every other module reads the
/// produced [`CycleInfo`] so age computations within one tick agree on "now".
pub struct CycleInfoProvider {
    cycle_time: Duration,
}

impl CycleInfoProvider {
    #[must_use]
    pub fn new(cycle_time: Duration) -> Self {
        Self { cycle_time }
    }
}

impl Module for CycleInfoProvider {
    fn name(&self) -> &'static str {
        "cycle_info_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        Vec::new()
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<CycleInfo>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<CycleInfo>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let mut cycle_info = database.get_mut::<CycleInfo>()?;
        cycle_info.start_time = Instant::now();
        cycle_info.cycle_time = self.cycle_time;
        Ok(())
    }
}
