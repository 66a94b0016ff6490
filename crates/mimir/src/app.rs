use std::{
    any::TypeId,
    collections::HashSet,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use miette::Result;
use tracing::warn;

use crate::{
    module::Module,
    params::ParameterStore,
    schedule::Schedule,
    storage::{DataType, Database},
};

/// The glue that binds modules and slots together.
///
/// Input slots are registered first (data the embedding process writes: perception,
/// localization, sensors), then the modules. [`App::build`] validates the slot graph and
/// returns a runnable [`Brain`].
#[derive(Default)]
pub struct App {
    modules: Vec<Box<dyn Module>>,
    database: Database,
    inputs: HashSet<TypeId>,
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an input slot with its initial value.
    ///
    /// Input slots have no producing module and are retained across ticks; the embedding
    /// process refreshes them through [`Brain::database`].
    pub fn add_input<T: DataType>(mut self, initial: T) -> Result<Self> {
        self.database.register_input(initial)?;
        self.inputs.insert(TypeId::of::<T>());
        Ok(self)
    }

    /// Adds a module and registers its production slots.
    pub fn add_module(mut self, module: impl Module + 'static) -> Result<Self> {
        module.register(&mut self.database)?;
        self.modules.push(Box::new(module));
        Ok(self)
    }

    /// Validates the slot graph and produces a runnable brain.
    ///
    /// # Errors
    /// Fails on duplicate producers, unresolved dependencies, or dependency cycles.
    pub fn build(self) -> Result<Brain> {
        let schedule = Schedule::build(&self.modules, &self.inputs)?;

        Ok(Brain {
            modules: self.modules,
            database: self.database,
            schedule,
            parameters: ParameterStore::new(),
        })
    }
}

/// A scheduled module graph, ready to tick.
pub struct Brain {
    modules: Vec<Box<dyn Module>>,
    database: Database,
    schedule: Schedule,
    parameters: ParameterStore,
}

impl Brain {
    /// The shared slot registry, for writing input slots and inspecting productions.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// A handle for staging parameter updates from other threads.
    #[must_use]
    pub fn parameter_store(&self) -> ParameterStore {
        self.parameters.clone()
    }

    /// Runs one tick: resets all productions to their invalid state, cycles every module
    /// in topological order, then applies staged parameter updates.
    pub fn tick(&mut self) -> Result<()> {
        self.database.reset_productions();

        for &index in &self.schedule.order {
            self.modules[index].cycle(&self.database)?;
        }

        self.apply_parameter_updates();

        Ok(())
    }

    /// Ticks at the given period until `stop` is set. Overruns are not compensated; the
    /// next tick simply starts late.
    pub fn run(&mut self, tick_period: Duration, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::Relaxed) {
            let start = Instant::now();
            self.tick()?;

            if let Some(remaining) = tick_period.checked_sub(start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }

    fn apply_parameter_updates(&mut self) {
        for (name, value) in self.parameters.drain() {
            match self.modules.iter_mut().find(|module| module.name() == name) {
                Some(module) => {
                    if let Err(report) = module.reload(&value) {
                        warn!("parameter update for `{name}` rejected: {report}");
                    }
                }
                None => warn!("parameter update for unknown module `{name}` dropped"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::SlotInfo;

    #[derive(Default)]
    struct Source {
        valid: bool,
        value: u32,
    }

    impl DataType for Source {
        fn reset(&mut self) {
            self.valid = false;
        }
    }

    #[derive(Default)]
    struct Doubled {
        valid: bool,
        value: u32,
    }

    impl DataType for Doubled {
        fn reset(&mut self) {
            self.valid = false;
        }
    }

    #[derive(Default)]
    struct RawInput(u32);
    impl DataType for RawInput {}

    struct SourceModule {
        gain: u32,
    }

    impl Module for SourceModule {
        fn name(&self) -> &'static str {
            "source"
        }

        fn dependencies(&self) -> Vec<SlotInfo> {
            vec![SlotInfo::of::<RawInput>()]
        }

        fn productions(&self) -> Vec<SlotInfo> {
            vec![SlotInfo::of::<Source>()]
        }

        fn register(&self, database: &mut Database) -> Result<()> {
            database.register_production::<Source>()
        }

        fn cycle(&mut self, database: &Database) -> Result<()> {
            let raw = database.get::<RawInput>()?.0;
            let mut source = database.get_mut::<Source>()?;
            source.value = raw * self.gain;
            source.valid = true;
            Ok(())
        }

        fn reload(&mut self, parameters: &toml::Value) -> Result<()> {
            if let Some(gain) = parameters.get("gain").and_then(toml::Value::as_integer) {
                self.gain = gain as u32;
            }
            Ok(())
        }
    }

    struct DoublerModule;

    impl Module for DoublerModule {
        fn name(&self) -> &'static str {
            "doubler"
        }

        fn dependencies(&self) -> Vec<SlotInfo> {
            vec![SlotInfo::of::<Source>()]
        }

        fn productions(&self) -> Vec<SlotInfo> {
            vec![SlotInfo::of::<Doubled>()]
        }

        fn register(&self, database: &mut Database) -> Result<()> {
            database.register_production::<Doubled>()
        }

        fn cycle(&mut self, database: &Database) -> Result<()> {
            let source = database.get::<Source>()?;
            let mut doubled = database.get_mut::<Doubled>()?;
            // gate on validity, leave our production invalid otherwise
            if source.valid {
                doubled.value = source.value * 2;
                doubled.valid = true;
            }
            Ok(())
        }
    }

    fn build_brain() -> Result<Brain> {
        // added consumer-first on purpose; the schedule sorts them
        App::new()
            .add_input(RawInput(5))?
            .add_module(DoublerModule)?
            .add_module(SourceModule { gain: 1 })?
            .build()
    }

    #[test]
    fn data_flows_through_the_graph() -> Result<()> {
        let mut brain = build_brain()?;
        brain.tick()?;

        let doubled = brain.database().get::<Doubled>()?;
        assert!(doubled.valid);
        assert_eq!(doubled.value, 10);

        Ok(())
    }

    #[test]
    fn productions_are_reset_every_tick() -> Result<()> {
        let mut brain = build_brain()?;
        brain.tick()?;
        brain.database().get_mut::<RawInput>()?.0 = 7;
        brain.tick()?;

        assert_eq!(brain.database().get::<Doubled>()?.value, 14);

        Ok(())
    }

    #[test]
    fn parameter_updates_apply_between_ticks() -> Result<()> {
        let mut brain = build_brain()?;
        let store = brain.parameter_store();

        store.stage("source", toml::toml! { gain = 3 }.into());
        brain.tick()?; // applied after this tick
        brain.tick()?;

        assert_eq!(brain.database().get::<Doubled>()?.value, 30);

        Ok(())
    }
}
