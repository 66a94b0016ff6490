use std::any::TypeId;

use miette::Result;

use crate::storage::{DataType, Database};

/// Identifies a data slot by type, with the type name kept for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotInfo {
    pub id: TypeId,
    pub name: &'static str,
}

impl SlotInfo {
    /// The slot info for data type `T`.
    #[must_use]
    pub fn of<T: DataType>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

/// One per-cycle computation.
///
/// A module declares the slots it consumes ([`Module::dependencies`]) and the slots it
/// produces ([`Module::productions`]); the scheduler derives the execution order from
/// these declarations. [`Module::cycle`] is invoked exactly once per tick, after all
/// producers of its dependencies have run.
///
/// Most modules produce exactly one slot; protocol receivers may own several (e.g. the
/// teammate table and the incoming NTP requests), each still having this module as its
/// only producer.
pub trait Module: Send {
    /// A unique, human-readable name, used in diagnostics and for parameter updates.
    fn name(&self) -> &'static str;

    /// The slots this module reads during [`Module::cycle`].
    fn dependencies(&self) -> Vec<SlotInfo>;

    /// The slots this module writes during [`Module::cycle`].
    fn productions(&self) -> Vec<SlotInfo>;

    /// Registers this module's production slots in the database.
    fn register(&self, database: &mut Database) -> Result<()>;

    /// Runs one cycle. Inconsistent inputs are not an error: leave the production in its
    /// reset (invalid) state and return `Ok`. Errors are reserved for real faults.
    fn cycle(&mut self, database: &Database) -> Result<()>;

    /// Applies a staged parameter update. Called between ticks, never mid-cycle.
    fn reload(&mut self, _parameters: &toml::Value) -> Result<()> {
        Ok(())
    }
}
