use std::{
    any::{Any, TypeId},
    collections::HashMap,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use miette::{miette, Result};

/// A value that can live in a database slot.
///
/// The [`DataType::reset`] state is the slot's well-defined invalid state, written before
/// every tick so consumers never observe data from a previous cycle.
pub trait DataType: Default + Send + Sync + 'static {
    /// Returns the value to its invalid state. The default implementation replaces the
    /// value wholesale; types that keep running state across ticks (maps, buffers)
    /// override this to clear only the per-tick parts.
    fn reset(&mut self) {
        *self = Self::default();
    }
}

type Erased = dyn Any + Send + Sync;

struct Slot {
    value: Arc<RwLock<Erased>>,
    /// Reset hook, present only for module productions. Input slots are retained across
    /// ticks because the embedding process refreshes them.
    reset: Option<fn(&mut Erased)>,
}

fn reset_slot<T: DataType>(erased: &mut Erased) {
    erased
        .downcast_mut::<T>()
        .expect("slot type changed under us")
        .reset();
}

/// The typed slot registry shared by all modules of a brain.
#[derive(Default)]
pub struct Database {
    slots: HashMap<TypeId, Slot>,
}

impl Database {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a production slot initialised to its reset state.
    ///
    /// # Errors
    /// Fails if a slot of type `T` already exists.
    pub fn register_production<T: DataType>(&mut self) -> Result<()> {
        self.insert_slot::<T>(T::default(), Some(reset_slot::<T>))
    }

    /// Adds an input slot: a slot without a producing module, written by the embedding
    /// process (perception, localization, sensors) and retained across ticks.
    pub(crate) fn register_input<T: DataType>(&mut self, initial: T) -> Result<()> {
        self.insert_slot::<T>(initial, None)
    }

    fn insert_slot<T: DataType>(&mut self, value: T, reset: Option<fn(&mut Erased)>) -> Result<()> {
        let slot = Slot {
            value: Arc::new(RwLock::new(value)),
            reset,
        };
        if self.slots.insert(TypeId::of::<T>(), slot).is_some() {
            return Err(miette!(
                "slot `{}` is registered twice; every slot has exactly one producer",
                std::any::type_name::<T>()
            ));
        }
        Ok(())
    }

    /// Read access to the slot of type `T`.
    pub fn get<T: DataType>(&self) -> Result<Handle<'_, T>> {
        let slot = self.slot::<T>()?;
        Ok(Handle {
            guard: slot.value.read().expect("slot lock poisoned"),
            _marker: PhantomData,
        })
    }

    /// Write access to the slot of type `T`.
    pub fn get_mut<T: DataType>(&self) -> Result<HandleMut<'_, T>> {
        let slot = self.slot::<T>()?;
        Ok(HandleMut {
            guard: slot.value.write().expect("slot lock poisoned"),
            _marker: PhantomData,
        })
    }

    /// Resets every production slot to its invalid state. Input slots are left alone.
    pub(crate) fn reset_productions(&self) {
        for slot in self.slots.values() {
            if let Some(reset) = slot.reset {
                reset(&mut *slot.value.write().expect("slot lock poisoned"));
            }
        }
    }

    fn slot<T: DataType>(&self) -> Result<&Slot> {
        self.slots.get(&TypeId::of::<T>()).ok_or_else(|| {
            miette!(
                "no slot of type `{}` is registered",
                std::any::type_name::<T>()
            )
        })
    }
}

/// Immutable access to a database slot.
pub struct Handle<'a, T: DataType> {
    guard: RwLockReadGuard<'a, Erased>,
    _marker: PhantomData<T>,
}

impl<T: DataType> Deref for Handle<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.guard
            .downcast_ref::<T>()
            .expect("slot type changed under us")
    }
}

/// Mutable access to a database slot.
pub struct HandleMut<'a, T: DataType> {
    guard: RwLockWriteGuard<'a, Erased>,
    _marker: PhantomData<T>,
}

impl<T: DataType> Deref for HandleMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.guard
            .downcast_ref::<T>()
            .expect("slot type changed under us")
    }
}

impl<T: DataType> DerefMut for HandleMut<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.guard
            .downcast_mut::<T>()
            .expect("slot type changed under us")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Production {
        valid: bool,
        counter: u32,
    }

    impl DataType for Production {
        fn reset(&mut self) {
            self.valid = false;
        }
    }

    #[derive(Default)]
    struct Input(u32);

    impl DataType for Input {}

    #[test]
    fn productions_reset_but_inputs_are_retained() -> Result<()> {
        let mut database = Database::new();
        database.register_production::<Production>()?;
        database.register_input(Input(7))?;

        {
            let mut production = database.get_mut::<Production>()?;
            production.valid = true;
            production.counter = 3;
        }

        database.reset_productions();

        let production = database.get::<Production>()?;
        assert!(!production.valid);
        // only the per-tick part is cleared
        assert_eq!(production.counter, 3);
        assert_eq!(database.get::<Input>()?.0, 7);

        Ok(())
    }

    #[test]
    fn duplicate_slot_is_rejected() -> Result<()> {
        let mut database = Database::new();
        database.register_production::<Production>()?;
        assert!(database.register_production::<Production>().is_err());

        Ok(())
    }

    #[test]
    fn missing_slot_is_an_error() {
        let database = Database::new();
        assert!(database.get::<Input>().is_err());
    }
}
