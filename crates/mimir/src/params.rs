use std::sync::{Arc, Mutex};

/// Staging area for parameter updates.
///
/// Other threads (a debug tool, a config watcher) stage `(module name, value)` pairs at
/// any time; the scheduler drains the store between ticks and hands each value to the
/// owning module's `reload`, so no parameter ever changes mid-cycle.
#[derive(Clone, Default)]
pub struct ParameterStore {
    staged: Arc<Mutex<Vec<(String, toml::Value)>>>,
}

impl ParameterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a parameter update for the module with the given name.
    pub fn stage(&self, module: impl Into<String>, parameters: toml::Value) {
        self.staged
            .lock()
            .expect("parameter store lock poisoned")
            .push((module.into(), parameters));
    }

    pub(crate) fn drain(&self) -> Vec<(String, toml::Value)> {
        std::mem::take(&mut *self.staged.lock().expect("parameter store lock poisoned"))
    }
}
