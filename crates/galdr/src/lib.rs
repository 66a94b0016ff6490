//! Galdr defines configuration structs loaded from TOML files, with an optional overlay
//! (per-robot or per-field values) merged over the main document. Merging is strict: a key
//! that only exists in the overlay, or a value whose type differs between the documents,
//! is an error rather than a silent surprise.

use std::{
    any::type_name,
    fs::read_to_string,
    path::Path,
};

use miette::Diagnostic;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use toml::{Table, Value};

mod error {
    use super::{Diagnostic, Error as ThisError, Value};

    /// Error kinds that can occur when loading configs.
    #[derive(Debug, ThisError, Diagnostic)]
    pub enum ErrorKind {
        #[error("key `{key}` exists in the overlay but not in the main config")]
        ExtraKey { key: String, value: Value },
        #[error("value type differs between main config and overlay for key `{key}`")]
        TypeMismatch {
            key: String,
            main_value: Value,
            overlay_value: Value,
        },
        #[error("failed to read config from `{path}`")]
        ReadIo {
            path: String,
            source: std::io::Error,
        },
        #[error("failed to store config at `{path}`")]
        StoreIo {
            path: String,
            source: std::io::Error,
        },
        #[error("failed to parse toml")]
        Parse(#[from] toml::de::Error),
        #[error("failed to serialize toml")]
        Serialize(#[from] toml::ser::Error),
        #[error("invalid subtable `{key}` in overlay")]
        Subtable {
            key: String,
            source: Box<ErrorKind>,
        },
    }

    /// Error type for a config, naming the config that failed.
    #[derive(Debug, ThisError, Diagnostic)]
    #[error("config `{name}` failed")]
    pub struct Error {
        pub name: &'static str,
        #[source]
        pub kind: ErrorKind,
    }
}

pub use error::{Error, ErrorKind};

/// Result type that returns a galdr [`struct@Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A configuration document loadable from TOML.
pub trait Config: DeserializeOwned + Serialize {
    /// The file path relative to the configuration directory.
    const PATH: &'static str;

    /// The name of the configuration, used in error reports.
    #[must_use]
    fn name() -> &'static str {
        type_name::<Self>()
    }

    /// Loads the configuration from `dir`, without an overlay.
    fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let table = load_table::<Self>(&dir.as_ref().join(Self::PATH))?;
        table
            .try_into()
            .map_err(|e| fail::<Self>(ErrorKind::Parse(e)))
    }

    /// Loads the configuration from `dir` and merges the overlay document found under
    /// `overlay_dir` over it.
    fn load_with_overlay(dir: impl AsRef<Path>, overlay_dir: impl AsRef<Path>) -> Result<Self> {
        let mut main = load_table::<Self>(&dir.as_ref().join(Self::PATH))?;
        let overlay = load_table::<Self>(&overlay_dir.as_ref().join(Self::PATH))?;

        merge_tables::<Self>(&mut main, overlay)?;

        main.try_into()
            .map_err(|e| fail::<Self>(ErrorKind::Parse(e)))
    }

    /// Stores the configuration as pretty TOML at `path`.
    fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let rendered =
            toml::to_string_pretty(self).map_err(|e| fail::<Self>(ErrorKind::Serialize(e)))?;

        std::fs::write(path.as_ref(), rendered).map_err(|e| {
            fail::<Self>(ErrorKind::StoreIo {
                path: path.as_ref().display().to_string(),
                source: e,
            })
        })
    }
}

fn fail<T: Config>(kind: ErrorKind) -> Error {
    Error {
        name: T::name(),
        kind,
    }
}

fn load_table<T: Config>(path: &Path) -> Result<Table> {
    read_to_string(path)
        .map_err(|e| {
            fail::<T>(ErrorKind::ReadIo {
                path: path.display().to_string(),
                source: e,
            })
        })?
        .parse()
        .map_err(|e| fail::<T>(ErrorKind::Parse(e)))
}

/// Merges `overlay` into `main`, recursively for tables, replacing scalar values.
fn merge_tables<T: Config>(main: &mut Table, overlay: Table) -> Result<()> {
    for (key, overlay_value) in overlay {
        let Some(main_value) = main.get_mut(&key) else {
            // a key the main config does not know is almost always a typo in the overlay
            return Err(fail::<T>(ErrorKind::ExtraKey {
                key,
                value: overlay_value,
            }));
        };

        if std::mem::discriminant(main_value) != std::mem::discriminant(&overlay_value) {
            return Err(fail::<T>(ErrorKind::TypeMismatch {
                key,
                main_value: main_value.clone(),
                overlay_value,
            }));
        }

        match (main_value, overlay_value) {
            (Value::Table(main_table), Value::Table(overlay_table)) => {
                merge_tables::<T>(main_table, overlay_table).map_err(|e| {
                    fail::<T>(ErrorKind::Subtable {
                        key,
                        source: Box::new(e.kind),
                    })
                })?;
            }
            (main_value, overlay_value) => *main_value = overlay_value,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
