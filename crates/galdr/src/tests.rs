use serde::{Deserialize, Serialize};

use crate::{Config, ErrorKind};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Net {
    port: u16,
    broadcast: bool,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Example {
    player_number: u8,
    team_number: u8,
    net: Net,
}

impl Config for Example {
    const PATH: &'static str = "example.toml";
}

fn write_config(dir: &std::path::Path, contents: &str) {
    std::fs::write(dir.join(Example::PATH), contents).unwrap();
}

fn main_dir() -> tempdir::TempDir {
    let dir = tempdir::TempDir::new();
    write_config(
        dir.path(),
        r#"
            player_number = 2
            team_number = 8

            [net]
            port = 10008
            broadcast = true
        "#,
    );
    dir
}

#[test]
fn load_without_overlay() {
    let dir = main_dir();

    let config = Example::load(dir.path()).unwrap();
    assert_eq!(config.player_number, 2);
    assert_eq!(config.net.port, 10008);
}

#[test]
fn overlay_replaces_values_recursively() {
    let dir = main_dir();
    let overlay = tempdir::TempDir::new();
    write_config(
        overlay.path(),
        r#"
            player_number = 5

            [net]
            port = 10024
        "#,
    );

    let config = Example::load_with_overlay(dir.path(), overlay.path()).unwrap();
    assert_eq!(config.player_number, 5);
    assert_eq!(config.team_number, 8);
    assert_eq!(config.net.port, 10024);
    assert!(config.net.broadcast);
}

#[test]
fn extra_overlay_key_is_rejected() {
    let dir = main_dir();
    let overlay = tempdir::TempDir::new();
    write_config(overlay.path(), "plaer_number = 5\n");

    let error = Example::load_with_overlay(dir.path(), overlay.path()).unwrap_err();
    assert!(matches!(error.kind, ErrorKind::ExtraKey { .. }));
}

#[test]
fn overlay_type_mismatch_is_rejected() {
    let dir = main_dir();
    let overlay = tempdir::TempDir::new();
    write_config(overlay.path(), "player_number = \"five\"\n");

    let error = Example::load_with_overlay(dir.path(), overlay.path()).unwrap_err();
    assert!(matches!(error.kind, ErrorKind::TypeMismatch { .. }));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir::TempDir::new();

    let error = Example::load(dir.path()).unwrap_err();
    assert!(matches!(error.kind, ErrorKind::ReadIo { .. }));
}

/// Minimal scoped temp directory so the tests do not need an extra dependency.
mod tempdir {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    pub struct TempDir {
        path: PathBuf,
    }

    impl TempDir {
        pub fn new() -> Self {
            let path = std::env::temp_dir().join(format!(
                "galdr-test-{}-{}",
                std::process::id(),
                COUNTER.fetch_add(1, Ordering::Relaxed)
            ));
            std::fs::create_dir_all(&path).unwrap();
            Self { path }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
