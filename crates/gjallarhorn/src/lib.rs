//! Gjallarhorn is the wire protocol plane for robot soccer in the Standard Platform League:
//! the referee (GameController) datagram layouts, the SPL standard team message, and the
//! byte codec both are built on.

pub mod game_controller;
pub mod serialization;
pub mod team_message;

mod error;
pub use error::{Error, Result};
