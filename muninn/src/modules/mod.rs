//! The per-cycle modules of the brain.

pub mod behavior;
pub mod bishop_position;
pub mod cycle_info;
pub mod defending_position;
pub mod game_controller;
pub mod keeper_action;
pub mod loser_position;
pub mod obstacle_filter;
pub mod penalty_striker;
pub mod playing_role;
pub mod point_of_interests;
pub mod replacement_keeper;
pub mod search_map_manager;
pub mod searcher_position;
pub mod set_play_striker;
pub mod set_position;
pub mod spl_receiver;
pub mod spl_transmitter;
pub mod striker_action;
pub mod supporting_position;
pub mod team_ball_filter;
pub mod team_obstacle_filter;
pub mod time_to_reach_ball;
pub mod world_state;

use miette::{miette, Result};
use serde::de::DeserializeOwned;

/// Deserializes staged module parameters from a TOML value.
pub(crate) fn parse_parameters<T: DeserializeOwned>(value: &toml::Value) -> Result<T> {
    value
        .clone()
        .try_into()
        .map_err(|e| miette!("invalid parameters: {e}"))
}
