//! The behavior units: small functions from the [`DataSet`](super::DataSet) to an
//! [`ActionCommand`](crate::data::ActionCommand), composed into the root behavior tree.

mod game_states;
mod head;
mod roles;
mod root;
mod skills;

pub use root::root_behavior;

pub(crate) use game_states::{finished, initial, penalty_shootout, playing, ready, set};
pub(crate) use head::{active_vision, look_around, track_ball};
pub(crate) use roles::{
    bishop, defender, keeper, loser, replacement_keeper, searcher, striker, support_striker,
};
pub(crate) use skills::{search_for_ball, walk_to_ball_and_kick, walk_to_pose};
