//! The configuration surface of the brain.
//!
//! One TOML document (`brain.toml`) with a section per module, loaded through
//! [`galdr::Config`] with an optional per-robot overlay. Values that are durations are
//! written in milliseconds, angles in degrees (converted to radians where the modules
//! need them). Fatal validation happens in [`BrainConfig::validate`]; a brain with an
//! invalid configuration refuses to start.

use std::time::Duration;

use miette::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};

use crate::data::FieldDimensions;

/// Identity of this robot in the team.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Player number, starts with 1. Player 1 is the keeper.
    pub player_number: u8,
    /// The team number as registered with the league.
    pub team_number: u8,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            player_number: 2,
            team_number: 8,
        }
    }
}

/// Tick loop settings.
#[serde_as]
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TickConfig {
    /// The tick period of the brain.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub period: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(10),
        }
    }
}

/// GameController client settings.
#[serde_as]
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameControllerConfig {
    /// After this long without referee datagrams the client falls back to buttons and
    /// forgets the referee endpoint.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub network_timeout: Duration,
    /// Minimum delay between return messages to the referee.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub return_delay: Duration,
    /// Whether a triple head-button hold in INITIAL forces the penalty shootout phase.
    pub force_penalty_shootout: bool,
}

impl Default for GameControllerConfig {
    fn default() -> Self {
        Self {
            network_timeout: Duration::from_millis(5000),
            return_delay: Duration::from_millis(500),
            force_penalty_shootout: false,
        }
    }
}

/// Team radio settings.
#[serde_as]
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplNetworkConfig {
    /// Outgoing frames per second at most.
    pub msg_per_second: f32,
    /// A teammate whose last valid frame is older than this is dropped from the table.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub teammate_timeout: Duration,
    /// Whether hearing the own player number from another robot queues an audio warning.
    pub enable_player_number_warning: bool,
    /// Whether sonar-only obstacles are shared with the team.
    pub send_sonar_obstacles: bool,
    /// How often an NTP request is broadcast.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub ntp_request_interval: Duration,
}

impl Default for SplNetworkConfig {
    fn default() -> Self {
        Self {
            msg_per_second: 0.5,
            teammate_timeout: Duration::from_millis(3000),
            enable_player_number_warning: true,
            send_sonar_obstacles: false,
            ntp_request_interval: Duration::from_millis(2000),
        }
    }
}

/// Team ball consensus settings.
#[serde_as]
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TeamBallConfig {
    /// A ball sighting older than this is not admitted into the buffer.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max_add_age: Duration,
    /// Minimum time since the observer's last localization jump.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub min_wait_after_jump_to_add_ball: Duration,
    /// A ball faster than this is not admitted, meters per second.
    pub max_ball_velocity: f32,
    /// A buffered sighting older than this is evicted.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub min_remove_age: Duration,
    /// Two sightings closer than this are considered the same ball, meters.
    pub max_compatibility_distance: f32,
    /// Tolerance for the inside-field check, meters.
    pub inside_field_tolerance: f32,
}

impl Default for TeamBallConfig {
    fn default() -> Self {
        Self {
            max_add_age: Duration::from_millis(2000),
            min_wait_after_jump_to_add_ball: Duration::from_millis(1000),
            max_ball_velocity: 2.0,
            min_remove_age: Duration::from_millis(4000),
            max_compatibility_distance: 1.0,
            inside_field_tolerance: 0.25,
        }
    }
}

/// Ball-search map settings.
#[serde_as]
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchMapConfig {
    /// Multiplier applied to a cell a fresh ball was seen in.
    pub confident_ball_multiplier: f32,
    /// Core weight of the 3x3 smoothing kernel. Must be positive.
    pub convolution_kernel_core_weight: f32,
    /// Horizontal field of view of the camera, degrees.
    pub fov_angle: f32,
    /// A ball older than this no longer upvotes its cell.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max_ball_age: Duration,
    /// Distance up to which a robot can be expected to detect a ball, meters.
    pub max_ball_detection_range: f32,
    /// How far beyond the side line the ball must be to count as out, meters.
    pub min_ball_out_distance: f32,
    /// Floor for the probability of an upvoted cell.
    pub min_prob_on_upvote: f32,
}

impl Default for SearchMapConfig {
    fn default() -> Self {
        Self {
            confident_ball_multiplier: 10.0,
            convolution_kernel_core_weight: 20.0,
            fov_angle: 60.0,
            max_ball_age: Duration::from_millis(1000),
            max_ball_detection_range: 3.0,
            min_ball_out_distance: 0.1,
            min_prob_on_upvote: 0.2,
        }
    }
}

/// Searcher position settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearcherConfig {
    /// Closer than this a ball cannot be detected (it disappears under the chin), meters.
    pub min_ball_detection_range: f32,
    /// Same bound as in [`SearchMapConfig`], used for the stand-off distance.
    pub max_ball_detection_range: f32,
    /// Cap for the age contribution to a cell's exploration value, in cycles.
    pub max_age_value_contribution: f32,
    /// Weight of the probability in a cell's exploration value.
    pub probability_weight: f32,
    /// Voronoi seeds per searcher count: `voronoi_seeds[n - 1]` holds the n seeds used
    /// when n robots search. Field coordinates, meters.
    pub voronoi_seeds: Vec<Vec<[f32; 2]>>,
}

impl Default for SearcherConfig {
    fn default() -> Self {
        Self {
            min_ball_detection_range: 0.4,
            max_ball_detection_range: 3.0,
            max_age_value_contribution: 600.0,
            probability_weight: 300.0,
            voronoi_seeds: vec![
                vec![[0.0, 0.0]],
                vec![[-2.25, 0.0], [2.25, 0.0]],
                vec![[-2.25, 0.0], [2.25, 1.5], [2.25, -1.5]],
                vec![[-2.25, 1.5], [-2.25, -1.5], [2.25, 1.5], [2.25, -1.5]],
                vec![
                    [-2.25, 1.5],
                    [-2.25, -1.5],
                    [0.0, 0.0],
                    [2.25, 1.5],
                    [2.25, -1.5],
                ],
            ],
        }
    }
}

/// Role election settings.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RolesConfig {
    /// Whether the own role is overwritten by the lowest-numbered teammate's election.
    pub use_team_role: bool,
    /// Whether the bishop role is assigned at all.
    pub assign_bishop: bool,
    /// Whether a bishop is assigned with fewer than four field players.
    pub assign_bishop_with_less_than_four_field_players: bool,
    /// Whether player 1 may win the striker election.
    pub player_one_can_become_striker: bool,
    /// Beyond this distance from the own goal player 1 is considered far away and a
    /// replacement keeper is assigned, meters.
    pub player_one_distance_threshold: f32,
    /// Added to the keeper's time-to-reach-ball bid while it is in its goal.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub keeper_time_to_reach_ball_penalty: Duration,
    /// Within this distance of the own goal the keeper penalty applies, meters.
    pub keeper_in_goal_distance_threshold: f32,
    /// Whether a confident own ball may elevate this robot to striker when the team has
    /// no consensus.
    pub strike_own_ball: bool,
    /// Whether a robot that just elected itself striker may ignore the team role.
    pub allow_fast_role_override: bool,
    /// How long such a revolution may last.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max_fast_role_override_duration: Duration,
    /// Forced role from configuration, `"none"` to disable.
    pub force_role: String,
    /// After this long without a team ball the search switches from short to long term.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub short_term_ball_search_duration: Duration,
    /// For this long after losing the ball the last striker becomes the loser.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub loser_duration: Duration,
    /// Hysteresis for the far-away and in-goal distance decisions, meters.
    pub distance_hysteresis: f32,
    /// Stickiness offsets applied to the x coordinate before the front-to-back role
    /// assignment, meters.
    pub defender_stickiness_offset: f32,
    pub supporter_stickiness_offset: f32,
    pub bishop_stickiness_offset: f32,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            use_team_role: true,
            assign_bishop: true,
            assign_bishop_with_less_than_four_field_players: false,
            player_one_can_become_striker: false,
            player_one_distance_threshold: 1.5,
            keeper_time_to_reach_ball_penalty: Duration::from_millis(3000),
            keeper_in_goal_distance_threshold: 2.0,
            strike_own_ball: true,
            allow_fast_role_override: true,
            max_fast_role_override_duration: Duration::from_millis(5000),
            force_role: "none".to_string(),
            short_term_ball_search_duration: Duration::from_millis(2000),
            loser_duration: Duration::from_millis(3000),
            distance_hysteresis: 0.25,
            defender_stickiness_offset: -0.2,
            supporter_stickiness_offset: 0.2,
            bishop_stickiness_offset: 0.3,
        }
    }
}

/// Time-to-reach-ball estimation settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeToReachBallConfig {
    /// Walking speed, meters per second.
    pub translation_velocity: f32,
    /// Turning speed, degrees per second.
    pub rotation_velocity: f32,
    /// Speed of walking around the ball, degrees per second.
    pub walk_around_ball_velocity: f32,
    /// Added when the robot is fallen, seconds.
    pub fallen_penalty: f32,
    /// Subtracted on the striker bonus track, seconds.
    pub striker_bonus: f32,
    /// Added when the ball is not seen by this robot itself, seconds.
    pub ball_not_seen_penalty: f32,
}

impl Default for TimeToReachBallConfig {
    fn default() -> Self {
        Self {
            translation_velocity: 0.18,
            rotation_velocity: 30.0,
            walk_around_ball_velocity: 18.0,
            fallen_penalty: 5.0,
            striker_bonus: 2.0,
            ball_not_seen_penalty: 1.0,
        }
    }
}

/// Striker settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrikerConfig {
    /// Whether the striker backs off while the keeper wants to play the ball.
    pub check_if_keeper_wants_to_play_ball: bool,
    /// Whether scoring uses the kick instead of dribbling.
    pub shoot_into_goal: bool,
    /// Stand-off behind the ball for dribbling, meters.
    pub distance_to_ball_dribble: f32,
    /// Orientation tolerance for dribbling, degrees.
    pub angle_to_ball_dribble: f32,
    /// Stand-off behind the ball for kicking, meters.
    pub distance_to_ball_kick: f32,
    /// Orientation tolerance for kicking, degrees.
    pub angle_to_ball_kick: f32,
    /// Forces a foot: 1 left, -1 right, 0 free choice.
    pub use_only_this_foot: i32,
    /// Rating bonus that keeps the previous pass target attractive.
    pub last_target_bonus: f32,
}

impl Default for StrikerConfig {
    fn default() -> Self {
        Self {
            check_if_keeper_wants_to_play_ball: true,
            shoot_into_goal: true,
            distance_to_ball_dribble: 0.18,
            angle_to_ball_dribble: 10.0,
            distance_to_ball_kick: 0.2,
            angle_to_ball_kick: 5.0,
            use_only_this_foot: 0,
            last_target_bonus: 0.5,
        }
    }
}

/// Penalty striker settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PenaltyStrikerConfig {
    /// Scales how far into the corner the shot aims, in (0, 1].
    pub aim_at_corner_factor: f32,
    /// Stand-off behind the ball for the penalty kick, meters.
    pub distance_to_ball_kick: f32,
}

impl Default for PenaltyStrikerConfig {
    fn default() -> Self {
        Self {
            aim_at_corner_factor: 0.9,
            distance_to_ball_kick: 0.2,
        }
    }
}

/// Set-play striker settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetPlayStrikerConfig {
    /// Whether a free kick near the opponent goal is shot directly.
    pub enable_scoring: bool,
    /// Whether a free kick may be passed to a forward teammate.
    pub enable_passing: bool,
    /// How far in front of the opponent goal line corner kicks aim, meters.
    pub corner_kick_target_offset: f32,
    /// Stand-off behind the ball for dribbling, meters.
    pub distance_to_ball_dribble: f32,
    /// Orientation tolerance for dribbling, degrees.
    pub angle_to_ball_dribble: f32,
    /// Orientation tolerance for kicking, degrees.
    pub angle_to_ball_kick: f32,
}

impl Default for SetPlayStrikerConfig {
    fn default() -> Self {
        Self {
            enable_scoring: true,
            enable_passing: true,
            corner_kick_target_offset: 1.2,
            distance_to_ball_dribble: 0.18,
            angle_to_ball_dribble: 10.0,
            angle_to_ball_kick: 5.0,
        }
    }
}

/// Keeper settings.
#[serde_as]
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeeperConfig {
    /// A ball slower than this never triggers the squat, meters per second.
    pub genuflect_min_ball_speed: f32,
    /// The squat triggers when the ball will cross the goal line within this time.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub genuflect_time_to_impact: Duration,
    /// Whether the keeper may leave the goal to play a very close ball.
    pub may_play_ball: bool,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            genuflect_min_ball_speed: 0.5,
            genuflect_time_to_impact: Duration::from_millis(1500),
            may_play_ball: true,
        }
    }
}

/// Defender settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefenderConfig {
    /// Semi-axes of the defense ellipse around the own goal, meters.
    pub defense_radius_x: f32,
    pub defense_radius_y: f32,
    /// The defender never retreats behind this line, meters from the own goal line.
    pub passive_defense_line_x: f32,
    /// Lateral clamp of the defending position, meters.
    pub passive_defense_line_y: f32,
}

impl Default for DefenderConfig {
    fn default() -> Self {
        Self {
            defense_radius_x: 2.2,
            defense_radius_y: 1.6,
            passive_defense_line_x: 0.8,
            passive_defense_line_y: 2.0,
        }
    }
}

/// Bishop settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BishopConfig {
    /// Minimum angle between supporter-to-ball and bishop-to-ball, degrees.
    pub minimum_angle: f32,
    /// Stand-off from the ball, meters.
    pub distance_to_ball: f32,
    /// Whether the forward (aggressive) positioning is used.
    pub allow_aggressive_bishop: bool,
    /// Default aggressive position `[x, y]`; y is mirrored to the free side.
    pub default_position_offset: [f32; 2],
    /// Offset from the opponent goal line during own corner kicks.
    pub corner_kick_offset: [f32; 2],
    /// Offset from the opponent goal line while hanging around the goal.
    pub goalhanger_offset: [f32; 2],
}

impl Default for BishopConfig {
    fn default() -> Self {
        Self {
            minimum_angle: 40.0,
            distance_to_ball: 2.0,
            allow_aggressive_bishop: true,
            default_position_offset: [1.5, 2.0],
            corner_kick_offset: [-1.3, 1.1],
            goalhanger_offset: [-1.5, 1.3],
        }
    }
}

/// Support striker settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupporterConfig {
    /// Stand-off behind the ball, meters.
    pub distance_to_ball: f32,
    /// Minimum distance to the striker's kick line, meters.
    pub minimum_distance: f32,
}

impl Default for SupporterConfig {
    fn default() -> Self {
        Self {
            distance_to_ball: 1.0,
            minimum_distance: 0.5,
        }
    }
}

/// World state settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldStateConfig {
    /// Scale of the corner ellipse for the ball-in-corner check.
    pub ball_in_corner_threshold: f32,
    /// Semi-axes of the corner ellipse, meters.
    pub ball_in_corner_x_threshold: f32,
    pub ball_in_corner_y_threshold: f32,
    /// Hysteresis of all region decisions, meters.
    pub hysteresis: f32,
}

impl Default for WorldStateConfig {
    fn default() -> Self {
        Self {
            ball_in_corner_threshold: 1.0,
            ball_in_corner_x_threshold: 2.0,
            ball_in_corner_y_threshold: 1.5,
            hysteresis: 0.25,
        }
    }
}

/// Obstacle model settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObstacleConfig {
    /// Whether sonar echoes become obstacles.
    pub use_sonar: bool,
    /// Two obstacles closer than this are merged, meters.
    pub obstacle_merge_radius: f32,
    /// Whether the four goal posts are injected from the field model.
    pub goal_posts_are_obstacles: bool,
    /// Whether teammates become obstacles based on their reported pose.
    pub team_players_are_obstacles: bool,
    /// Whether obstacles reported by teammates are merged in.
    pub use_other_robots_obstacles: bool,
    /// Whether an unknown obstacle may adopt the type of a more specific one on merge.
    pub reclassify_unknown_obstacles: bool,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            use_sonar: true,
            obstacle_merge_radius: 0.5,
            goal_posts_are_obstacles: true,
            team_players_are_obstacles: true,
            use_other_robots_obstacles: true,
            reclassify_unknown_obstacles: true,
        }
    }
}

/// Behavior composer settings.
#[serde_as]
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorConfig {
    /// Whether a remotely installed action command may replace the composed behavior.
    pub use_remote_action_command: bool,
    /// The robot stands up after being fallen for this long.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub stand_up_delay: Duration,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            use_remote_action_command: false,
            stand_up_delay: Duration::from_millis(1000),
        }
    }
}

/// Walk-in target poses for READY, `[x, y, theta_degrees]` per player number.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetPositionConfig {
    /// Poses when the own team has kick-off.
    pub kickoff_positions: Vec<[f32; 3]>,
    /// Poses when the opponent has kick-off.
    pub default_positions: Vec<[f32; 3]>,
}

impl Default for SetPositionConfig {
    fn default() -> Self {
        Self {
            kickoff_positions: vec![
                [-4.25, 0.0, 0.0],
                [-0.7, 0.0, 0.0],
                [-2.0, 1.1, 0.0],
                [-1.5, -1.3, 0.0],
                [-2.8, 0.3, 0.0],
            ],
            default_positions: vec![
                [-4.25, 0.0, 0.0],
                [-1.2, 0.0, 0.0],
                [-2.4, 1.1, 0.0],
                [-2.0, -1.3, 0.0],
                [-3.2, 0.3, 0.0],
            ],
        }
    }
}

/// The whole configuration document of the brain.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrainConfig {
    pub player: PlayerConfig,
    pub tick: TickConfig,
    pub field: FieldDimensions,
    pub game_controller: GameControllerConfig,
    pub spl_network: SplNetworkConfig,
    pub team_ball: TeamBallConfig,
    pub search_map: SearchMapConfig,
    pub searcher: SearcherConfig,
    pub roles: RolesConfig,
    pub time_to_reach_ball: TimeToReachBallConfig,
    pub striker: StrikerConfig,
    pub penalty_striker: PenaltyStrikerConfig,
    pub set_play_striker: SetPlayStrikerConfig,
    pub keeper: KeeperConfig,
    pub defender: DefenderConfig,
    pub bishop: BishopConfig,
    pub supporter: SupporterConfig,
    pub world_state: WorldStateConfig,
    pub obstacles: ObstacleConfig,
    pub behavior: BehaviorConfig,
    pub set_position: SetPositionConfig,
}

impl galdr::Config for BrainConfig {
    const PATH: &'static str = "brain.toml";
}

impl BrainConfig {
    /// Checks the invariants the modules rely on. Violations are fatal at startup;
    /// playing a competition with silently defaulted values is worse than not starting.
    pub fn validate(&self) -> Result<()> {
        if self.player.player_number == 0
            || usize::from(self.player.player_number) > crate::data::MAX_PLAYERS
        {
            bail!(
                "player_number must be in 1..={}, got {}",
                crate::data::MAX_PLAYERS,
                self.player.player_number
            );
        }
        if self.search_map.convolution_kernel_core_weight <= 0.0 {
            bail!("convolution_kernel_core_weight must be positive, the kernel normalizes by it");
        }
        if self.searcher.voronoi_seeds.is_empty() {
            bail!("voronoi_seeds must hold at least one seed list");
        }
        for (index, seeds) in self.searcher.voronoi_seeds.iter().enumerate() {
            if seeds.len() != index + 1 {
                bail!(
                    "voronoi_seeds[{index}] must hold exactly {} seeds, got {}",
                    index + 1,
                    seeds.len()
                );
            }
        }
        if self.set_position.kickoff_positions.len() < 2
            || self.set_position.default_positions.len() < 2
        {
            bail!("set positions must be configured for at least two players");
        }
        if !(0.0..=1.0).contains(&self.penalty_striker.aim_at_corner_factor) {
            bail!("aim_at_corner_factor must be in [0, 1]");
        }
        const KNOWN_ROLES: [&str; 9] = [
            "none",
            "keeper",
            "defender",
            "striker",
            "supportStriker",
            "bishop",
            "replacementKeeper",
            "loser",
            "searcher",
        ];
        if !KNOWN_ROLES.contains(&self.roles.force_role.as_str()) {
            bail!("unknown forced playing role `{}`", self.roles.force_role);
        }
        if self.time_to_reach_ball.translation_velocity <= 0.0
            || self.time_to_reach_ball.rotation_velocity <= 0.0
            || self.time_to_reach_ball.walk_around_ball_velocity <= 0.0
        {
            bail!("time-to-reach-ball velocities must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        BrainConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_kernel_weight_is_fatal() {
        let mut config = BrainConfig::default();
        config.search_map.convolution_kernel_core_weight = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn seed_counts_must_match_their_index() {
        let mut config = BrainConfig::default();
        config.searcher.voronoi_seeds[2].pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let config = BrainConfig::default();
        let rendered = toml::to_string(&config).unwrap();
        let reparsed: BrainConfig = toml::from_str(&rendered).unwrap();
        reparsed.validate().unwrap();
    }
}
