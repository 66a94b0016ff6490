use std::time::Instant;

use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::{Point2, Vector2};

use crate::config::{PlayerConfig, TeamBallConfig};
use crate::data::game_state::{GamePhase, GameState, Penalty};
use crate::data::{
    BallState, BallType, CycleInfo, FieldDimensions, GameControllerState, RobotPosition,
    TeamBallModel, TeamPlayers,
};
use crate::math::Pose;

/// One buffered ball sighting, field coordinates.
#[derive(Clone, Copy, Debug)]
struct BufferedBall {
    player_number: u8,
    position: Point2<f32>,
    velocity: Vector2<f32>,
    /// Distance from the observer to the ball when it was seen.
    distance: f32,
    timestamp: Instant,
}

/// Builds the team-agreed ball belief: buffers admissible sightings from all players,
/// clusters them by compatibility distance and selects the best cluster.
pub struct TeamBallFilter {
    config: TeamBallConfig,
    player: PlayerConfig,
    ball_buffer: Vec<BufferedBall>,
}

impl TeamBallFilter {
    #[must_use]
    pub fn new(config: TeamBallConfig, player: PlayerConfig) -> Self {
        Self {
            config,
            player,
            ball_buffer: Vec::new(),
        }
    }

    fn add_ball_to_buffer(
        &mut self,
        player_number: u8,
        pose: &Pose,
        rel_ball_position: Point2<f32>,
        rel_ball_velocity: Vector2<f32>,
        timestamp: Instant,
    ) {
        let position = pose.robot_to_field(rel_ball_position);
        let velocity = pose.rotate_to_field(rel_ball_velocity);
        let distance = rel_ball_position.coords.norm();

        if let Some(ball) = self
            .ball_buffer
            .iter_mut()
            .find(|ball| ball.player_number == player_number)
        {
            ball.position = position;
            ball.velocity = velocity;
            ball.distance = distance;
            ball.timestamp = timestamp;
        } else {
            self.ball_buffer.push(BufferedBall {
                player_number,
                position,
                velocity,
                distance,
                timestamp,
            });
        }
    }

    fn update_ball_buffer(
        &mut self,
        cycle_info: &CycleInfo,
        ball_state: &BallState,
        robot: &RobotPosition,
        team_players: &TeamPlayers,
    ) {
        for player in &team_players.players {
            if !player.is_pose_valid
                || player.penalized
                || cycle_info.age(player.time_when_ball_was_seen) > self.config.max_add_age
                || player.ball_velocity.norm() > self.config.max_ball_velocity
                || cycle_info.age(player.timestamp_last_jumped)
                    < self.config.min_wait_after_jump_to_add_ball
            {
                continue;
            }
            self.add_ball_to_buffer(
                player.player_number,
                &player.pose,
                player.ball_position,
                player.ball_velocity,
                player.time_when_ball_was_seen,
            );
        }

        if ball_state.found && ball_state.confident {
            self.add_ball_to_buffer(
                self.player.player_number,
                &robot.pose,
                ball_state.position,
                ball_state.velocity,
                ball_state.time_when_last_seen,
            );
        } else {
            // drop the own sighting as soon as it is no longer confident
            self.ball_buffer
                .retain(|ball| ball.player_number != self.player.player_number);
        }

        let min_remove_age = self.config.min_remove_age;
        self.ball_buffer
            .retain(|ball| cycle_info.age(ball.timestamp) <= min_remove_age);
    }

    /// Selects the best cluster by (size, contains own ball, closest observer distance).
    fn best_cluster(&self) -> Vec<&BufferedBall> {
        let mut best: Vec<&BufferedBall> = Vec::new();
        let mut best_contains_own = false;
        let mut best_closest_distance = f32::MAX;

        for ball in &self.ball_buffer {
            let mut cluster = vec![ball];
            let mut contains_own = ball.player_number == self.player.player_number;
            let mut closest_distance = ball.distance;

            for other in &self.ball_buffer {
                if ball.player_number == other.player_number {
                    continue;
                }
                if (ball.position - other.position).norm() < self.config.max_compatibility_distance
                {
                    if other.distance < closest_distance {
                        closest_distance = other.distance;
                    }
                    cluster.push(other);
                    contains_own |= other.player_number == self.player.player_number;
                }
            }

            if cluster.len() > best.len()
                || (cluster.len() == best.len()
                    && (contains_own
                        || (!best_contains_own && closest_distance < best_closest_distance)))
            {
                best = cluster;
                best_contains_own = contains_own;
                best_closest_distance = closest_distance;
            }
        }

        best
    }
}

impl Module for TeamBallFilter {
    fn name(&self) -> &'static str {
        "team_ball_filter"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BallState>(),
            SlotInfo::of::<CycleInfo>(),
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<TeamPlayers>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<TeamBallModel>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<TeamBallModel>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let ball_state = database.get::<BallState>()?;
        let cycle_info = database.get::<CycleInfo>()?;
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let robot = database.get::<RobotPosition>()?;
        let team_players = database.get::<TeamPlayers>()?;
        let mut team_ball = database.get_mut::<TeamBallModel>()?;

        let in_active_state = matches!(
            game.game_state,
            GameState::Playing | GameState::Ready | GameState::Set
        );
        if !in_active_state || game.penalty != Penalty::None {
            self.ball_buffer.clear();
            return Ok(());
        }

        // in READY no balls are accepted; a ball on the kickoff spot is anticipated below
        if game.game_state == GameState::Ready {
            self.ball_buffer.clear();
        } else {
            self.update_ball_buffer(&cycle_info, &ball_state, &robot, &team_players);

            let best_cluster = self.best_cluster();
            team_ball.seen = !self.ball_buffer.is_empty();
            team_ball.found = best_cluster.len() as f32 > 0.5 * self.ball_buffer.len() as f32;

            // balls not seen by ourselves are only usable if we know where we are
            if robot.valid && (team_ball.found || (team_ball.seen && !ball_state.found)) {
                let mut min_distance = f32::MAX;
                for ball in best_cluster {
                    if ball.player_number == self.player.player_number {
                        team_ball.position = ball.position;
                        team_ball.velocity = ball.velocity;
                        team_ball.ball_type = BallType::Self_;
                        break;
                    } else if ball.distance < min_distance {
                        min_distance = ball.distance;
                        team_ball.position = ball.position;
                        team_ball.velocity = ball.velocity;
                        team_ball.ball_type = BallType::Team;
                    }
                }
                debug_assert!(team_ball.ball_type != BallType::None);
            } else if ball_state.found {
                team_ball.position = robot.pose.robot_to_field(ball_state.position);
                team_ball.velocity = robot.pose.rotate_to_field(ball_state.velocity);
                team_ball.ball_type = BallType::Self_;
            }
        }

        if (game.game_state == GameState::Set && team_ball.ball_type == BallType::None)
            || game.game_state == GameState::Ready
        {
            team_ball.ball_type = BallType::Rule;
            team_ball.inside_field = true;
            team_ball.seen = false;
            team_ball.found = false;
            if game.game_phase == GamePhase::PenaltyShoot {
                let sign = if game.kicking_team { 1.0 } else { -1.0 };
                team_ball.position = Point2::new(
                    (field.field_length * 0.5 - field.penalty_marker_distance) * sign,
                    0.0,
                );
            } else {
                team_ball.position = Point2::origin();
            }
            team_ball.velocity = Vector2::zeros();
        } else {
            team_ball.inside_field = team_ball.ball_type == BallType::None
                || field.is_inside_field(team_ball.position, self.config.inside_field_tolerance);
        }

        if team_ball.ball_type != BallType::None {
            team_ball.time_last_updated = cycle_info.start_time;
        }
        team_ball.rel_position = robot.pose.field_to_robot(team_ball.position);

        Ok(())
    }

    fn reload(&mut self, parameters: &toml::Value) -> Result<()> {
        self.config = super::parse_parameters(parameters)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mimir::{App, Brain};

    use crate::data::TeamPlayer;

    fn build_brain(
        game: GameControllerState,
        ball: BallState,
        robot: RobotPosition,
        players: Vec<TeamPlayer>,
    ) -> Brain {
        let mut brain = App::new()
            .add_input(CycleInfo::default())
            .unwrap()
            .add_input(FieldDimensions::default())
            .unwrap()
            .add_input(game)
            .unwrap()
            .add_input(ball)
            .unwrap()
            .add_input(robot)
            .unwrap()
            .add_input(TeamPlayers {
                players,
                active_player_count: 1,
            })
            .unwrap()
            .add_module(TeamBallFilter::new(
                TeamBallConfig::default(),
                PlayerConfig {
                    player_number: 2,
                    team_number: 8,
                },
            ))
            .unwrap()
            .build()
            .unwrap();
        brain.tick().unwrap();
        brain
    }

    fn playing() -> GameControllerState {
        GameControllerState {
            game_state: GameState::Playing,
            ..Default::default()
        }
    }

    fn confident_ball(position: Point2<f32>) -> BallState {
        BallState {
            position,
            found: true,
            confident: true,
            age: std::time::Duration::from_millis(50),
            time_when_last_seen: Instant::now(),
            ..Default::default()
        }
    }

    fn valid_robot() -> RobotPosition {
        RobotPosition {
            valid: true,
            last_time_jumped: Instant::now() - std::time::Duration::from_secs(60),
            ..Default::default()
        }
    }

    fn teammate_seeing_ball(number: u8, pose: Pose, rel_ball: Point2<f32>) -> TeamPlayer {
        let mut player = TeamPlayer::at_pose(number, pose);
        player.ball_position = rel_ball;
        player.time_when_ball_was_seen = Instant::now();
        player.timestamp_last_jumped = Instant::now() - std::time::Duration::from_secs(60);
        player
    }

    #[test]
    fn single_robot_with_confident_ball_yields_self_ball() {
        // boundary scenario: own ball at (1, 0), no teammates, PLAYING
        let brain = build_brain(
            playing(),
            confident_ball(Point2::new(1.0, 0.0)),
            valid_robot(),
            Vec::new(),
        );
        let team_ball = brain.database().get::<TeamBallModel>().unwrap();

        assert_eq!(team_ball.ball_type, BallType::Self_);
        assert!(team_ball.seen);
        assert!(team_ball.found);
        assert!(team_ball.inside_field);
        assert_relative_eq!(team_ball.position.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(team_ball.position.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn own_ball_wins_within_the_best_cluster() {
        // the teammate sees the same ball from farther away; the own sighting is selected
        let teammate = teammate_seeing_ball(
            3,
            Pose::new(Point2::new(-2.0, 0.0), 0.0),
            Point2::new(3.2, 0.1),
        );
        let brain = build_brain(
            playing(),
            confident_ball(Point2::new(1.0, 0.0)),
            valid_robot(),
            vec![teammate],
        );
        let team_ball = brain.database().get::<TeamBallModel>().unwrap();

        assert_eq!(team_ball.ball_type, BallType::Self_);
        assert!(team_ball.found);
    }

    #[test]
    fn teammate_ball_is_adopted_when_own_ball_is_missing() {
        let teammate = teammate_seeing_ball(
            3,
            Pose::new(Point2::new(1.0, 1.0), 0.0),
            Point2::new(1.0, 0.0),
        );
        let brain = build_brain(playing(), BallState::default(), valid_robot(), vec![teammate]);
        let team_ball = brain.database().get::<TeamBallModel>().unwrap();

        assert_eq!(team_ball.ball_type, BallType::Team);
        assert_relative_eq!(team_ball.position.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(team_ball.position.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn penalized_teammates_do_not_contribute() {
        let mut teammate = teammate_seeing_ball(
            3,
            Pose::new(Point2::new(1.0, 1.0), 0.0),
            Point2::new(1.0, 0.0),
        );
        teammate.penalized = true;
        let brain = build_brain(playing(), BallState::default(), valid_robot(), vec![teammate]);
        let team_ball = brain.database().get::<TeamBallModel>().unwrap();

        assert_eq!(team_ball.ball_type, BallType::None);
        assert!(!team_ball.seen);
    }

    #[test]
    fn ready_yields_the_rule_ball_on_the_kickoff_spot() {
        let game = GameControllerState {
            game_state: GameState::Ready,
            ..Default::default()
        };
        let brain = build_brain(
            game,
            confident_ball(Point2::new(1.0, 0.0)),
            valid_robot(),
            Vec::new(),
        );
        let team_ball = brain.database().get::<TeamBallModel>().unwrap();

        assert_eq!(team_ball.ball_type, BallType::Rule);
        assert!(!team_ball.seen);
        assert_relative_eq!(team_ball.position.x, 0.0);
    }

    #[test]
    fn penalty_shootout_set_anticipates_the_penalty_spot() {
        let game = GameControllerState {
            game_state: GameState::Set,
            game_phase: GamePhase::PenaltyShoot,
            kicking_team: true,
            ..Default::default()
        };
        let brain = build_brain(game, BallState::default(), valid_robot(), Vec::new());
        let team_ball = brain.database().get::<TeamBallModel>().unwrap();

        assert_eq!(team_ball.ball_type, BallType::Rule);
        assert_relative_eq!(team_ball.position.x, 4.5 - 1.3, epsilon = 1e-5);
    }

    #[test]
    fn ball_far_outside_the_field_is_flagged() {
        let brain = build_brain(
            playing(),
            confident_ball(Point2::new(5.2, 0.0)),
            valid_robot(),
            Vec::new(),
        );
        let team_ball = brain.database().get::<TeamBallModel>().unwrap();

        assert_eq!(team_ball.ball_type, BallType::Self_);
        assert!(!team_ball.inside_field);
    }
}
