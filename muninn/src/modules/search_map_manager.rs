use std::time::Duration;

use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::SearchMapConfig;
use crate::data::game_state::{GameState, Penalty, SetPlay};
use crate::data::search_map::{COLS, ROWS};
use crate::data::{
    BallSearchMap, BallState, BodyPose, CycleInfo, FieldDimensions, GameControllerState,
    JointSensorData, RobotPosition, TeamPlayers,
};
use crate::math::Pose;

const TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// A player's view as far as the map update cares: pose, head yaw and last ball.
struct Observer {
    pose: Pose,
    head_yaw: f32,
    ball_position: Point2<f32>,
    ball_age: Duration,
}

/// Maintains the grid of probabilities for where the ball might be when unseen.
///
/// Fresh ball sightings upvote their cell, looking at a cell without seeing a ball decays
/// it, a 3x3 convolution diffuses probability into neighbouring cells (never decreasing
/// any cell), and the interior is re-normalized to sum to one every tick.
pub struct BallSearchMapManager {
    config: SearchMapConfig,
    fov_angle: f32,
    max_detection_range_squared: f32,
}

impl BallSearchMapManager {
    #[must_use]
    pub fn new(config: SearchMapConfig) -> Self {
        let fov_angle = config.fov_angle * TO_RAD;
        let max_detection_range_squared =
            config.max_ball_detection_range * config.max_ball_detection_range;
        Self {
            config,
            fov_angle,
            max_detection_range_squared,
        }
    }

    fn integrate_observer(&self, map: &mut BallSearchMap, observer: &Observer) {
        // vote the cell up if there is a fresh ball in it
        if observer.ball_age < self.config.max_ball_age {
            let position = observer.pose.robot_to_field(observer.ball_position);
            let min_prob = self.config.min_prob_on_upvote;
            let multiplier = self.config.confident_ball_multiplier;
            let cell = map.cell_from_position_mut(position);
            cell.probability = (cell.probability * multiplier).max(min_prob);
            cell.age = 0;
        }

        // decay every cell the observer is looking at; the one with the ball was just
        // upvoted well above the decay
        let decay = if observer.ball_age < self.config.max_ball_age {
            0.99
        } else {
            0.98
        };
        for x in 1..COLS - 1 {
            for y in 1..ROWS - 1 {
                let cell = map.cells[x][y];
                if map.is_cell_in_fov(
                    &observer.pose,
                    observer.head_yaw,
                    &cell,
                    self.max_detection_range_squared,
                    self.fov_angle,
                ) {
                    let cell = &mut map.cells[x][y];
                    cell.probability *= decay;
                    cell.age = 0;
                }
            }
        }
    }

    fn boost_throw_in_cells(
        &self,
        map: &mut BallSearchMap,
        field: &FieldDimensions,
        absolute_ball: Point2<f32>,
    ) {
        // project the ball onto the throw-in line
        let projection = Point2::new(
            absolute_ball.x,
            absolute_ball.y.clamp(
                -field.field_width / 2.0 + field.throw_in_line_spacing,
                field.field_width / 2.0 - field.throw_in_line_spacing,
            ),
        );
        let min_prob = self.config.min_prob_on_upvote;

        // the ball is put back one meter towards the own goal, hedge in both directions
        for offset in [-1.0_f32, 1.0] {
            let x = (projection.x + offset).clamp(
                -field.throw_in_line_length / 2.0,
                field.throw_in_line_length / 2.0,
            );
            let cell = map.cell_from_position_mut(Point2::new(x, projection.y));
            cell.probability = (cell.probability * 1.1).max(min_prob);
        }
    }

    fn inject_goal_kick_prior(
        map: &mut BallSearchMap,
        field: &FieldDimensions,
        kicking_team: bool,
        last_ball_y: f32,
    ) {
        map.for_each_interior(|cell| cell.probability = 0.0);

        // the restart positions on the kicking side get most of the mass
        let side = if kicking_team { -1.0 } else { 1.0 };
        let x = side * (field.field_length / 2.0 - field.penalty_marker_distance);
        let y = (field.goal_box_area_width / 2.0).copysign(last_ball_y);

        map.cell_from_position_mut(Point2::new(x, y)).probability = 0.35;
        map.cell_from_position_mut(Point2::new(x, -y)).probability = 0.35;
        // and the mirrored half a little, in case the referee view differs from ours
        map.cell_from_position_mut(Point2::new(-x, y)).probability = 0.15;
        map.cell_from_position_mut(Point2::new(-x, -y)).probability = 0.15;
    }

    fn inject_corner_kick_prior(
        map: &mut BallSearchMap,
        field: &FieldDimensions,
        kicking_team: bool,
    ) {
        map.for_each_interior(|cell| cell.probability = 0.0);

        let side = if kicking_team { 1.0 } else { -1.0 };
        let x = side * field.field_length / 2.0;
        map.cell_from_position_mut(Point2::new(x, field.field_width / 2.0))
            .probability = 0.5;
        map.cell_from_position_mut(Point2::new(x, -field.field_width / 2.0))
            .probability = 0.5;
    }

    fn mirror_border_cells(map: &mut BallSearchMap) {
        for x in 1..COLS - 1 {
            map.cells[x][0].probability = map.cells[x][1].probability;
            map.cells[x][ROWS - 1].probability = map.cells[x][ROWS - 2].probability;
        }
        for y in 1..ROWS - 1 {
            map.cells[0][y].probability = map.cells[1][y].probability;
            map.cells[COLS - 1][y].probability = map.cells[COLS - 2][y].probability;
        }
        map.cells[0][0].probability = map.cells[1][1].probability;
        map.cells[0][ROWS - 1].probability = map.cells[1][ROWS - 2].probability;
        map.cells[COLS - 1][0].probability = map.cells[COLS - 2][1].probability;
        map.cells[COLS - 1][ROWS - 1].probability = map.cells[COLS - 2][ROWS - 2].probability;
    }

    fn convolve(&self, map: &mut BallSearchMap) {
        let core = self.config.convolution_kernel_core_weight;
        debug_assert!(core > 0.0, "kernel core weight must be positive");

        for x in 0..COLS {
            for y in 0..ROWS {
                map.cells[x][y].old_probability = map.cells[x][y].probability;
            }
        }

        let normalizer = 1.0 / (core + 8.0);
        for x in 1..COLS - 1 {
            for y in 1..ROWS - 1 {
                let convolved = (map.cells[x - 1][y - 1].old_probability
                    + map.cells[x][y - 1].old_probability
                    + map.cells[x + 1][y - 1].old_probability
                    + map.cells[x - 1][y].old_probability
                    + core * map.cells[x][y].old_probability
                    + map.cells[x + 1][y].old_probability
                    + map.cells[x - 1][y + 1].old_probability
                    + map.cells[x][y + 1].old_probability
                    + map.cells[x + 1][y + 1].old_probability)
                    * normalizer;

                // probability may only drop through FOV decay or normalization, so the
                // convolution keeps the old value where it would decrease the cell
                let cell = &mut map.cells[x][y];
                cell.probability = cell.old_probability.max(convolved);
            }
        }
    }

    fn normalize_and_age(map: &mut BallSearchMap) {
        let sum = map.interior_sum();
        debug_assert!(sum > 0.0, "probability mass vanished");
        if sum <= 0.0 {
            return;
        }
        map.for_each_interior(|cell| {
            cell.probability /= sum;
            cell.age += 1;
        });
    }

    fn reset_map_for_ready(map: &mut BallSearchMap) {
        map.for_each_interior(|cell| {
            cell.probability = 1.0 / (COLS * ROWS) as f32;
            cell.age = 0;
        });
        // the ball starts on the kickoff spot: all mass on the four center cells
        for (x, y) in [
            (COLS / 2, ROWS / 2),
            (COLS / 2 - 1, ROWS / 2),
            (COLS / 2, ROWS / 2 - 1),
            (COLS / 2 - 1, ROWS / 2 - 1),
        ] {
            map.cells[x][y].probability = 0.25;
        }
    }
}

impl Module for BallSearchMapManager {
    fn name(&self) -> &'static str {
        "ball_search_map_manager"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BallState>(),
            SlotInfo::of::<BodyPose>(),
            SlotInfo::of::<CycleInfo>(),
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<JointSensorData>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<TeamPlayers>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<BallSearchMap>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<BallSearchMap>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let ball_state = database.get::<BallState>()?;
        let body_pose = database.get::<BodyPose>()?;
        let cycle_info = database.get::<CycleInfo>()?;
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let joints = database.get::<JointSensorData>()?;
        let robot = database.get::<RobotPosition>()?;
        let team_players = database.get::<TeamPlayers>()?;
        let mut map = database.get_mut::<BallSearchMap>()?;

        map.ensure_field(field.field_length, field.field_width);

        match game.game_state {
            GameState::Playing => {
                if game.penalty != Penalty::None {
                    map.timestamp_unreliable = cycle_info.start_time;
                }

                // gather all active observers, own robot first
                let mut observers = Vec::new();
                if robot.valid && game.penalty == Penalty::None && !body_pose.fallen {
                    observers.push(Observer {
                        pose: robot.pose,
                        head_yaw: joints.head_yaw,
                        ball_position: ball_state.position,
                        ball_age: if ball_state.found {
                            cycle_info.age(ball_state.time_when_last_seen)
                        } else {
                            Duration::MAX
                        },
                    });
                }
                for player in &team_players.players {
                    if player.penalized || !player.is_pose_valid || player.fallen {
                        continue;
                    }
                    observers.push(Observer {
                        pose: player.pose,
                        head_yaw: player.head_yaw,
                        ball_position: player.ball_position,
                        ball_age: cycle_info.age(player.time_when_ball_was_seen),
                    });
                }

                for observer in &observers {
                    self.integrate_observer(&mut map, observer);
                }

                // ball left the field sideways: boost the throw-in projection
                let absolute_own_ball = robot.pose.robot_to_field(ball_state.position);
                if ball_state.found
                    && cycle_info.age(ball_state.time_when_last_seen) < Duration::from_millis(500)
                    && absolute_own_ball.y.abs()
                        > field.field_width / 2.0 + self.config.min_ball_out_distance
                {
                    self.boost_throw_in_cells(&mut map, &field, absolute_own_ball);
                }

                // a set play just started: replace the map with the restart prior
                if cycle_info.age(game.set_play_changed) < Duration::from_millis(500) {
                    match game.set_play {
                        SetPlay::GoalKick => Self::inject_goal_kick_prior(
                            &mut map,
                            &field,
                            game.kicking_team,
                            absolute_own_ball.y,
                        ),
                        SetPlay::CornerKick => {
                            Self::inject_corner_kick_prior(&mut map, &field, game.kicking_team);
                        }
                        _ => {}
                    }
                }

                Self::mirror_border_cells(&mut map);
                self.convolve(&mut map);
                Self::normalize_and_age(&mut map);
            }
            GameState::Ready => {
                map.timestamp_unreliable = cycle_info.start_time;
                Self::reset_map_for_ready(&mut map);
            }
            _ => {}
        }

        Ok(())
    }

    fn reload(&mut self, parameters: &toml::Value) -> Result<()> {
        self.config = super::parse_parameters(parameters)?;
        self.fov_angle = self.config.fov_angle * TO_RAD;
        self.max_detection_range_squared =
            self.config.max_ball_detection_range * self.config.max_ball_detection_range;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mimir::{App, Brain};
    use std::time::Instant;

    use crate::data::game_state::GameState;

    fn build_brain(game_state: GameState, ball: BallState) -> Brain {
        let game = GameControllerState {
            game_state,
            ..Default::default()
        };
        App::new()
            .add_input(CycleInfo::default())
            .unwrap()
            .add_input(FieldDimensions::default())
            .unwrap()
            .add_input(game)
            .unwrap()
            .add_input(ball)
            .unwrap()
            .add_input(BodyPose::default())
            .unwrap()
            .add_input(JointSensorData::default())
            .unwrap()
            .add_input(RobotPosition {
                valid: true,
                ..Default::default()
            })
            .unwrap()
            .add_input(TeamPlayers::default())
            .unwrap()
            .add_module(BallSearchMapManager::new(SearchMapConfig::default()))
            .unwrap()
            .build()
            .unwrap()
    }

    fn seen_ball(position: Point2<f32>) -> BallState {
        BallState {
            position,
            found: true,
            confident: true,
            age: Duration::from_millis(10),
            time_when_last_seen: Instant::now(),
            ..Default::default()
        }
    }

    #[test]
    fn interior_probabilities_sum_to_one_after_every_tick() {
        let mut brain = build_brain(GameState::Playing, seen_ball(Point2::new(1.0, 0.0)));

        for _ in 0..25 {
            brain.tick().unwrap();
            let map = brain.database().get::<BallSearchMap>().unwrap();
            assert_relative_eq!(map.interior_sum(), 1.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn fresh_ball_concentrates_probability_in_its_cell() {
        let mut brain = build_brain(GameState::Playing, seen_ball(Point2::new(2.0, 1.0)));

        for _ in 0..10 {
            brain.tick().unwrap();
        }

        let map = brain.database().get::<BallSearchMap>().unwrap();
        let ball_cell = map.cell_from_position(Point2::new(2.0, 1.0));
        let far_cell = map.cell_from_position(Point2::new(-4.0, -2.5));
        assert!(ball_cell.probability > 10.0 * far_cell.probability);
        assert_eq!(ball_cell.age, 1);
    }

    #[test]
    fn convolution_never_decreases_before_normalization() {
        let mut map = BallSearchMap::default();
        map.cell_from_position_mut(Point2::new(0.0, 0.0)).probability = 0.5;

        let manager = BallSearchMapManager::new(SearchMapConfig::default());
        let before: Vec<f32> = map
            .cells
            .iter()
            .flatten()
            .map(|cell| cell.probability)
            .collect();

        BallSearchMapManager::mirror_border_cells(&mut map);
        manager.convolve(&mut map);

        for (cell, old) in map.cells.iter().flatten().zip(before) {
            if cell.indices.0 >= 1
                && cell.indices.0 < COLS - 1
                && cell.indices.1 >= 1
                && cell.indices.1 < ROWS - 1
            {
                assert!(cell.probability >= old - 1e-7);
            }
        }
    }

    #[test]
    fn ready_recenters_the_map() {
        let mut brain = build_brain(GameState::Ready, BallState::default());
        brain.tick().unwrap();

        let map = brain.database().get::<BallSearchMap>().unwrap();
        assert_relative_eq!(
            map.cells[COLS / 2][ROWS / 2].probability,
            0.25,
            epsilon = 1e-6
        );
        // the map is marked unreliable during READY
        assert!(map.timestamp_unreliable.elapsed() < Duration::from_secs(1));
    }
}
