use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::Point2;

use crate::config::{PlayerConfig, SearcherConfig};
use crate::data::game_state::GameState;
use crate::data::search_map::{COLS, ROWS};
use crate::data::{
    BallSearchMap, BodyPose, GameControllerState, PlayingRole, PlayingRoles, RobotPosition,
    SearcherPosition, TeamPlayers, MAX_PLAYERS,
};
use crate::math::{angle, Pose};

/// Walking speed assumed for the searcher assignment, meters per second.
const WALK_VELOCITY: f32 = 0.18;

/// Turning speed assumed for the searcher assignment: a half turn takes ten seconds.
const TURN_VELOCITY: f32 = std::f32::consts::PI / 10.0;

/// Extra cost for a fallen searcher, seconds.
const FALLEN_PENALTY: f32 = 10.0;

/// One Voronoi area of the search map: a seed, the cells closest to it, the player
/// assigned to it and the cell currently worth exploring.
struct SearchArea {
    seed: Point2<f32>,
    cells: Vec<(usize, usize)>,
    assigned_player: u8,
    cell_to_explore: Option<(usize, usize)>,
}

/// A searcher as far as the assignment cares.
#[derive(Clone, Copy)]
struct Searcher {
    player_number: u8,
    pose: Pose,
    fallen: bool,
}

/// Partitions the search map into one Voronoi area per searcher, assigns each searcher
/// the area it can serve cheapest, and picks the most valuable cell of that area as its
/// search target.
///
/// Every robot computes suggestions for the whole team and broadcasts them; the
/// suggestion actually followed is the one from the lowest-numbered active player, so
/// the team agrees on a single plan without extra negotiation.
pub struct SearcherPositionProvider {
    config: SearcherConfig,
    player: PlayerConfig,
    areas: Vec<SearchArea>,
    last_searchers: Vec<u8>,
}

impl SearcherPositionProvider {
    #[must_use]
    pub fn new(config: SearcherConfig, player: PlayerConfig) -> Self {
        Self {
            config,
            player,
            areas: Vec::new(),
            last_searchers: Vec::new(),
        }
    }

    /// Approximate time for a searcher to reach a field position.
    fn time_to_reach(searcher: &Searcher, position: Point2<f32>) -> f32 {
        let to_position = position - searcher.pose.position;
        let walk_time = to_position.norm() / WALK_VELOCITY;
        let orientation = to_position.y.atan2(to_position.x);
        let rotate_time = angle::difference(orientation, searcher.pose.orientation) / TURN_VELOCITY;
        let fallen_penalty = if searcher.fallen { FALLEN_PENALTY } else { 0.0 };
        walk_time + rotate_time + fallen_penalty
    }

    /// The exploration value of a cell: probability plus a capped age bonus.
    fn cell_value(&self, map: &BallSearchMap, indices: (usize, usize)) -> f32 {
        let cell = &map.cells[indices.0][indices.1];
        self.config.probability_weight * cell.probability
            + (cell.age as f32).min(self.config.max_age_value_contribution)
                / self.config.max_age_value_contribution
    }

    /// Rebuilds the Voronoi partition for the given searcher count.
    fn rebuild_areas(&mut self, map: &BallSearchMap, searcher_count: usize) {
        let seeds = &self.config.voronoi_seeds[searcher_count - 1];
        self.areas = seeds
            .iter()
            .map(|seed| SearchArea {
                seed: Point2::new(seed[0], seed[1]),
                cells: Vec::new(),
                assigned_player: 0,
                cell_to_explore: None,
            })
            .collect();

        for x in 1..COLS - 1 {
            for y in 1..ROWS - 1 {
                let position = map.cells[x][y].position;
                let nearest = self
                    .areas
                    .iter_mut()
                    .min_by(|a, b| {
                        (position - a.seed)
                            .norm()
                            .total_cmp(&(position - b.seed).norm())
                    })
                    .expect("at least one area");
                nearest.cells.push((x, y));
            }
        }
    }

    /// Greedily assigns searchers to areas, cheapest pair first.
    fn assign_searchers(&mut self, searchers: &[Searcher]) {
        for area in &mut self.areas {
            area.assigned_player = 0;
        }

        let mut unassigned: Vec<&Searcher> = searchers.iter().collect();
        while !unassigned.is_empty() {
            let mut best: Option<(usize, usize, f32)> = None;
            for (area_index, area) in self.areas.iter().enumerate() {
                if area.assigned_player != 0 {
                    continue;
                }
                for (searcher_index, searcher) in unassigned.iter().enumerate() {
                    let cost = Self::time_to_reach(searcher, area.seed);
                    if best.map_or(true, |(_, _, best_cost)| cost < best_cost) {
                        best = Some((area_index, searcher_index, cost));
                    }
                }
            }
            let Some((area_index, searcher_index, _)) = best else {
                break;
            };
            self.areas[area_index].assigned_player =
                unassigned.swap_remove(searcher_index).player_number;
        }
    }
}

impl Module for SearcherPositionProvider {
    fn name(&self) -> &'static str {
        "searcher_position_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BallSearchMap>(),
            SlotInfo::of::<BodyPose>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<PlayingRoles>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<TeamPlayers>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<SearcherPosition>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<SearcherPosition>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let map = database.get::<BallSearchMap>()?;
        let body_pose = database.get::<BodyPose>()?;
        let game = database.get::<GameControllerState>()?;
        let roles = database.get::<PlayingRoles>()?;
        let robot = database.get::<RobotPosition>()?;
        let team_players = database.get::<TeamPlayers>()?;
        let mut searcher_position = database.get_mut::<SearcherPosition>()?;

        if game.game_state != GameState::Playing {
            self.last_searchers.clear();
            self.areas.clear();
            return Ok(());
        }

        // collect the active searchers per the own election
        let mut searchers = Vec::new();
        if roles.role == PlayingRole::Searcher && robot.valid {
            searchers.push(Searcher {
                player_number: self.player.player_number,
                pose: robot.pose,
                fallen: body_pose.fallen,
            });
        }
        for player in &team_players.players {
            if player.penalized || !player.is_pose_valid {
                continue;
            }
            if roles.role_of(player.player_number) == PlayingRole::Searcher {
                searchers.push(Searcher {
                    player_number: player.player_number,
                    pose: player.pose,
                    fallen: player.fallen,
                });
            }
        }

        if searchers.is_empty() {
            self.last_searchers.clear();
            return Ok(());
        }

        let searcher_count = searchers.len().min(self.config.voronoi_seeds.len());
        let searchers = &searchers[..searcher_count];

        // keep the assignment while the searcher set is unchanged, so targets are stable
        let mut current: Vec<u8> = searchers.iter().map(|s| s.player_number).collect();
        current.sort_unstable();
        if current != self.last_searchers {
            self.rebuild_areas(&map, searcher_count);
            self.assign_searchers(searchers);
            self.last_searchers = current;
        }

        // pick the most valuable cell of every area
        for area_index in 0..self.areas.len() {
            let best = self.areas[area_index]
                .cells
                .iter()
                .copied()
                .max_by(|&a, &b| self.cell_value(&map, a).total_cmp(&self.cell_value(&map, b)));
            self.areas[area_index].cell_to_explore = best;
        }

        // publish suggestions for the whole team
        searcher_position.suggested_positions = vec![Point2::origin(); MAX_PLAYERS];
        searcher_position.suggestions_valid = vec![false; MAX_PLAYERS];
        for area in &self.areas {
            let (Some(indices), player_number) = (area.cell_to_explore, area.assigned_player)
            else {
                continue;
            };
            if player_number == 0 {
                continue;
            }
            let index = usize::from(player_number) - 1;
            if index < MAX_PLAYERS {
                searcher_position.suggested_positions[index] =
                    map.cells[indices.0][indices.1].position;
                searcher_position.suggestions_valid[index] = true;
            }
        }

        // the own target: follow the most wise (lowest-numbered) active player that has
        // a suggestion for us, our own plan otherwise
        let own_index = usize::from(self.player.player_number) - 1;
        let mut target = searcher_position.suggestions_valid[own_index]
            .then(|| searcher_position.suggested_positions[own_index]);
        let mut most_wise = self.player.player_number;
        for player in &team_players.players {
            if player.penalized
                || player.player_number >= most_wise
                || player
                    .suggested_search_positions_valid
                    .get(own_index)
                    .copied()
                    != Some(true)
            {
                continue;
            }
            most_wise = player.player_number;
            target = Some(player.suggested_search_positions[own_index]);
        }

        if let (Some(target), true) = (target, roles.role == PlayingRole::Searcher) {
            // stand off the cell so the ball does not vanish under the chin
            let stand_off = (self.config.min_ball_detection_range
                + self.config.max_ball_detection_range / 2.0)
                / 2.0;
            let to_target = target - robot.pose.position;
            let distance = to_target.norm();
            let position = if distance > stand_off {
                target - to_target / distance * stand_off
            } else {
                robot.pose.position
            };
            let orientation = (target - position).y.atan2((target - position).x);

            searcher_position.pose = Pose::new(position, orientation);
            searcher_position.search_position = target;
            searcher_position.valid = true;
        }

        Ok(())
    }

    fn reload(&mut self, parameters: &toml::Value) -> Result<()> {
        self.config = super::parse_parameters(parameters)?;
        self.last_searchers.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir::{App, Brain};

    fn build_brain(roles: PlayingRoles, players: Vec<crate::data::TeamPlayer>) -> Brain {
        let game = GameControllerState {
            game_state: GameState::Playing,
            ..Default::default()
        };
        App::new()
            .add_input(BallSearchMap::default())
            .unwrap()
            .add_input(BodyPose::default())
            .unwrap()
            .add_input(game)
            .unwrap()
            .add_input(roles)
            .unwrap()
            .add_input(RobotPosition {
                valid: true,
                pose: Pose::new(Point2::new(-3.0, 0.0), 0.0),
                ..Default::default()
            })
            .unwrap()
            .add_input(TeamPlayers {
                players,
                active_player_count: 2,
            })
            .unwrap()
            .add_module(SearcherPositionProvider::new(
                SearcherConfig::default(),
                PlayerConfig {
                    player_number: 2,
                    team_number: 8,
                },
            ))
            .unwrap()
            .build()
            .unwrap()
    }

    fn searcher_roles(numbers: &[u8]) -> PlayingRoles {
        let mut player_roles = vec![PlayingRole::None; MAX_PLAYERS];
        for &number in numbers {
            player_roles[usize::from(number) - 1] = PlayingRole::Searcher;
        }
        PlayingRoles {
            role: player_roles[1],
            player_roles,
        }
    }

    #[test]
    fn lone_searcher_gets_a_pose_and_suggestions() {
        let mut brain = build_brain(searcher_roles(&[2]), Vec::new());
        brain.tick().unwrap();

        let position = brain.database().get::<SearcherPosition>().unwrap();
        assert!(position.valid);
        assert!(position.suggestions_valid[1]);
        // the robot keeps a stand-off from the cell it wants to look at
        let distance = (position.search_position - position.pose.position).norm();
        assert!(distance > 0.3);
    }

    #[test]
    fn two_searchers_get_disjoint_areas() {
        let teammate = crate::data::TeamPlayer::at_pose(3, Pose::new(Point2::new(3.0, 0.0), 0.0));
        let mut brain = build_brain(searcher_roles(&[2, 3]), vec![teammate]);
        brain.tick().unwrap();

        let position = brain.database().get::<SearcherPosition>().unwrap();
        assert!(position.suggestions_valid[1]);
        assert!(position.suggestions_valid[2]);
        // the left robot searches the left half, the right robot the right half
        assert!(position.suggested_positions[1].x < position.suggested_positions[2].x);
    }

    #[test]
    fn non_searchers_produce_no_own_pose() {
        let mut brain = build_brain(searcher_roles(&[3]), Vec::new());
        brain.tick().unwrap();

        let position = brain.database().get::<SearcherPosition>().unwrap();
        assert!(!position.valid);
    }
}
