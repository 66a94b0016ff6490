use std::time::{Duration, Instant};

use mimir::{Database, Module, Result, SlotInfo};
use miette::miette;
use nalgebra::Point2;
use tracing::{debug, info, warn};

use crate::config::{PlayerConfig, RolesConfig, TimeToReachBallConfig};
use crate::data::game_state::{GamePhase, GameState, Penalty, SetPlay};
use crate::data::{
    BallState, BallType, BodyPose, CycleInfo, FieldDimensions, GameControllerState, PlayingRole,
    PlayingRoles, RobotPosition, TeamBallModel, TeamPlayers, TimeToReachBall, MAX_PLAYERS,
};
use crate::modules::time_to_reach_ball::estimate_time_to_reach_ball;

/// How the team currently searches for the ball.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum BallSearchState {
    /// The team ball is known; nobody searches.
    #[default]
    None,
    /// The ball was lost recently; the formation mostly holds.
    ShortTerm,
    /// The ball has been lost for a while; everybody spreads out and searches.
    LongTerm,
}

/// Elects the playing roles for the whole team.
///
/// Every robot runs the same deterministic election over the same shared inputs, so the
/// elections agree up to message latency; hysteresis (role stickiness, the striker bonus
/// track, distance hysteresis) keeps disagreements from flapping, and the team-role
/// overwrite from the lowest-numbered teammate resolves what remains.
pub struct PlayingRoleProvider {
    config: RolesConfig,
    ttrb_config: TimeToReachBallConfig,
    player: PlayerConfig,
    last_assignment: Vec<PlayingRole>,
    last_striker_number: u8,
    ball_search_state: BallSearchState,
    loser_assigned: bool,
    revolting: bool,
    start_of_last_revolution: Option<Instant>,
    player_one_was_far_away: bool,
    in_goal: [bool; MAX_PLAYERS],
}

/// A remaining player in the front-to-back assignment of step 6.
struct RemainingPlayer {
    player_number: u8,
    position: Point2<f32>,
}

impl PlayingRoleProvider {
    #[must_use]
    pub fn new(
        config: RolesConfig,
        ttrb_config: TimeToReachBallConfig,
        player: PlayerConfig,
    ) -> Self {
        Self {
            config,
            ttrb_config,
            player,
            last_assignment: vec![PlayingRole::None; MAX_PLAYERS],
            last_striker_number: 0,
            ball_search_state: BallSearchState::None,
            loser_assigned: false,
            revolting: false,
            start_of_last_revolution: None,
            player_one_was_far_away: false,
            in_goal: [false; MAX_PLAYERS],
        }
    }

    fn last_role_of(&self, player_number: u8) -> PlayingRole {
        if player_number == 0 {
            return PlayingRole::None;
        }
        self.last_assignment
            .get(usize::from(player_number) - 1)
            .copied()
            .unwrap_or(PlayingRole::None)
    }

    fn update_role(roles: &mut PlayingRoles, own_number: u8, player_number: u8, role: PlayingRole) {
        roles.player_roles[usize::from(player_number) - 1] = role;
        if player_number == own_number {
            roles.role = role;
        }
    }

    /// The election bid of a player, adjusted for hysteresis: the last striker bids on
    /// the bonus track, a keeper that is actually in its goal bids with a penalty.
    fn effective_time_to_reach_ball(
        &mut self,
        roles: &PlayingRoles,
        player_number: u8,
        player_position: Point2<f32>,
        own_goal: Point2<f32>,
        time_to_reach_ball: Duration,
        time_to_reach_ball_striker: Duration,
    ) -> Duration {
        if roles.role_of(player_number) != PlayingRole::None {
            return Duration::MAX;
        }
        let last_role = self.last_role_of(player_number);
        if last_role == PlayingRole::Striker {
            return time_to_reach_ball_striker;
        }

        let was_keeper = matches!(
            last_role,
            PlayingRole::Keeper | PlayingRole::ReplacementKeeper
        );
        let index = usize::from(player_number) - 1;
        let robot_to_goal = (player_position - own_goal).norm();
        self.in_goal[index] = crate::math::hysteresis::Hysteresis::smaller_than(
            robot_to_goal,
            self.config.keeper_in_goal_distance_threshold,
            self.config.distance_hysteresis,
            self.in_goal[index],
        );
        if was_keeper && self.in_goal[index] {
            return time_to_reach_ball
                .saturating_add(self.config.keeper_time_to_reach_ball_penalty);
        }
        time_to_reach_ball
    }

    fn assign_striker(
        &mut self,
        roles: &mut PlayingRoles,
        cycle_info: &CycleInfo,
        robot: &RobotPosition,
        team_players: &TeamPlayers,
        time_to_reach_ball: &TimeToReachBall,
        field: &FieldDimensions,
    ) {
        let own_goal = field.own_goal_center();
        let own_number = self.player.player_number;

        let mut smallest = Duration::MAX;
        let mut striker_number = 0;

        if time_to_reach_ball.valid
            && roles.role == PlayingRole::None
            && (self.config.player_one_can_become_striker || own_number != 1)
        {
            smallest = self.effective_time_to_reach_ball(
                roles,
                own_number,
                robot.pose.position,
                own_goal,
                time_to_reach_ball.time_to_reach_ball,
                time_to_reach_ball.time_to_reach_ball_striker,
            );
            striker_number = own_number;
        }

        for player in &team_players.players {
            if player.penalized || roles.role_of(player.player_number) != PlayingRole::None {
                continue;
            }
            if !self.config.player_one_can_become_striker && player.player_number == 1 {
                continue;
            }
            let bid = self.effective_time_to_reach_ball(
                roles,
                player.player_number,
                player.pose.position,
                own_goal,
                abs_time_difference(cycle_info.start_time, player.time_when_reach_ball),
                abs_time_difference(cycle_info.start_time, player.time_when_reach_ball_striker),
            );
            if bid < smallest {
                striker_number = player.player_number;
                smallest = bid;
            }
        }

        if striker_number != 0 {
            Self::update_role(roles, own_number, striker_number, PlayingRole::Striker);
            self.last_striker_number = striker_number;
        }
    }

    /// The keeper role only ever goes to player 1. Returns whether it was assigned.
    fn assign_keeper(&self, roles: &mut PlayingRoles, team_players: &TeamPlayers) -> bool {
        let own_number = self.player.player_number;
        if roles.role == PlayingRole::None && own_number == 1 {
            Self::update_role(roles, own_number, 1, PlayingRole::Keeper);
            return true;
        }
        for player in &team_players.players {
            if player.penalized || roles.role_of(player.player_number) != PlayingRole::None {
                continue;
            }
            if player.player_number == 1 {
                Self::update_role(roles, own_number, 1, PlayingRole::Keeper);
                return true;
            }
        }
        false
    }

    fn distance_to_own_goal(
        &self,
        field: &FieldDimensions,
        position: Point2<f32>,
        player_number: u8,
    ) -> f32 {
        let mut distance = (position - field.own_goal_center()).norm();
        if self.last_role_of(player_number) == PlayingRole::Keeper {
            distance -= 0.5;
        }
        distance
    }

    fn player_one_is_far_away(
        &mut self,
        field: &FieldDimensions,
        robot: &RobotPosition,
        team_players: &TeamPlayers,
    ) -> bool {
        let own_goal = field.own_goal_center();
        let mut distance = f32::MAX;
        if self.player.player_number == 1 {
            distance = (own_goal - robot.pose.position).norm();
        } else if let Some(player_one) = team_players
            .players
            .iter()
            .find(|player| !player.penalized && player.player_number == 1)
        {
            distance = (own_goal - player_one.pose.position).norm();
        }

        self.player_one_was_far_away = crate::math::hysteresis::Hysteresis::greater_than(
            distance,
            self.config.player_one_distance_threshold,
            self.config.distance_hysteresis,
            self.player_one_was_far_away,
        );
        self.player_one_was_far_away
    }

    fn assign_replacement_keeper(
        &self,
        roles: &mut PlayingRoles,
        field: &FieldDimensions,
        robot: &RobotPosition,
        team_players: &TeamPlayers,
    ) {
        let own_number = self.player.player_number;

        let mut smallest_distance = f32::MAX;
        let mut candidate = 0;
        if robot.valid && roles.role == PlayingRole::None {
            smallest_distance = self.distance_to_own_goal(field, robot.pose.position, own_number);
            candidate = own_number;
        }
        for player in &team_players.players {
            // the keeper itself stays a candidate: if it is the nearest player no
            // replacement is needed
            let role = roles.role_of(player.player_number);
            if player.penalized || (role != PlayingRole::None && role != PlayingRole::Keeper) {
                continue;
            }
            let distance =
                self.distance_to_own_goal(field, player.pose.position, player.player_number);
            if distance < smallest_distance {
                candidate = player.player_number;
                smallest_distance = distance;
            }
        }

        if candidate != 0 && candidate != 1 {
            Self::update_role(roles, own_number, candidate, PlayingRole::ReplacementKeeper);
        }
    }

    fn bishop_or_supporter(
        &self,
        game: &GameControllerState,
        team_ball: &TeamBallModel,
        remaining: &[RemainingPlayer],
        candidate: u8,
    ) -> PlayingRole {
        // during own free kicks a bishop is wanted as a pass target, regardless of count
        if game.set_play != SetPlay::None && game.kicking_team {
            return PlayingRole::Bishop;
        }
        if !self.config.assign_bishop {
            return PlayingRole::SupportStriker;
        }
        if remaining.len() < 3 && !self.config.assign_bishop_with_less_than_four_field_players {
            return PlayingRole::SupportStriker;
        }

        // the bishop bonus only applies if the same robot would become bishop again
        let had_bishop = remaining.iter().any(|player| {
            self.last_role_of(player.player_number) == PlayingRole::Bishop
                && player.player_number == candidate
        });

        if game.set_play != SetPlay::None {
            // keep an existing bishop from crossing the field during enemy free kicks
            return if game.kicking_team || had_bishop {
                PlayingRole::Bishop
            } else {
                PlayingRole::SupportStriker
            };
        }

        let mut assign_bishop = had_bishop;
        if team_ball.ball_type != BallType::None {
            let threshold = if had_bishop { 1.0 } else { 0.0 };
            assign_bishop = team_ball.position.x < threshold;
        }
        if assign_bishop {
            PlayingRole::Bishop
        } else {
            PlayingRole::SupportStriker
        }
    }

    fn assign_remaining_player_roles(
        &mut self,
        roles: &mut PlayingRoles,
        game: &GameControllerState,
        team_ball: &TeamBallModel,
        robot: &RobotPosition,
        team_players: &TeamPlayers,
    ) {
        let own_number = self.player.player_number;

        let mut remaining = Vec::new();
        if roles.role_of(own_number) == PlayingRole::None {
            remaining.push(RemainingPlayer {
                player_number: own_number,
                position: robot.pose.position,
            });
        }
        for player in &team_players.players {
            if player.penalized || roles.role_of(player.player_number) != PlayingRole::None {
                continue;
            }
            remaining.push(RemainingPlayer {
                player_number: player.player_number,
                position: player.pose.position,
            });
        }
        if remaining.is_empty() {
            return;
        }

        // in long term search everybody left spreads out and searches
        if self.ball_search_state == BallSearchState::LongTerm {
            for player in &remaining {
                Self::update_role(roles, own_number, player.player_number, PlayingRole::Searcher);
            }
            return;
        }

        // the x coordinates are artificially shifted by the last role for stability
        for player in &mut remaining {
            match self.last_role_of(player.player_number) {
                PlayingRole::Defender => {
                    player.position.x += self.config.defender_stickiness_offset;
                }
                PlayingRole::SupportStriker => {
                    player.position.x += self.config.supporter_stickiness_offset;
                }
                PlayingRole::Bishop => player.position.x += self.config.bishop_stickiness_offset,
                _ => {}
            }
        }
        remaining.sort_by(|a, b| a.position.x.total_cmp(&b.position.x));

        // in short term search the rearmost player defends, everybody else searches
        if self.ball_search_state == BallSearchState::ShortTerm {
            if !self.loser_assigned {
                let searcher = remaining.pop().expect("remaining is non-empty");
                Self::update_role(roles, own_number, searcher.player_number, PlayingRole::Searcher);
                if remaining.is_empty() {
                    return;
                }
            }
            let defender = remaining.remove(0);
            Self::update_role(roles, own_number, defender.player_number, PlayingRole::Defender);
            for player in &remaining {
                Self::update_role(roles, own_number, player.player_number, PlayingRole::Searcher);
            }
            return;
        }

        match remaining.len() {
            1 => {
                Self::update_role(
                    roles,
                    own_number,
                    remaining[0].player_number,
                    PlayingRole::Defender,
                );
            }
            2 => {
                Self::update_role(
                    roles,
                    own_number,
                    remaining[0].player_number,
                    PlayingRole::Defender,
                );
                let role =
                    self.bishop_or_supporter(game, team_ball, &remaining, remaining[1].player_number);
                Self::update_role(roles, own_number, remaining[1].player_number, role);
            }
            3 => {
                Self::update_role(
                    roles,
                    own_number,
                    remaining[0].player_number,
                    PlayingRole::Defender,
                );
                Self::update_role(
                    roles,
                    own_number,
                    remaining[1].player_number,
                    PlayingRole::SupportStriker,
                );
                Self::update_role(roles, own_number, remaining[2].player_number, PlayingRole::Bishop);
            }
            _ => {
                warn!(
                    "{} remaining players, there should never be more than 5 on the field",
                    remaining.len()
                );
            }
        }
    }

    fn forced_role(&self) -> Result<Option<PlayingRole>> {
        Ok(Some(match self.config.force_role.as_str() {
            "none" => return Ok(None),
            "keeper" => PlayingRole::Keeper,
            "defender" => PlayingRole::Defender,
            "striker" => PlayingRole::Striker,
            "supportStriker" => PlayingRole::SupportStriker,
            "bishop" => PlayingRole::Bishop,
            "replacementKeeper" => PlayingRole::ReplacementKeeper,
            "loser" => PlayingRole::Loser,
            "searcher" => PlayingRole::Searcher,
            other => return Err(miette!("unknown forced playing role `{other}`")),
        }))
    }
}

/// The absolute difference between two instants, used to read a teammate's deadline bid.
fn abs_time_difference(a: Instant, b: Instant) -> Duration {
    if a > b {
        a - b
    } else {
        b - a
    }
}

impl Module for PlayingRoleProvider {
    fn name(&self) -> &'static str {
        "playing_role_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BallState>(),
            SlotInfo::of::<BodyPose>(),
            SlotInfo::of::<CycleInfo>(),
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<TeamBallModel>(),
            SlotInfo::of::<TeamPlayers>(),
            SlotInfo::of::<TimeToReachBall>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<PlayingRoles>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<PlayingRoles>()
    }

    #[allow(clippy::too_many_lines)]
    fn cycle(&mut self, database: &Database) -> Result<()> {
        let ball_state = database.get::<BallState>()?;
        let body_pose = database.get::<BodyPose>()?;
        let cycle_info = database.get::<CycleInfo>()?;
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let robot = database.get::<RobotPosition>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let team_players = database.get::<TeamPlayers>()?;
        let time_to_reach_ball = database.get::<TimeToReachBall>()?;
        let mut roles = database.get_mut::<PlayingRoles>()?;

        let own_number = self.player.player_number;

        let in_active_state = matches!(
            game.game_state,
            GameState::Playing | GameState::Ready | GameState::Set
        );
        if !in_active_state || game.penalty != Penalty::None || game.game_phase != GamePhase::Normal
        {
            self.last_assignment.clear();
            return Ok(());
        }

        // whether and how long the team has been without a ball
        self.ball_search_state = if team_ball.ball_type == BallType::None {
            if cycle_info.age(team_ball.time_last_updated)
                > self.config.short_term_ball_search_duration
            {
                BallSearchState::LongTerm
            } else {
                BallSearchState::ShortTerm
            }
        } else {
            BallSearchState::None
        };

        // map-like access by player number
        let max_number = team_players
            .players
            .iter()
            .map(|player| player.player_number)
            .chain([own_number])
            .max()
            .unwrap_or(own_number);
        roles
            .player_roles
            .resize(usize::from(max_number), PlayingRole::None);

        // 1. a forced role overrides everything; no roles for others are provided then
        if let Some(forced) = self.forced_role()? {
            Self::update_role(&mut roles, own_number, own_number, forced);
            self.last_assignment = vec![PlayingRole::None; usize::from(own_number)];
            self.last_assignment[usize::from(own_number) - 1] = forced;
            return Ok(());
        }

        // 2. striker election, or the loser role while the ball is freshly lost
        self.loser_assigned = false;
        match self.ball_search_state {
            BallSearchState::None => {
                self.assign_striker(
                    &mut roles,
                    &cycle_info,
                    &robot,
                    &team_players,
                    &time_to_reach_ball,
                    &field,
                );
            }
            BallSearchState::ShortTerm
                if cycle_info.age(team_ball.time_last_updated) < self.config.loser_duration
                    && self.last_striker_number != 0
                    && usize::from(self.last_striker_number) <= roles.player_roles.len() =>
            {
                // the robot that just lost the ball backs off and looks for it
                Self::update_role(
                    &mut roles,
                    own_number,
                    self.last_striker_number,
                    PlayingRole::Loser,
                );
                self.loser_assigned = true;
            }
            _ => {}
        }

        // 3. keeper
        let keeper_assigned = self.assign_keeper(&mut roles, &team_players);

        // 4. replacement keeper when there is no keeper or it is far from the goal
        if !keeper_assigned || self.player_one_is_far_away(&field, &robot, &team_players) {
            self.assign_replacement_keeper(&mut roles, &field, &robot, &team_players);
        }

        // 5. everybody else
        self.assign_remaining_player_roles(&mut roles, &game, &team_ball, &robot, &team_players);

        // 6. revolution: a robot that just elected itself striker holds that role for a
        // bounded time even against the team role
        let just_became_striker = self.last_role_of(own_number) != PlayingRole::Striker
            && roles.role == PlayingRole::Striker;
        let revolution_just_started = self
            .start_of_last_revolution
            .map_or(false, |start| {
                cycle_info.age(start) < self.config.max_fast_role_override_duration
            });
        if self.config.allow_fast_role_override
            && (just_became_striker || revolution_just_started)
            && roles.role == PlayingRole::Striker
        {
            if !self.revolting {
                self.revolting = true;
                self.start_of_last_revolution = Some(cycle_info.start_time);
                info!("player {own_number} just started a revolution");
            }
        } else if self.config.use_team_role || game.game_state != GameState::Playing {
            if self.revolting {
                self.revolting = false;
                debug!("player {own_number} stopped revolting");
            }

            // adopt the election of the lowest-numbered active teammate that has one
            let mut min_player_number = own_number;
            for player in &team_players.players {
                if !player.penalized
                    && player.player_number < min_player_number
                    && player.role_assignments.len() >= usize::from(own_number)
                    && player.role_assignments[usize::from(own_number) - 1] != PlayingRole::None
                {
                    min_player_number = player.player_number;
                    roles.role = player.role_assignments[usize::from(own_number) - 1];
                }
            }
        }

        // 7. strike the own ball when the team has no consensus but we are confident
        // and nobody else would be faster (with the shared velocity profile)
        if self.config.strike_own_ball && !team_ball.found && ball_state.confident {
            let abs_ball = robot.pose.robot_to_field(ball_state.position);
            let target = field.opponent_goal_center();
            let own_bid = estimate_time_to_reach_ball(
                &self.ttrb_config,
                &robot.pose,
                abs_ball,
                target,
                body_pose.fallen,
                true,
            );
            let own_is_fastest = team_players.players.iter().all(|player| {
                player.penalized
                    || estimate_time_to_reach_ball(
                        &self.ttrb_config,
                        &player.pose,
                        abs_ball,
                        target,
                        player.fallen,
                        true,
                    ) >= own_bid
            });
            if own_is_fastest {
                roles.role = PlayingRole::Striker;
            }
        }

        // 8. remember the assignment for the hysteresis of the next tick
        self.last_assignment = roles.player_roles.clone();

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
    use mimir::{App, Brain};

    use crate::data::TeamPlayer;
    use crate::math::Pose;

    struct Scenario {
        game: GameControllerState,
        ball: BallState,
        robot: RobotPosition,
        team_ball: TeamBallModel,
        players: Vec<TeamPlayer>,
        time_to_reach_ball: TimeToReachBall,
        player_number: u8,
    }

    impl Default for Scenario {
        fn default() -> Self {
            Self {
                game: GameControllerState {
                    game_state: GameState::Playing,
                    ..Default::default()
                },
                ball: BallState::default(),
                robot: RobotPosition {
                    valid: true,
                    ..Default::default()
                },
                team_ball: TeamBallModel::default(),
                players: Vec::new(),
                time_to_reach_ball: TimeToReachBall::default(),
                player_number: 2,
            }
        }
    }

    impl Scenario {
        fn build(self) -> Brain {
            App::new()
                .add_input(CycleInfo::default())
                .unwrap()
                .add_input(FieldDimensions::default())
                .unwrap()
                .add_input(self.game)
                .unwrap()
                .add_input(self.ball)
                .unwrap()
                .add_input(BodyPose::default())
                .unwrap()
                .add_input(self.robot)
                .unwrap()
                .add_input(self.team_ball)
                .unwrap()
                .add_input(TeamPlayers {
                    players: self.players,
                    active_player_count: 3,
                })
                .unwrap()
                .add_input(self.time_to_reach_ball)
                .unwrap()
                .add_module(PlayingRoleProvider::new(
                    RolesConfig {
                        use_team_role: false,
                        ..Default::default()
                    },
                    TimeToReachBallConfig::default(),
                    PlayerConfig {
                        player_number: self.player_number,
                        team_number: 8,
                    },
                ))
                .unwrap()
                .build()
                .unwrap()
        }
    }

    fn team_ball_at(position: Point2<f32>) -> TeamBallModel {
        TeamBallModel {
            ball_type: BallType::Team,
            seen: true,
            found: true,
            inside_field: true,
            position,
            time_last_updated: Instant::now(),
            ..Default::default()
        }
    }

    fn bidding_player(number: u8, pose: Pose, bid: Duration) -> TeamPlayer {
        let mut player = TeamPlayer::at_pose(number, pose);
        player.time_when_reach_ball = Instant::now() + bid;
        player.time_when_reach_ball_striker = Instant::now() + bid;
        player
    }

    fn roles_of(brain: &Brain) -> PlayingRoles {
        brain.database().get::<PlayingRoles>().unwrap().clone()
    }

    #[test]
    fn three_robots_get_keeper_striker_defender() {
        // boundary scenario: players 1, 2, 3 with a team ball; 2 bids lowest
        let mut brain = Scenario {
            team_ball: team_ball_at(Point2::new(2.0, 1.0)),
            robot: RobotPosition {
                valid: true,
                pose: Pose::new(Point2::new(0.5, 0.5), 0.0),
                ..Default::default()
            },
            time_to_reach_ball: TimeToReachBall {
                time_to_reach_ball: Duration::from_secs(8),
                time_to_reach_ball_striker: Duration::from_secs(8),
                valid: true,
            },
            players: vec![
                bidding_player(
                    1,
                    Pose::new(Point2::new(-4.2, 0.0), 0.0),
                    Duration::from_secs(30),
                ),
                bidding_player(
                    3,
                    Pose::new(Point2::new(-2.0, -1.0), 0.0),
                    Duration::from_secs(20),
                ),
            ],
            ..Default::default()
        }
        .build();
        brain.tick().unwrap();

        let roles = roles_of(&brain);
        assert_eq!(roles.role_of(1), PlayingRole::Keeper);
        assert_eq!(roles.role_of(2), PlayingRole::Striker);
        assert_eq!(roles.role_of(3), PlayingRole::Defender);
        assert_eq!(roles.role, PlayingRole::Striker);
    }

    #[test]
    fn at_most_one_striker_per_tick() {
        let mut brain = Scenario {
            team_ball: team_ball_at(Point2::new(1.0, 0.0)),
            time_to_reach_ball: TimeToReachBall {
                time_to_reach_ball: Duration::from_secs(5),
                time_to_reach_ball_striker: Duration::from_secs(5),
                valid: true,
            },
            players: vec![
                bidding_player(
                    3,
                    Pose::new(Point2::new(1.0, 0.0), 0.0),
                    Duration::from_secs(5),
                ),
                bidding_player(
                    4,
                    Pose::new(Point2::new(1.5, 0.0), 0.0),
                    Duration::from_secs(5),
                ),
            ],
            ..Default::default()
        }
        .build();
        brain.tick().unwrap();

        let striker_count = roles_of(&brain)
            .player_roles
            .iter()
            .filter(|&&role| role == PlayingRole::Striker)
            .count();
        assert_eq!(striker_count, 1);
    }

    #[test]
    fn long_lost_ball_turns_field_players_into_searchers() {
        // boundary scenario: ball lost for longer than the short term duration
        let mut team_ball = TeamBallModel::default();
        team_ball.time_last_updated = Instant::now() - Duration::from_secs(3);

        let mut brain = Scenario {
            team_ball,
            players: vec![
                bidding_player(
                    1,
                    Pose::new(Point2::new(-4.2, 0.0), 0.0),
                    Duration::from_secs(30),
                ),
                bidding_player(
                    3,
                    Pose::new(Point2::new(-2.0, -1.0), 0.0),
                    Duration::from_secs(20),
                ),
            ],
            ..Default::default()
        }
        .build();
        brain.tick().unwrap();

        let roles = roles_of(&brain);
        assert_eq!(roles.role_of(1), PlayingRole::Keeper);
        assert_eq!(roles.role_of(2), PlayingRole::Searcher);
        assert_eq!(roles.role_of(3), PlayingRole::Searcher);
        assert!(!roles.player_roles.contains(&PlayingRole::Striker));
        assert!(!roles.player_roles.contains(&PlayingRole::Defender));
    }

    #[test]
    fn penalized_players_get_no_role() {
        let mut penalized = bidding_player(
            3,
            Pose::new(Point2::new(1.0, 0.0), 0.0),
            Duration::from_secs(1),
        );
        penalized.penalized = true;

        let mut brain = Scenario {
            team_ball: team_ball_at(Point2::new(1.0, 0.0)),
            time_to_reach_ball: TimeToReachBall {
                time_to_reach_ball: Duration::from_secs(5),
                time_to_reach_ball_striker: Duration::from_secs(5),
                valid: true,
            },
            players: vec![penalized],
            ..Default::default()
        }
        .build();
        brain.tick().unwrap();

        assert_eq!(roles_of(&brain).role_of(3), PlayingRole::None);
    }

    #[test]
    fn election_is_idempotent_with_identical_inputs() {
        let scenario = || Scenario {
            team_ball: team_ball_at(Point2::new(2.0, 1.0)),
            time_to_reach_ball: TimeToReachBall {
                time_to_reach_ball: Duration::from_secs(8),
                time_to_reach_ball_striker: Duration::from_secs(6),
                valid: true,
            },
            players: vec![
                bidding_player(
                    1,
                    Pose::new(Point2::new(-4.2, 0.0), 0.0),
                    Duration::from_secs(30),
                ),
                bidding_player(
                    3,
                    Pose::new(Point2::new(-2.0, -1.0), 0.0),
                    Duration::from_secs(20),
                ),
            ],
            ..Default::default()
        };

        let mut brain = scenario().build();
        brain.tick().unwrap();
        let first = roles_of(&brain);
        brain.tick().unwrap();
        let second = roles_of(&brain);

        assert_eq!(first.role, second.role);
        assert_eq!(first.player_roles, second.player_roles);
    }

    #[test]
    fn own_confident_ball_elevates_to_striker_without_consensus() {
        let mut brain = Scenario {
            ball: BallState {
                position: Point2::new(0.5, 0.0),
                found: true,
                confident: true,
                ..Default::default()
            },
            // no team ball consensus at all, short term search
            team_ball: TeamBallModel {
                time_last_updated: Instant::now(),
                ..Default::default()
            },
            ..Default::default()
        }
        .build();
        brain.tick().unwrap();

        assert_eq!(roles_of(&brain).role, PlayingRole::Striker);
    }

    #[test]
    fn outside_active_states_no_roles_are_assigned() {
        let mut brain = Scenario {
            game: GameControllerState {
                game_state: GameState::Initial,
                ..Default::default()
            },
            team_ball: team_ball_at(Point2::new(1.0, 0.0)),
            ..Default::default()
        }
        .build();
        brain.tick().unwrap();

        let roles = roles_of(&brain);
        assert_eq!(roles.role, PlayingRole::None);
        assert!(roles.player_roles.iter().all(|&role| role == PlayingRole::None));
    }
}
