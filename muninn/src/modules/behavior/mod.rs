pub mod units;

use std::sync::{Arc, Mutex};

use mimir::{Database, Module, Result, SlotInfo};

use crate::config::{BehaviorConfig, PlayerConfig};
use crate::data::game_state::Penalty;
use crate::data::{
    ActionCommand, BallState, BishopPosition, BodyPose, CycleInfo, DefendingPosition,
    FieldDimensions, GameControllerState, KeeperAction, LoserPosition, PenaltyStrikerAction,
    PlayingRoles, PointOfInterests, ReplacementKeeperAction, RobotPosition, SearcherPosition,
    SetPlayStrikerAction, SetPosition, StrikerAction, SupportingPosition, TeamBallModel,
    TeamClock, TeamPlayers, WorldState,
};
use crate::data::game_state::GameState;

/// Everything the behavior tree reads, bundled so units are plain functions.
pub struct DataSet<'a> {
    pub config: &'a BehaviorConfig,
    pub player: &'a PlayerConfig,
    pub cycle: &'a CycleInfo,
    pub clock: &'a TeamClock,
    pub field: &'a FieldDimensions,
    pub game: &'a GameControllerState,
    pub ball: &'a BallState,
    pub robot: &'a RobotPosition,
    pub body: &'a BodyPose,
    pub roles: &'a PlayingRoles,
    pub team_ball: &'a TeamBallModel,
    pub team_players: &'a TeamPlayers,
    pub world: &'a WorldState,
    pub striker_action: &'a StrikerAction,
    pub penalty_striker_action: &'a PenaltyStrikerAction,
    pub set_play_striker_action: &'a SetPlayStrikerAction,
    pub keeper_action: &'a KeeperAction,
    pub replacement_keeper_action: &'a ReplacementKeeperAction,
    pub defending_position: &'a DefendingPosition,
    pub bishop_position: &'a BishopPosition,
    pub supporting_position: &'a SupportingPosition,
    pub loser_position: &'a LoserPosition,
    pub searcher_position: &'a SearcherPosition,
    pub set_position: &'a SetPosition,
    pub points_of_interest: &'a PointOfInterests,
    pub last_action: &'a ActionCommand,
}

/// Composes the per-role decisions into the one [`ActionCommand`] of this tick.
///
/// A lock-protected remote command may replace the composed behavior while the robot is
/// in PLAYING, unpenalized and upright; external tools install it through
/// [`BehaviorModule::remote_command_handle`].
pub struct BehaviorModule {
    config: BehaviorConfig,
    player: PlayerConfig,
    remote_command: Arc<Mutex<Option<ActionCommand>>>,
    last_action: ActionCommand,
}

impl BehaviorModule {
    #[must_use]
    pub fn new(config: BehaviorConfig, player: PlayerConfig) -> Self {
        Self {
            config,
            player,
            remote_command: Arc::new(Mutex::new(None)),
            last_action: ActionCommand::dead(),
        }
    }

    /// A handle through which an external tool installs the remote action command.
    #[must_use]
    pub fn remote_command_handle(&self) -> Arc<Mutex<Option<ActionCommand>>> {
        Arc::clone(&self.remote_command)
    }
}

impl Module for BehaviorModule {
    fn name(&self) -> &'static str {
        "behavior_module"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BallState>(),
            SlotInfo::of::<BishopPosition>(),
            SlotInfo::of::<BodyPose>(),
            SlotInfo::of::<CycleInfo>(),
            SlotInfo::of::<DefendingPosition>(),
            SlotInfo::of::<FieldDimensions>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<KeeperAction>(),
            SlotInfo::of::<LoserPosition>(),
            SlotInfo::of::<PenaltyStrikerAction>(),
            SlotInfo::of::<PlayingRoles>(),
            SlotInfo::of::<PointOfInterests>(),
            SlotInfo::of::<ReplacementKeeperAction>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<SearcherPosition>(),
            SlotInfo::of::<SetPlayStrikerAction>(),
            SlotInfo::of::<SetPosition>(),
            SlotInfo::of::<StrikerAction>(),
            SlotInfo::of::<SupportingPosition>(),
            SlotInfo::of::<TeamBallModel>(),
            SlotInfo::of::<TeamClock>(),
            SlotInfo::of::<TeamPlayers>(),
            SlotInfo::of::<WorldState>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<ActionCommand>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<ActionCommand>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let ball = database.get::<BallState>()?;
        let bishop_position = database.get::<BishopPosition>()?;
        let body = database.get::<BodyPose>()?;
        let cycle = database.get::<CycleInfo>()?;
        let defending_position = database.get::<DefendingPosition>()?;
        let field = database.get::<FieldDimensions>()?;
        let game = database.get::<GameControllerState>()?;
        let keeper_action = database.get::<KeeperAction>()?;
        let loser_position = database.get::<LoserPosition>()?;
        let penalty_striker_action = database.get::<PenaltyStrikerAction>()?;
        let roles = database.get::<PlayingRoles>()?;
        let points_of_interest = database.get::<PointOfInterests>()?;
        let replacement_keeper_action = database.get::<ReplacementKeeperAction>()?;
        let robot = database.get::<RobotPosition>()?;
        let searcher_position = database.get::<SearcherPosition>()?;
        let set_play_striker_action = database.get::<SetPlayStrikerAction>()?;
        let set_position = database.get::<SetPosition>()?;
        let striker_action = database.get::<StrikerAction>()?;
        let supporting_position = database.get::<SupportingPosition>()?;
        let team_ball = database.get::<TeamBallModel>()?;
        let clock = database.get::<TeamClock>()?;
        let team_players = database.get::<TeamPlayers>()?;
        let world = database.get::<WorldState>()?;

        // the remote override replaces the whole behavior, but only while it is safe
        if self.config.use_remote_action_command
            && game.game_state == GameState::Playing
            && game.penalty == Penalty::None
            && !body.fallen
        {
            let remote = self
                .remote_command
                .lock()
                .expect("remote command lock poisoned")
                .clone();
            if let Some(remote) = remote {
                self.last_action = remote;
                *database.get_mut::<ActionCommand>()? = remote;
                return Ok(());
            }
        }

        let data_set = DataSet {
            config: &self.config,
            player: &self.player,
            cycle: &cycle,
            clock: &clock,
            field: &field,
            game: &game,
            ball: &ball,
            robot: &robot,
            body: &body,
            roles: &roles,
            team_ball: &team_ball,
            team_players: &team_players,
            world: &world,
            striker_action: &striker_action,
            penalty_striker_action: &penalty_striker_action,
            set_play_striker_action: &set_play_striker_action,
            keeper_action: &keeper_action,
            replacement_keeper_action: &replacement_keeper_action,
            defending_position: &defending_position,
            bishop_position: &bishop_position,
            supporting_position: &supporting_position,
            loser_position: &loser_position,
            searcher_position: &searcher_position,
            set_position: &set_position,
            points_of_interest: &points_of_interest,
            last_action: &self.last_action,
        };

        let action = units::root_behavior(&data_set);
        self.last_action = action;
        *database.get_mut::<ActionCommand>()? = action;

        Ok(())
    }

    fn reload(&mut self, parameters: &toml::Value) -> Result<()> {
        self.config = super::parse_parameters(parameters)?;
        Ok(())
    }
}
