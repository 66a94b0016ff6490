use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use galdr::Config;
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::{info, warn};

use mimir::App;

use muninn::config::BrainConfig;
use muninn::data::{
    BallState, BodyPose, ButtonData, FootCollisionData, JointSensorData, RobotDetections,
    RobotPosition, SonarData, TeamClock, WhistleData,
};
use muninn::modules::behavior::BehaviorModule;
use muninn::modules::bishop_position::BishopPositionProvider;
use muninn::modules::cycle_info::CycleInfoProvider;
use muninn::modules::defending_position::DefendingPositionProvider;
use muninn::modules::game_controller::GameControllerClient;
use muninn::modules::keeper_action::KeeperActionProvider;
use muninn::modules::loser_position::LoserPositionProvider;
use muninn::modules::obstacle_filter::ObstacleFilter;
use muninn::modules::penalty_striker::PenaltyStrikerActionProvider;
use muninn::modules::playing_role::PlayingRoleProvider;
use muninn::modules::point_of_interests::PointOfInterestsProvider;
use muninn::modules::replacement_keeper::ReplacementKeeperActionProvider;
use muninn::modules::search_map_manager::BallSearchMapManager;
use muninn::modules::searcher_position::SearcherPositionProvider;
use muninn::modules::set_play_striker::SetPlayStrikerActionProvider;
use muninn::modules::set_position::SetPositionProvider;
use muninn::modules::spl_receiver::SplMessageReceiver;
use muninn::modules::spl_transmitter::SplMessageTransmitter;
use muninn::modules::striker_action::StrikerActionProvider;
use muninn::modules::supporting_position::SupportingPositionProvider;
use muninn::modules::team_ball_filter::TeamBallFilter;
use muninn::modules::team_obstacle_filter::TeamObstacleFilter;
use muninn::modules::time_to_reach_ball::TimeToReachBallProvider;
use muninn::modules::world_state::WorldStateProvider;

fn load_config() -> Result<BrainConfig> {
    let config_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config".to_string());

    let config = match BrainConfig::load(&config_dir) {
        Ok(config) => config,
        Err(error) => match error.kind {
            galdr::ErrorKind::ReadIo { ref path, .. } => {
                warn!("no configuration at `{path}`, starting with defaults");
                BrainConfig::default()
            }
            // an unparseable configuration is worse than none: refuse to start
            _ => return Err(error).into_diagnostic().wrap_err("loading brain.toml"),
        },
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    miette::set_panic_hook();

    let config = load_config()?;
    let player = config.player;
    info!(
        "starting brain as player {} of team {}",
        player.player_number, player.team_number
    );

    let mut brain = App::new()
        // input slots: the contracts of perception, localization and the body
        .add_input(TeamClock::new())?
        .add_input(config.field)?
        .add_input(BallState::default())?
        .add_input(RobotPosition::default())?
        .add_input(BodyPose::default())?
        .add_input(ButtonData::default())?
        .add_input(JointSensorData::default())?
        .add_input(SonarData::default())?
        .add_input(FootCollisionData::default())?
        .add_input(RobotDetections::default())?
        .add_input(WhistleData::default())?
        // the module graph; the scheduler orders these by their slot declarations
        .add_module(CycleInfoProvider::new(config.tick.period))?
        .add_module(GameControllerClient::new(config.game_controller, player)?)?
        .add_module(SplMessageReceiver::new(config.spl_network, player)?)?
        .add_module(SplMessageTransmitter::new(config.spl_network, player)?)?
        .add_module(TeamBallFilter::new(config.team_ball, player))?
        .add_module(BallSearchMapManager::new(config.search_map))?
        .add_module(SearcherPositionProvider::new(
            config.searcher.clone(),
            player,
        ))?
        .add_module(WorldStateProvider::new(config.world_state))?
        .add_module(TimeToReachBallProvider::new(config.time_to_reach_ball))?
        .add_module(PlayingRoleProvider::new(
            config.roles.clone(),
            config.time_to_reach_ball,
            player,
        ))?
        .add_module(StrikerActionProvider::new(config.striker))?
        .add_module(PenaltyStrikerActionProvider::new(config.penalty_striker))?
        .add_module(SetPlayStrikerActionProvider::new(config.set_play_striker))?
        .add_module(KeeperActionProvider::new(config.keeper))?
        .add_module(ReplacementKeeperActionProvider::new())?
        .add_module(DefendingPositionProvider::new(config.defender))?
        .add_module(BishopPositionProvider::new(config.bishop))?
        .add_module(SupportingPositionProvider::new(config.supporter, player))?
        .add_module(LoserPositionProvider::new())?
        .add_module(SetPositionProvider::new(
            config.set_position.clone(),
            player,
        ))?
        .add_module(PointOfInterestsProvider::new())?
        .add_module(ObstacleFilter::new(config.obstacles))?
        .add_module(TeamObstacleFilter::new(config.obstacles))?
        .add_module(BehaviorModule::new(config.behavior, player))?
        .build()?;

    let stop = Arc::new(AtomicBool::new(false));
    // the I/O threads are joined by the module drops when the tick loop ends
    let result = brain.run(config.tick.period, &stop);
    stop.store(true, Ordering::Relaxed);
    result
}
