//! Drives the cognitive pipeline end to end, with the network and referee inputs
//! injected as slots instead of sockets: team ball consensus, role election, role
//! actions and the behavior composer all run as one graph.

use std::time::{Duration, Instant};

use nalgebra::Point2;

use mimir::{App, Brain};

use muninn::config::BrainConfig;
use muninn::data::action_command::BodyCommand;
use muninn::data::game_state::{GameState, Penalty};
use muninn::data::{
    ActionCommand, BallSearchMap, BallState, BallType, BodyPose, CycleInfo, GameControllerState,
    JointSensorData, NtpData, PlayingRole, PlayingRoles, RobotPosition, SonarData, TeamBallModel,
    TeamClock, TeamPlayers, WhistleData,
};
use muninn::data::{FootCollisionData, RobotDetections};
use muninn::modules::behavior::BehaviorModule;
use muninn::modules::bishop_position::BishopPositionProvider;
use muninn::modules::defending_position::DefendingPositionProvider;
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
use muninn::modules::striker_action::StrikerActionProvider;
use muninn::modules::supporting_position::SupportingPositionProvider;
use muninn::modules::team_ball_filter::TeamBallFilter;
use muninn::modules::team_obstacle_filter::TeamObstacleFilter;
use muninn::modules::time_to_reach_ball::TimeToReachBallProvider;
use muninn::modules::world_state::WorldStateProvider;

/// Builds the brain graph with referee state and teammate table as inputs.
fn build_pipeline(config: &BrainConfig) -> Brain {
    let player = config.player;
    App::new()
        .add_input(TeamClock::new())
        .unwrap()
        .add_input(config.field)
        .unwrap()
        .add_input(CycleInfo::default())
        .unwrap()
        .add_input(GameControllerState::default())
        .unwrap()
        .add_input(TeamPlayers::default())
        .unwrap()
        .add_input(NtpData::default())
        .unwrap()
        .add_input(BallState::default())
        .unwrap()
        .add_input(RobotPosition::default())
        .unwrap()
        .add_input(BodyPose::default())
        .unwrap()
        .add_input(JointSensorData::default())
        .unwrap()
        .add_input(SonarData::default())
        .unwrap()
        .add_input(FootCollisionData::default())
        .unwrap()
        .add_input(RobotDetections::default())
        .unwrap()
        .add_input(WhistleData::default())
        .unwrap()
        .add_module(TeamBallFilter::new(config.team_ball, player))
        .unwrap()
        .add_module(BallSearchMapManager::new(config.search_map))
        .unwrap()
        .add_module(SearcherPositionProvider::new(config.searcher.clone(), player))
        .unwrap()
        .add_module(WorldStateProvider::new(config.world_state))
        .unwrap()
        .add_module(TimeToReachBallProvider::new(config.time_to_reach_ball))
        .unwrap()
        .add_module(PlayingRoleProvider::new(
            config.roles.clone(),
            config.time_to_reach_ball,
            player,
        ))
        .unwrap()
        .add_module(StrikerActionProvider::new(config.striker))
        .unwrap()
        .add_module(PenaltyStrikerActionProvider::new(config.penalty_striker))
        .unwrap()
        .add_module(SetPlayStrikerActionProvider::new(config.set_play_striker))
        .unwrap()
        .add_module(KeeperActionProvider::new(config.keeper))
        .unwrap()
        .add_module(ReplacementKeeperActionProvider::new())
        .unwrap()
        .add_module(DefendingPositionProvider::new(config.defender))
        .unwrap()
        .add_module(BishopPositionProvider::new(config.bishop))
        .unwrap()
        .add_module(SupportingPositionProvider::new(config.supporter, player))
        .unwrap()
        .add_module(LoserPositionProvider::new())
        .unwrap()
        .add_module(SetPositionProvider::new(config.set_position.clone(), player))
        .unwrap()
        .add_module(PointOfInterestsProvider::new())
        .unwrap()
        .add_module(ObstacleFilter::new(config.obstacles))
        .unwrap()
        .add_module(TeamObstacleFilter::new(config.obstacles))
        .unwrap()
        .add_module(BehaviorModule::new(config.behavior, player))
        .unwrap()
        .build()
        .unwrap()
}

fn set_playing(brain: &Brain) {
    let mut game = brain.database().get_mut::<GameControllerState>().unwrap();
    game.game_state = GameState::Playing;
    game.game_state_changed = Instant::now() - Duration::from_secs(30);
}

fn set_confident_ball(brain: &Brain, position: Point2<f32>) {
    let mut ball = brain.database().get_mut::<BallState>().unwrap();
    ball.position = position;
    ball.found = true;
    ball.confident = true;
    ball.age = Duration::from_millis(50);
    ball.time_when_last_seen = Instant::now();
}

fn set_localized(brain: &Brain) {
    let mut robot = brain.database().get_mut::<RobotPosition>().unwrap();
    robot.valid = true;
    robot.last_time_jumped = Instant::now() - Duration::from_secs(120);
}

#[test]
fn lone_striker_attacks_the_ball() {
    // spec boundary scenario: single robot, own ball confident at (1, 0), PLAYING
    let config = BrainConfig::default();
    let mut brain = build_pipeline(&config);

    set_playing(&brain);
    set_localized(&brain);
    set_confident_ball(&brain, Point2::new(1.0, 0.0));

    for _ in 0..3 {
        brain.tick().unwrap();
    }

    let team_ball = brain.database().get::<TeamBallModel>().unwrap();
    assert_eq!(team_ball.ball_type, BallType::Self_);
    assert!(team_ball.found);

    let roles = brain.database().get::<PlayingRoles>().unwrap();
    assert_eq!(roles.role, PlayingRole::Striker);

    // the behavior walks towards the ball (or already kicks)
    let action = brain.database().get::<ActionCommand>().unwrap();
    assert!(matches!(
        action.body,
        BodyCommand::Walk { .. } | BodyCommand::Kick { .. }
    ));
}

#[test]
fn penalized_robot_sits_out() {
    let config = BrainConfig::default();
    let mut brain = build_pipeline(&config);

    set_playing(&brain);
    set_localized(&brain);
    set_confident_ball(&brain, Point2::new(1.0, 0.0));
    brain
        .database()
        .get_mut::<GameControllerState>()
        .unwrap()
        .penalty = Penalty::Manual;

    brain.tick().unwrap();

    let action = brain.database().get::<ActionCommand>().unwrap();
    assert_eq!(action.body, BodyCommand::Penalized);

    let roles = brain.database().get::<PlayingRoles>().unwrap();
    assert_eq!(roles.role, PlayingRole::None);
}

#[test]
fn ready_walks_into_the_formation() {
    let config = BrainConfig::default();
    let mut brain = build_pipeline(&config);

    set_localized(&brain);
    {
        let mut game = brain.database().get_mut::<GameControllerState>().unwrap();
        game.game_state = GameState::Ready;
        game.kickoff = true;
    }

    brain.tick().unwrap();

    let action = brain.database().get::<ActionCommand>().unwrap();
    assert!(matches!(action.body, BodyCommand::Walk { .. }));

    // in READY the team ball is the rule ball on the kickoff spot
    let team_ball = brain.database().get::<TeamBallModel>().unwrap();
    assert_eq!(team_ball.ball_type, BallType::Rule);
}

#[test]
fn search_map_stays_normalized_across_the_pipeline() {
    let config = BrainConfig::default();
    let mut brain = build_pipeline(&config);

    set_playing(&brain);
    set_localized(&brain);
    set_confident_ball(&brain, Point2::new(2.0, -1.0));

    for _ in 0..20 {
        brain.tick().unwrap();
        let map = brain.database().get::<BallSearchMap>().unwrap();
        let sum = map.interior_sum();
        assert!((sum - 1.0).abs() < 1e-3, "interior sum drifted to {sum}");
    }
}
