use std::{
    net::{Ipv4Addr, SocketAddr, UdpSocket},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use mimir::{Database, Module, Result, SlotInfo};
use miette::{Context, IntoDiagnostic};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};

use gjallarhorn::game_controller::{
    GameControllerMessage, GameControllerReturnMessage, GamePhase, Penalty, ReturnStatus,
    GAME_CONTROLLER_DATA_PORT, GAME_CONTROLLER_RETURN_PORT,
};
use gjallarhorn::serialization::{Decode, Encode};

use crate::config::{GameControllerConfig, PlayerConfig};
use crate::data::game_state::GameState;
use crate::data::{BallState, BodyPose, ButtonData, CycleInfo, GameControllerState, RobotPosition};

/// The staging buffer the receive thread writes into and `cycle` drains.
#[derive(Default)]
struct Staging {
    message: Option<(GameControllerMessage, SocketAddr, Instant)>,
    new_data: bool,
}

/// The GameController client: a background thread receives referee datagrams into a
/// staging buffer; `cycle` merges the latest datagram with button events into the
/// [`GameControllerState`] and answers the referee so the robot shows up in its UI.
///
/// Without network data (for [`GameControllerConfig::network_timeout`]) the chest button
/// drives the state machine: a single press in INITIAL penalizes the robot, pressing
/// again unpenalizes it straight into PLAYING.
pub struct GameControllerClient {
    config: GameControllerConfig,
    player: PlayerConfig,
    staging: Arc<Mutex<Staging>>,
    socket: Arc<UdpSocket>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    /// Referee state preserved across cycles.
    internal: GameControllerState,
    latest_network_data: Option<Instant>,
    last_sender: Option<SocketAddr>,
    last_handled_chest_press: Option<Instant>,
    last_handled_head_hold: Option<Instant>,
    last_return_message: Option<Instant>,
    pending_status: ReturnStatus,
}

impl GameControllerClient {
    pub fn new(config: GameControllerConfig, player: PlayerConfig) -> Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .into_diagnostic()
            .wrap_err("creating game controller socket")?;
        socket.set_reuse_address(true).into_diagnostic()?;
        socket
            .set_read_timeout(Some(Duration::from_millis(500)))
            .into_diagnostic()?;
        socket
            .bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, GAME_CONTROLLER_DATA_PORT)).into())
            .into_diagnostic()
            .wrap_err("binding game controller port")?;
        let socket: Arc<UdpSocket> = Arc::new(socket.into());

        let staging = Arc::new(Mutex::new(Staging::default()));
        let stop = Arc::new(AtomicBool::new(false));

        let thread = std::thread::Builder::new()
            .name("game-controller-rx".to_string())
            .spawn({
                let socket = Arc::clone(&socket);
                let staging = Arc::clone(&staging);
                let stop = Arc::clone(&stop);
                let team_number = player.team_number;
                move || receive_loop(&socket, &staging, &stop, team_number)
            })
            .into_diagnostic()?;

        Ok(Self {
            config,
            player,
            staging,
            socket,
            stop,
            thread: Some(thread),
            internal: GameControllerState::default(),
            latest_network_data: None,
            last_sender: None,
            last_handled_chest_press: None,
            last_handled_head_hold: None,
            last_return_message: None,
            pending_status: ReturnStatus::Alive,
        })
    }

    /// Merges a referee datagram into the state, tracking change timestamps.
    fn integrate_network_message(
        state: &mut GameControllerState,
        message: &GameControllerMessage,
        player: &PlayerConfig,
        now: Instant,
    ) {
        let Some(team) = message.team(player.team_number) else {
            return;
        };

        if state.game_state != message.state {
            state.game_state = message.state;
            state.game_state_changed = now;
        }
        if state.set_play != message.set_play {
            state.set_play = message.set_play;
            state.set_play_changed = now;
        }

        state.game_phase = message.game_phase;
        state.kicking_team = message.kicking_team == player.team_number;
        state.kickoff = state.kicking_team;
        state.players_per_team = message.players_per_team;
        state.first_half = message.first_half == gjallarhorn::game_controller::Half::First;
        state.team_color = team.field_color;
        state.secondary_time = Duration::from_secs(message.secondary_time.max(0) as u64);
        state.remaining_time = Duration::from_secs(message.secs_remaining.max(0) as u64);

        state.penalties = team
            .players
            .iter()
            .take(usize::from(message.players_per_team))
            .map(|robot| robot.penalty)
            .collect();
        state.penalty = team
            .players
            .get(usize::from(player.player_number) - 1)
            .map_or(Penalty::None, |robot| robot.penalty);
        state.last_message_received = Some(now);
    }

    /// The button fallback state machine, active while the referee network is silent.
    fn handle_buttons(
        state: &mut GameControllerState,
        buttons: &ButtonData,
        last_handled_chest: &mut Option<Instant>,
        last_handled_head: &mut Option<Instant>,
        force_penalty_shootout: bool,
        now: Instant,
    ) -> ReturnStatus {
        let mut status = ReturnStatus::Alive;

        if let Some(press) = buttons.last_chest_button_single_press {
            if Some(press) != *last_handled_chest {
                *last_handled_chest = Some(press);
                match (state.game_state, state.penalty) {
                    (GameState::Initial, Penalty::None) => {
                        // ready to play: penalized until the referee (or the next press)
                        // releases the robot
                        state.penalty = Penalty::Manual;
                        state.game_state_changed = now;
                        status = ReturnStatus::ManuallyPenalised;
                    }
                    (_, penalty) if penalty != Penalty::None => {
                        state.penalty = Penalty::None;
                        state.game_state = GameState::Playing;
                        state.game_state_changed = now;
                        status = ReturnStatus::ManuallyUnpenalised;
                    }
                    _ => {}
                }
            }
        }

        if let Some(press) = buttons.last_chest_button_long_press {
            if Some(press) != *last_handled_chest && state.penalty != Penalty::None {
                *last_handled_chest = Some(press);
                state.penalty = Penalty::None;
                state.game_state = GameState::Playing;
                state.game_state_changed = now;
                status = ReturnStatus::ManuallyUnpenalised;
            }
        }

        if let Some(hold) = buttons.last_head_buttons_hold {
            if Some(hold) != *last_handled_head
                && state.game_state == GameState::Initial
                && force_penalty_shootout
            {
                *last_handled_head = Some(hold);
                state.game_phase = GamePhase::PenaltyShoot;
            }
        }

        status
    }

    fn send_return_message(
        &mut self,
        robot: &RobotPosition,
        ball: &BallState,
        body_pose: &BodyPose,
        now: Instant,
    ) {
        let Some(sender) = self.last_sender else {
            return;
        };
        if self
            .last_return_message
            .is_some_and(|last| now.duration_since(last) < self.config.return_delay)
        {
            return;
        }
        self.last_return_message = Some(now);

        let ball_age = if ball.found {
            ball.age.as_secs_f32()
        } else {
            -1.0
        };
        let message = GameControllerReturnMessage::new(
            self.player.player_number,
            self.player.team_number,
            std::mem::replace(&mut self.pending_status, ReturnStatus::Alive),
            body_pose.fallen,
            [
                robot.pose.position.x * 1000.0,
                robot.pose.position.y * 1000.0,
                robot.pose.orientation,
            ],
            ball_age,
            [ball.position.x * 1000.0, ball.position.y * 1000.0],
        );

        let mut buffer = Vec::with_capacity(message.encoded_len());
        if message.encode(&mut buffer).is_ok() {
            let target = SocketAddr::new(sender.ip(), GAME_CONTROLLER_RETURN_PORT);
            if let Err(error) = self.socket.send_to(&buffer, target) {
                warn!("failed to answer the game controller: {error}");
            }
        }
    }
}

fn receive_loop(
    socket: &UdpSocket,
    staging: &Mutex<Staging>,
    stop: &AtomicBool,
    team_number: u8,
) {
    let mut buffer = [0_u8; 1024];
    while !stop.load(Ordering::Relaxed) {
        let (len, sender) = match socket.recv_from(&mut buffer) {
            Ok(received) => received,
            Err(error)
                if matches!(
                    error.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                continue;
            }
            Err(error) => {
                warn!("game controller receive failed: {error}");
                continue;
            }
        };

        let Ok(message) = GameControllerMessage::decode(&mut &buffer[..len]) else {
            debug!("dropping malformed game controller datagram from {sender}");
            continue;
        };
        if !message.is_valid() || message.team(team_number).is_none() {
            continue;
        }

        let mut staging = staging.lock().expect("staging lock poisoned");
        staging.message = Some((message, sender, Instant::now()));
        staging.new_data = true;
    }
}

impl Drop for GameControllerClient {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Module for GameControllerClient {
    fn name(&self) -> &'static str {
        "game_controller_client"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<BallState>(),
            SlotInfo::of::<BodyPose>(),
            SlotInfo::of::<ButtonData>(),
            SlotInfo::of::<CycleInfo>(),
            SlotInfo::of::<RobotPosition>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<GameControllerState>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<GameControllerState>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let ball = database.get::<BallState>()?;
        let body_pose = database.get::<BodyPose>()?;
        let buttons = database.get::<ButtonData>()?;
        let cycle_info = database.get::<CycleInfo>()?;
        let robot = database.get::<RobotPosition>()?;
        let mut state = database.get_mut::<GameControllerState>()?;

        let now = cycle_info.start_time;

        // move staging to tick-visible state in a brief critical section
        let staged = {
            let mut staging = self.staging.lock().expect("staging lock poisoned");
            staging.new_data = false;
            staging.message.take()
        };
        if let Some((message, sender, received)) = staged {
            self.latest_network_data = Some(received);
            self.last_sender = Some(sender);
            Self::integrate_network_message(&mut self.internal, &message, &self.player, now);
        }

        // stale network data is forgotten; the button fallback takes over
        let network_fresh = self
            .latest_network_data
            .is_some_and(|received| now.duration_since(received) < self.config.network_timeout);
        if !network_fresh {
            if self.latest_network_data.take().is_some() {
                warn!("lost connection to the game controller");
                self.last_sender = None;
            }
            let status = Self::handle_buttons(
                &mut self.internal,
                &buttons,
                &mut self.last_handled_chest_press,
                &mut self.last_handled_head_hold,
                self.config.force_penalty_shootout,
                now,
            );
            if status != ReturnStatus::Alive {
                self.pending_status = status;
            }
        }

        self.send_return_message(&robot, &ball, &body_pose, now);

        *state = self.internal.clone();
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

    #[test]
    fn chest_press_in_initial_penalizes_then_unpenalizes_into_playing() {
        // boundary scenario: single chest press in INITIAL
        let mut state = GameControllerState::default();
        let mut last_chest = None;
        let mut last_head = None;
        let now = Instant::now();

        let buttons = ButtonData {
            last_chest_button_single_press: Some(now),
            ..Default::default()
        };
        let status = GameControllerClient::handle_buttons(
            &mut state,
            &buttons,
            &mut last_chest,
            &mut last_head,
            false,
            now,
        );

        assert_eq!(state.penalty, Penalty::Manual);
        assert_eq!(status, ReturnStatus::ManuallyPenalised);

        // the same press is not handled twice
        let status = GameControllerClient::handle_buttons(
            &mut state,
            &buttons,
            &mut last_chest,
            &mut last_head,
            false,
            now,
        );
        assert_eq!(status, ReturnStatus::Alive);
        assert_eq!(state.penalty, Penalty::Manual);

        // the next press releases the robot into PLAYING
        let second_press = now + Duration::from_secs(1);
        let buttons = ButtonData {
            last_chest_button_single_press: Some(second_press),
            ..Default::default()
        };
        let status = GameControllerClient::handle_buttons(
            &mut state,
            &buttons,
            &mut last_chest,
            &mut last_head,
            false,
            second_press,
        );
        assert_eq!(status, ReturnStatus::ManuallyUnpenalised);
        assert_eq!(state.penalty, Penalty::None);
        assert_eq!(state.game_state, GameState::Playing);
    }

    #[test]
    fn head_button_hold_forces_penalty_shootout_when_configured() {
        let mut state = GameControllerState::default();
        let mut last_chest = None;
        let mut last_head = None;
        let now = Instant::now();

        let buttons = ButtonData {
            last_head_buttons_hold: Some(now),
            ..Default::default()
        };

        GameControllerClient::handle_buttons(
            &mut state,
            &buttons,
            &mut last_chest,
            &mut last_head,
            false,
            now,
        );
        assert_eq!(state.game_phase, GamePhase::Normal);

        GameControllerClient::handle_buttons(
            &mut state,
            &buttons,
            &mut last_chest,
            &mut last_head,
            true,
            now,
        );
        assert_eq!(state.game_phase, GamePhase::PenaltyShoot);
    }

    #[test]
    fn referee_datagram_is_merged_with_change_timestamps() {
        use gjallarhorn::game_controller::{
            GameState as WireGameState, SetPlay, GAME_CONTROLLER_STRUCT_HEADER,
            GAME_CONTROLLER_STRUCT_VERSION,
        };

        let player = PlayerConfig {
            player_number: 3,
            team_number: 8,
        };
        let mut message = GameControllerMessage {
            header: GAME_CONTROLLER_STRUCT_HEADER,
            version: GAME_CONTROLLER_STRUCT_VERSION,
            players_per_team: 5,
            state: WireGameState::Playing,
            set_play: SetPlay::KickIn,
            kicking_team: 8,
            secs_remaining: 400,
            secondary_time: 25,
            ..Default::default()
        };
        message.teams[0].team_number = 8;
        message.teams[0].players[2].penalty = Penalty::PlayerPushing;
        message.teams[1].team_number = 24;

        let mut state = GameControllerState::default();
        let now = Instant::now();
        GameControllerClient::integrate_network_message(&mut state, &message, &player, now);

        assert_eq!(state.game_state, GameState::Playing);
        assert_eq!(state.game_state_changed, now);
        assert_eq!(state.set_play, SetPlay::KickIn);
        assert!(state.kicking_team);
        assert_eq!(state.penalty, Penalty::PlayerPushing);
        assert!(state.is_player_penalized(3));
        assert!(!state.is_player_penalized(1));
        assert_eq!(state.secondary_time, Duration::from_secs(25));
    }
}
