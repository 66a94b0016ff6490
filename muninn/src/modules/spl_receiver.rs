use std::{
    collections::{HashMap, VecDeque},
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
use nalgebra::{Point2, Vector2};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};

use gjallarhorn::serialization::Decode;
use gjallarhorn::team_message::{SplMessage, TeamMessagePayload};

use crate::config::{PlayerConfig, SplNetworkConfig};
use crate::data::{
    AudioRequest, CycleInfo, GameControllerState, NtpData, Obstacle, ReceivedNtpRequest,
    TeamClock, TeamPlayer, TeamPlayers,
};
use crate::math::Pose;

/// The base of the team broadcast port range; the actual port is this plus the team
/// number.
pub const TEAM_PORT_RANGE_START: u16 = 10000;

/// How many NTP measurements per teammate the offset selection looks back over.
const NTP_WINDOW: usize = 8;

/// One NTP measurement against a teammate.
#[derive(Clone, Copy)]
struct NtpMeasurement {
    /// Their clock minus ours, milliseconds.
    offset: i64,
    round_trip: i64,
}

/// Ingests team messages: validates and parses frames from the staging queue, answers
/// the embedded NTP exchange, shifts all teammate timestamps onto the local clock, and
/// maintains the teammate table.
pub struct SplMessageReceiver {
    config: SplNetworkConfig,
    player: PlayerConfig,
    queue: Arc<Mutex<VecDeque<(Instant, SocketAddr, SplMessage)>>>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    /// The teammate table, preserved across cycles.
    players: Vec<TeamPlayer>,
    /// NTP measurements per teammate.
    ntp: HashMap<u8, VecDeque<NtpMeasurement>>,
    dropped_frames: u64,
}

impl SplMessageReceiver {
    pub fn new(config: SplNetworkConfig, player: PlayerConfig) -> Result<Self> {
        let port = TEAM_PORT_RANGE_START + u16::from(player.team_number);
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .into_diagnostic()
            .wrap_err("creating team message socket")?;
        socket.set_reuse_address(true).into_diagnostic()?;
        socket.set_broadcast(true).into_diagnostic()?;
        socket
            .set_read_timeout(Some(Duration::from_millis(500)))
            .into_diagnostic()?;
        socket
            .bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)).into())
            .into_diagnostic()
            .wrap_err("binding team message port")?;
        let socket: UdpSocket = socket.into();

        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let thread = std::thread::Builder::new()
            .name("spl-message-rx".to_string())
            .spawn({
                let queue = Arc::clone(&queue);
                let stop = Arc::clone(&stop);
                move || receive_loop(&socket, &queue, &stop)
            })
            .into_diagnostic()?;

        Ok(Self {
            config,
            player,
            queue,
            stop,
            thread: Some(thread),
            players: Vec::new(),
            ntp: HashMap::new(),
            dropped_frames: 0,
        })
    }

    /// The current best clock offset for a teammate: the measurement with the smallest
    /// round trip in the rolling window.
    fn offset_for(&self, player_number: u8) -> Option<i64> {
        self.ntp
            .get(&player_number)?
            .iter()
            .min_by_key(|measurement| measurement.round_trip)
            .map(|measurement| measurement.offset)
    }

    /// Converts a sender-local timestamp into a local instant using the NTP offset; when
    /// no offset is known yet, `fallback` is used.
    fn shift_timestamp(
        &self,
        clock: &TeamClock,
        player_number: u8,
        remote_millis: u32,
        fallback: Instant,
    ) -> Instant {
        match self.offset_for(player_number) {
            Some(offset) => clock.instant(i64::from(remote_millis) - offset),
            None => fallback,
        }
    }

    fn integrate_message(
        &mut self,
        clock: &TeamClock,
        game: &GameControllerState,
        arrival: Instant,
        message: &SplMessage,
        payload: &TeamMessagePayload,
    ) {
        let number = message.player_num;

        // NTP responses addressed to us update the offset estimate
        let arrival_millis = i64::from(clock.millis(arrival));
        for response in &payload.ntp_responses {
            if response.to != self.player.player_number {
                continue;
            }
            let t0 = i64::from(response.origination);
            let t1 = i64::from(response.receipt);
            let t2 = i64::from(response.sent);
            let t3 = arrival_millis;
            let offset = ((t1 - t0) + (t2 - t3)) / 2;
            let round_trip = (t3 - t0) - (t2 - t1);

            let window = self.ntp.entry(number).or_default();
            window.push_back(NtpMeasurement { offset, round_trip });
            while window.len() > NTP_WINDOW {
                window.pop_front();
            }
        }

        let player = match self
            .players
            .iter_mut()
            .find(|player| player.player_number == number)
        {
            Some(player) => player,
            None => {
                self.players.push(TeamPlayer::new(number));
                self.players.last_mut().expect("just pushed")
            }
        };

        player.pose = Pose::new(
            Point2::new(message.pose[0], message.pose[1]),
            message.pose[2],
        );
        player.is_pose_valid = payload.is_pose_valid;
        player.fallen = message.fallen;
        player.head_yaw = payload.head_yaw;
        player.ball_position = Point2::new(message.ball[0], message.ball[1]);
        player.ball_velocity = Vector2::new(payload.ball_velocity[0], payload.ball_velocity[1]);
        player.penalized = game.is_player_penalized(number);
        player.currently_performing_role = payload.current_role.into();
        player.role_assignments = payload
            .role_assignments
            .iter()
            .map(|&role| role.into())
            .collect();
        player.current_action = payload.current_action;
        player.current_pass_target = payload.pass_target;
        player.local_obstacles = payload
            .obstacles
            .iter()
            .map(|obstacle| {
                Obstacle::new(
                    Point2::new(obstacle.center[0], obstacle.center[1]),
                    obstacle.kind.into(),
                )
            })
            .collect();
        player.suggested_search_positions = payload
            .search_suggestions
            .iter()
            .map(|suggestion| Point2::new(suggestion.position[0], suggestion.position[1]))
            .collect();
        player.suggested_search_positions_valid = payload
            .search_suggestions
            .iter()
            .map(|suggestion| suggestion.valid)
            .collect();
        player.last_message_received = arrival;

        // timestamps cross the module boundary on the local clock
        let fallback_age = if message.ball_age >= 0.0 {
            Duration::from_secs_f32(message.ball_age.min(3600.0))
        } else {
            Duration::from_secs(3600)
        };
        let ball_seen_fallback = arrival.checked_sub(fallback_age).unwrap_or(arrival);

        let time_when_ball_was_seen = self.shift_timestamp(
            clock,
            number,
            payload.time_when_ball_was_seen,
            ball_seen_fallback,
        );
        let timestamp_last_jumped =
            self.shift_timestamp(clock, number, payload.timestamp_last_jumped, arrival);
        let last_whistle_heard = (payload.last_whistle_heard != u32::MAX).then(|| {
            self.shift_timestamp(clock, number, payload.last_whistle_heard, arrival)
        });

        let player = self
            .players
            .iter_mut()
            .find(|player| player.player_number == number)
            .expect("player was just inserted");
        player.time_when_ball_was_seen = time_when_ball_was_seen;
        player.timestamp_last_jumped = timestamp_last_jumped;
        player.last_time_whistle_heard = last_whistle_heard;
        player.time_when_reach_ball =
            arrival + Duration::from_millis(u64::from(payload.time_to_reach_ball.min(3_600_000)));
        player.time_when_reach_ball_striker = arrival
            + Duration::from_millis(u64::from(payload.time_to_reach_ball_striker.min(3_600_000)));
    }
}

fn receive_loop(
    socket: &UdpSocket,
    queue: &Mutex<VecDeque<(Instant, SocketAddr, SplMessage)>>,
    stop: &AtomicBool,
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
                warn!("team message receive failed: {error}");
                continue;
            }
        };

        match SplMessage::decode(&mut &buffer[..len]) {
            Ok(message) => {
                let mut queue = queue.lock().expect("queue lock poisoned");
                queue.push_back((Instant::now(), sender, message));
                // bound the queue so a burst can never grow it without limit
                while queue.len() > 64 {
                    queue.pop_front();
                }
            }
            Err(error) => debug!("dropping malformed team message from {sender}: {error}"),
        }
    }
}

impl Drop for SplMessageReceiver {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Module for SplMessageReceiver {
    fn name(&self) -> &'static str {
        "spl_message_receiver"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<CycleInfo>(),
            SlotInfo::of::<GameControllerState>(),
            SlotInfo::of::<TeamClock>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<TeamPlayers>(),
            SlotInfo::of::<NtpData>(),
            SlotInfo::of::<AudioRequest>(),
        ]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<TeamPlayers>()?;
        database.register_production::<NtpData>()?;
        database.register_production::<AudioRequest>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let cycle_info = database.get::<CycleInfo>()?;
        let game = database.get::<GameControllerState>()?;
        let clock = database.get::<TeamClock>()?;

        let frames: Vec<_> = {
            let mut queue = self.queue.lock().expect("queue lock poisoned");
            queue.drain(..).collect()
        };

        for (arrival, _sender, message) in frames {
            if message.team_num != self.player.team_number
                || message.player_num == 0
                || usize::from(message.player_num) > crate::data::MAX_PLAYERS
            {
                continue;
            }
            if message.player_num == self.player.player_number {
                if self.config.enable_player_number_warning {
                    warn!(
                        "another robot claims our player number {}",
                        self.player.player_number
                    );
                    let mut audio = database.get_mut::<AudioRequest>()?;
                    audio
                        .phrases
                        .push(format!("same player number {}", self.player.player_number));
                }
                continue;
            }

            let payload = match TeamMessagePayload::decode(&mut message.payload.as_slice()) {
                Ok(payload) => payload,
                Err(error) => {
                    self.dropped_frames += 1;
                    debug!(
                        "dropping unparseable payload from player {} ({} so far): {error}",
                        message.player_num, self.dropped_frames
                    );
                    continue;
                }
            };

            if let Some(request) = payload.ntp_request {
                let mut ntp_data = database.get_mut::<NtpData>()?;
                ntp_data.requests.push(ReceivedNtpRequest {
                    sender: message.player_num,
                    origination: request.origination,
                    receipt: clock.millis(arrival),
                });
            }

            self.integrate_message(&clock, &game, arrival, &message, &payload);
        }

        // a teammate that went silent is removed from the table
        let timeout = self.config.teammate_timeout;
        let now = cycle_info.start_time;
        self.players
            .retain(|player| now.saturating_duration_since(player.last_message_received) < timeout);

        // refresh penalties for rows that had no fresh message this tick
        for player in &mut self.players {
            player.penalized = game.is_player_penalized(player.player_number);
        }

        let mut team_players = database.get_mut::<TeamPlayers>()?;
        team_players.players = self.players.clone();
        team_players.active_player_count = self
            .players
            .iter()
            .filter(|player| !player.penalized)
            .count() as u32
            + u32::from(game.penalty == gjallarhorn::game_controller::Penalty::None);

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
    fn zero_delay_ntp_yields_zero_offset() {
        // with identical clocks and no network delay every timestamp coincides
        let t0 = 1000_i64;
        let t1 = 1000_i64;
        let t2 = 1200_i64;
        let t3 = 1200_i64;

        let offset = ((t1 - t0) + (t2 - t3)) / 2;
        let round_trip = (t3 - t0) - (t2 - t1);

        assert_eq!(offset, 0);
        assert_eq!(round_trip, 0);
    }

    #[test]
    fn smallest_round_trip_wins_the_window() {
        let mut window: VecDeque<NtpMeasurement> = VecDeque::new();
        window.push_back(NtpMeasurement {
            offset: 80,
            round_trip: 40,
        });
        window.push_back(NtpMeasurement {
            offset: 50,
            round_trip: 4,
        });
        window.push_back(NtpMeasurement {
            offset: 95,
            round_trip: 60,
        });

        let best = window
            .iter()
            .min_by_key(|measurement| measurement.round_trip)
            .unwrap();
        assert_eq!(best.offset, 50);
    }
}
