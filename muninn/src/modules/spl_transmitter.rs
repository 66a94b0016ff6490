use std::{
    net::{Ipv4Addr, SocketAddr, UdpSocket},
    time::{Duration, Instant},
};

use mimir::{Database, Module, Result, SlotInfo};
use miette::{Context, IntoDiagnostic};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::warn;

use gjallarhorn::serialization::Encode;
use gjallarhorn::team_message::{
    NtpRequest, NtpResponse, SearchSuggestion, SplMessage, TeamMessagePayload, WireObstacle,
    MAX_OBSTACLES, MAX_PLAYERS as WIRE_MAX_PLAYERS,
};

use crate::config::{PlayerConfig, SplNetworkConfig};
use crate::data::{
    ActionCommand, BallState, BodyPose, CycleInfo, JointSensorData, NtpData, ObstacleData,
    ObstacleType, PlayingRoles, ReceivedNtpRequest, RobotPosition, SearcherPosition,
    StrikerAction, TeamClock, TimeToReachBall, WhistleData,
};

use super::spl_receiver::TEAM_PORT_RANGE_START;

/// Builds and rate-limits the outgoing team message: self state, role election,
/// time-to-reach-ball bids, search suggestions, obstacles, and the NTP exchange.
pub struct SplMessageTransmitter {
    config: SplNetworkConfig,
    player: PlayerConfig,
    socket: UdpSocket,
    target: SocketAddr,
    last_transmission: Option<Instant>,
    last_ntp_request: Option<Instant>,
    /// NTP requests that arrived while we were not yet allowed to transmit.
    buffered_requests: Vec<ReceivedNtpRequest>,
}

impl SplMessageTransmitter {
    pub fn new(config: SplNetworkConfig, player: PlayerConfig) -> Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .into_diagnostic()
            .wrap_err("creating team message transmit socket")?;
        socket.set_broadcast(true).into_diagnostic()?;
        socket
            .bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)).into())
            .into_diagnostic()?;

        let port = TEAM_PORT_RANGE_START + u16::from(player.team_number);
        Ok(Self {
            config,
            player,
            socket: socket.into(),
            target: SocketAddr::from((Ipv4Addr::BROADCAST, port)),
            last_transmission: None,
            last_ntp_request: None,
            buffered_requests: Vec::new(),
        })
    }

    fn min_transmission_interval(&self) -> Duration {
        if self.config.msg_per_second <= 0.0 {
            Duration::MAX
        } else {
            Duration::from_secs_f32(1.0 / self.config.msg_per_second)
        }
    }
}

impl Module for SplMessageTransmitter {
    fn name(&self) -> &'static str {
        "spl_message_transmitter"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![
            SlotInfo::of::<ActionCommand>(),
            SlotInfo::of::<BallState>(),
            SlotInfo::of::<BodyPose>(),
            SlotInfo::of::<CycleInfo>(),
            SlotInfo::of::<JointSensorData>(),
            SlotInfo::of::<NtpData>(),
            SlotInfo::of::<ObstacleData>(),
            SlotInfo::of::<PlayingRoles>(),
            SlotInfo::of::<RobotPosition>(),
            SlotInfo::of::<SearcherPosition>(),
            SlotInfo::of::<StrikerAction>(),
            SlotInfo::of::<TeamClock>(),
            SlotInfo::of::<TimeToReachBall>(),
            SlotInfo::of::<WhistleData>(),
        ]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        Vec::new()
    }

    fn register(&self, _database: &mut Database) -> Result<()> {
        Ok(())
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let action_command = database.get::<ActionCommand>()?;
        let ball = database.get::<BallState>()?;
        let body_pose = database.get::<BodyPose>()?;
        let cycle_info = database.get::<CycleInfo>()?;
        let joints = database.get::<JointSensorData>()?;
        let ntp_data = database.get::<NtpData>()?;
        let obstacle_data = database.get::<ObstacleData>()?;
        let roles = database.get::<PlayingRoles>()?;
        let robot = database.get::<RobotPosition>()?;
        let searcher = database.get::<SearcherPosition>()?;
        let striker_action = database.get::<StrikerAction>()?;
        let clock = database.get::<TeamClock>()?;
        let time_to_reach_ball = database.get::<TimeToReachBall>()?;
        let whistle = database.get::<WhistleData>()?;

        // NTP requests are answered with the next frame we are allowed to send
        self.buffered_requests.extend(ntp_data.requests.iter().copied());

        let now = cycle_info.start_time;
        let allowed = self
            .last_transmission
            .map_or(true, |last| now.duration_since(last) >= self.min_transmission_interval());
        if !allowed {
            return Ok(());
        }

        let now_millis = clock.millis(now);

        let mut payload = TeamMessagePayload {
            is_pose_valid: robot.valid,
            head_yaw: joints.head_yaw,
            timestamp_last_jumped: clock.millis(robot.last_time_jumped),
            time_when_ball_was_seen: clock.millis(ball.time_when_last_seen),
            ball_velocity: [ball.velocity.x, ball.velocity.y],
            current_role: roles.role.into(),
            current_action: action_command.wire_action(),
            pass_target: if striker_action.valid {
                striker_action.pass_target
            } else {
                0
            },
            last_whistle_heard: whistle
                .last_time_whistle_heard
                .map_or(u32::MAX, |heard| clock.millis(heard)),
            ..Default::default()
        };

        if time_to_reach_ball.valid {
            payload.time_to_reach_ball =
                time_to_reach_ball.time_to_reach_ball.as_millis().min(3_600_000) as u32;
            payload.time_to_reach_ball_striker = time_to_reach_ball
                .time_to_reach_ball_striker
                .as_millis()
                .min(3_600_000) as u32;
        }

        for (index, role) in roles.player_roles.iter().take(WIRE_MAX_PLAYERS).enumerate() {
            payload.role_assignments[index] = (*role).into();
        }

        for (index, (position, valid)) in searcher
            .suggested_positions
            .iter()
            .zip(&searcher.suggestions_valid)
            .take(WIRE_MAX_PLAYERS)
            .enumerate()
        {
            payload.search_suggestions[index] = SearchSuggestion {
                position: [position.x, position.y],
                valid: *valid,
            };
        }

        for obstacle in &obstacle_data.obstacles {
            if payload.obstacles.len() >= MAX_OBSTACLES {
                break;
            }
            // sonar-only evidence is unclassified; keep it local unless configured
            if !self.config.send_sonar_obstacles && obstacle.obstacle_type == ObstacleType::Unknown
            {
                continue;
            }
            payload.obstacles.push(WireObstacle {
                center: [obstacle.relative_position.x, obstacle.relative_position.y],
                kind: obstacle.obstacle_type.into(),
            });
        }

        // periodically ask the team for our clock offset
        if self
            .last_ntp_request
            .map_or(true, |last| now.duration_since(last) >= self.config.ntp_request_interval)
        {
            self.last_ntp_request = Some(now);
            payload.ntp_request = Some(NtpRequest {
                origination: now_millis,
            });
        }

        payload.ntp_responses = self
            .buffered_requests
            .drain(..)
            .map(|request| NtpResponse {
                to: request.sender,
                origination: request.origination,
                receipt: request.receipt,
                sent: now_millis,
            })
            .collect();

        let mut payload_bytes = Vec::with_capacity(payload.encoded_len());
        payload
            .encode(&mut payload_bytes)
            .into_diagnostic()
            .wrap_err("encoding team message payload")?;

        let ball_age = if ball.found {
            cycle_info.age(ball.time_when_last_seen).as_secs_f32()
        } else {
            -1.0
        };
        let message = SplMessage::new(
            self.player.player_number,
            self.player.team_number,
            body_pose.fallen,
            [
                robot.pose.position.x,
                robot.pose.position.y,
                robot.pose.orientation,
            ],
            ball_age,
            [ball.position.x, ball.position.y],
            payload_bytes,
        )
        .into_diagnostic()?;

        let mut frame = Vec::with_capacity(message.encoded_len());
        message
            .encode(&mut frame)
            .into_diagnostic()
            .wrap_err("encoding team message frame")?;

        match self.socket.send_to(&frame, self.target) {
            Ok(_) => self.last_transmission = Some(now),
            Err(error) => warn!("failed to send team message: {error}"),
        }

        Ok(())
    }

    fn reload(&mut self, parameters: &toml::Value) -> Result<()> {
        self.config = super::parse_parameters(parameters)?;
        Ok(())
    }
}
