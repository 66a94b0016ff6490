use mimir::DataType;
use nalgebra::{Point2, Vector2};

use crate::data::striker::KickType;
use crate::math::Pose;

use gjallarhorn::team_message::WireAction;

/// How a walk target should be approached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WalkMode {
    /// Plan a path around obstacles.
    #[default]
    PathPlanning,
    /// Walk straight at the target.
    Direct,
    /// Follow the given velocity instead of a target.
    Velocity,
}

/// An in-walk kick to execute while passing the ball, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InWalkKick {
    #[default]
    None,
    Gentle,
    Strong,
}

/// Keeper-specific motions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeeperMotion {
    #[default]
    Genuflect,
}

/// The body part of an action command.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum BodyCommand {
    /// All stiffness off.
    Dead,
    /// Stand still.
    #[default]
    Stand,
    /// Walk towards a target pose.
    Walk {
        target: Pose,
        mode: WalkMode,
        velocity: Vector2<f32>,
        in_walk_kick: InWalkKick,
    },
    /// Kick the ball from `source` towards `target`, robot-relative.
    Kick {
        source: Point2<f32>,
        target: Point2<f32>,
        kick_type: KickType,
    },
    /// Sit in the penalized posture.
    Penalized,
    /// Execute a keeper motion.
    Keeper { motion: KeeperMotion },
    /// Get up from the ground.
    StandUp,
    /// Freeze and hold the current posture.
    Hold,
}

/// The head part of an action command.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum HeadCommand {
    /// Let the head follow the body (no explicit head motion).
    #[default]
    Body,
    /// Drive the head to explicit angles.
    Angles {
        yaw: f32,
        pitch: f32,
        yaw_velocity: f32,
        pitch_velocity: f32,
    },
    /// Track a robot-relative ground point.
    LookAt {
        target: Point2<f32>,
        yaw_velocity: f32,
        pitch_velocity: f32,
    },
}

/// The arm part of an action command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArmCommand {
    /// Swing with the walk.
    #[default]
    Body,
    /// Pull the arm back to pass an obstacle.
    PullBack,
}

/// The eye LED part of an action command.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LedCommand {
    #[default]
    Off,
    Color { red: f32, green: f32, blue: f32 },
    Rainbow,
}

/// The one command the behavior emits per tick, consumed by the motion layer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActionCommand {
    pub body: BodyCommand,
    pub head: HeadCommand,
    pub left_arm: ArmCommand,
    pub right_arm: ArmCommand,
    pub left_led: LedCommand,
    pub right_led: LedCommand,
}

impl DataType for ActionCommand {
    fn reset(&mut self) {
        // overwritten by the behavior every tick; stand is the safe default
        self.body = BodyCommand::Stand;
        self.head = HeadCommand::Body;
    }
}

impl ActionCommand {
    #[must_use]
    pub fn dead() -> Self {
        Self {
            body: BodyCommand::Dead,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn stand() -> Self {
        Self {
            body: BodyCommand::Stand,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn penalized() -> Self {
        Self {
            body: BodyCommand::Penalized,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn stand_up() -> Self {
        Self {
            body: BodyCommand::StandUp,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn hold() -> Self {
        Self {
            body: BodyCommand::Hold,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn walk(target: Pose, mode: WalkMode) -> Self {
        Self {
            body: BodyCommand::Walk {
                target,
                mode,
                velocity: Vector2::zeros(),
                in_walk_kick: InWalkKick::None,
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn walk_velocity(velocity: Vector2<f32>, turn: f32) -> Self {
        Self {
            body: BodyCommand::Walk {
                target: Pose::new(Point2::origin(), turn),
                mode: WalkMode::Velocity,
                velocity,
                in_walk_kick: InWalkKick::None,
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn kick(source: Point2<f32>, target: Point2<f32>, kick_type: KickType) -> Self {
        Self {
            body: BodyCommand::Kick {
                source,
                target,
                kick_type,
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn keeper(motion: KeeperMotion) -> Self {
        Self {
            body: BodyCommand::Keeper { motion },
            ..Self::default()
        }
    }

    /// Replaces the head part, keeping everything else.
    #[must_use]
    pub fn combine_head(mut self, head: HeadCommand) -> Self {
        self.head = head;
        self
    }

    /// Replaces the left arm part, keeping everything else.
    #[must_use]
    pub fn combine_left_arm(mut self, arm: ArmCommand) -> Self {
        self.left_arm = arm;
        self
    }

    /// Replaces the right arm part, keeping everything else.
    #[must_use]
    pub fn combine_right_arm(mut self, arm: ArmCommand) -> Self {
        self.right_arm = arm;
        self
    }

    /// Replaces the left eye LED part, keeping everything else.
    #[must_use]
    pub fn combine_left_led(mut self, led: LedCommand) -> Self {
        self.left_led = led;
        self
    }

    /// Replaces the right eye LED part, keeping everything else.
    #[must_use]
    pub fn combine_right_led(mut self, led: LedCommand) -> Self {
        self.right_led = led;
        self
    }

    /// The wire tag for the body action, shared with teammates.
    #[must_use]
    pub fn wire_action(&self) -> WireAction {
        match self.body {
            BodyCommand::Dead => WireAction::Dead,
            BodyCommand::Stand => WireAction::Stand,
            BodyCommand::Walk { .. } => WireAction::Walk,
            BodyCommand::Kick { .. } => WireAction::Kick,
            BodyCommand::Penalized => WireAction::Penalized,
            BodyCommand::Keeper { .. } => WireAction::Keeper,
            BodyCommand::StandUp => WireAction::StandUp,
            BodyCommand::Hold => WireAction::Hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combiners_replace_only_their_part() {
        let command = ActionCommand::walk(Pose::default(), WalkMode::PathPlanning)
            .combine_head(HeadCommand::LookAt {
                target: Point2::new(1.0, 0.0),
                yaw_velocity: 0.5,
                pitch_velocity: 0.5,
            })
            .combine_left_led(LedCommand::Rainbow);

        assert!(matches!(command.body, BodyCommand::Walk { .. }));
        assert!(matches!(command.head, HeadCommand::LookAt { .. }));
        assert_eq!(command.left_led, LedCommand::Rainbow);
        assert_eq!(command.right_led, LedCommand::Off);
    }

    #[test]
    fn reset_falls_back_to_stand() {
        let mut command = ActionCommand::kick(
            Point2::new(0.2, 0.0),
            Point2::new(4.0, 0.0),
            KickType::Forward,
        );
        mimir::DataType::reset(&mut command);

        assert_eq!(command.body, BodyCommand::Stand);
    }
}
