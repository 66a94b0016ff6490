use mimir::{Database, Module, Result, SlotInfo};
use nalgebra::{Point2, Vector2};

use crate::data::{BallType, LoserPosition, TeamBallModel};
use crate::math::Pose;

/// Positions the loser: half a meter behind the spot where the team ball was last known,
/// facing forward, so walking there backwards keeps the area in view.
pub struct LoserPositionProvider {
    last_known_team_ball: Point2<f32>,
}

impl LoserPositionProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_known_team_ball: Point2::origin(),
        }
    }
}

impl Default for LoserPositionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for LoserPositionProvider {
    fn name(&self) -> &'static str {
        "loser_position_provider"
    }

    fn dependencies(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<TeamBallModel>()]
    }

    fn productions(&self) -> Vec<SlotInfo> {
        vec![SlotInfo::of::<LoserPosition>()]
    }

    fn register(&self, database: &mut Database) -> Result<()> {
        database.register_production::<LoserPosition>()
    }

    fn cycle(&mut self, database: &Database) -> Result<()> {
        let team_ball = database.get::<TeamBallModel>()?;
        let mut loser = database.get_mut::<LoserPosition>()?;

        if team_ball.ball_type != BallType::None {
            self.last_known_team_ball = team_ball.position;
        }

        // always retreat backwards from the last known ball
        loser.pose = Pose::new(self.last_known_team_ball - Vector2::new(0.5, 0.0), 0.0);
        loser.valid = true;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mimir::App;

    #[test]
    fn loser_backs_off_from_the_last_known_ball() {
        let team_ball = TeamBallModel {
            ball_type: BallType::Team,
            position: Point2::new(1.0, 0.5),
            ..Default::default()
        };
        let mut brain = App::new()
            .add_input(team_ball)
            .unwrap()
            .add_module(LoserPositionProvider::new())
            .unwrap()
            .build()
            .unwrap();
        brain.tick().unwrap();

        // the ball vanishes, the target stays anchored to the last sighting
        brain.database().get_mut::<TeamBallModel>().unwrap().ball_type = BallType::None;
        brain.tick().unwrap();

        let loser = brain.database().get::<LoserPosition>().unwrap();
        assert!(loser.valid);
        assert_relative_eq!(loser.pose.position.x, 0.5);
        assert_relative_eq!(loser.pose.position.y, 0.5);
    }
}
