use glam::Vec2;
use scroller_core::input::{Action, InputState};

use crate::config::{MotionProfile, MovementConfig};
use crate::ground::GroundUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

/// Jump impulses used since the player last touched ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JumpStage {
    Grounded = 0,
    First = 1,
    Second = 2,
}

impl JumpStage {
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// What the controller wants applied to the player body this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementCommand {
    pub velocity: Vec2,
    /// Stage entered if a jump launched this tick.
    pub jumped: Option<JumpStage>,
    pub facing: Facing,
    pub lock_orientation: bool,
}

pub struct MovementController {
    config: MovementConfig,
    stage: JumpStage,
    grounded: bool,
    facing: Facing,
}

impl MovementController {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            config,
            stage: JumpStage::Grounded,
            grounded: false,
            facing: Facing::Right,
        }
    }

    pub fn stage(&self) -> JumpStage {
        self.stage
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    fn profile(&self) -> MotionProfile {
        if self.grounded {
            self.config.grounded
        } else {
            self.config.airborne
        }
    }

    pub fn speed_limit(&self) -> f32 {
        self.profile().speed_limit
    }

    pub fn update(
        &mut self,
        input: &InputState,
        ground: GroundUpdate,
        velocity: Vec2,
    ) -> MovementCommand {
        self.grounded = ground.grounded;
        if ground.landed {
            if self.stage != JumpStage::Grounded {
                log::debug!("Landed, jump stage {} -> 0", self.stage.index());
            }
            self.stage = JumpStage::Grounded;
        } else if !self.grounded && self.stage == JumpStage::Grounded {
            // Walking off a ledge spends the ground jump; the air jump remains.
            self.stage = JumpStage::First;
        }

        let mut velocity = velocity;
        let jumped = if input.is_just_pressed(Action::Jump) {
            self.try_jump(&mut velocity)
        } else {
            None
        };

        // Profile is picked after the jump so the launch tick already obeys
        // the airborne limit.
        let profile = self.profile();
        let left = input.is_pressed(Action::MoveLeft);
        let right = input.is_pressed(Action::MoveRight);
        if left {
            velocity.x -= profile.accel;
        }
        if right {
            velocity.x += profile.accel;
        }
        if !left && !right && !self.grounded {
            velocity.x *= self.config.air_drift_decay;
        }
        velocity.x = velocity.x.clamp(-profile.speed_limit, profile.speed_limit);

        if velocity.x > self.config.facing_deadband {
            self.facing = Facing::Right;
        } else if velocity.x < -self.config.facing_deadband {
            self.facing = Facing::Left;
        }

        MovementCommand {
            velocity,
            jumped,
            facing: self.facing,
            lock_orientation: true,
        }
    }

    fn try_jump(&mut self, velocity: &mut Vec2) -> Option<JumpStage> {
        match self.stage {
            JumpStage::Grounded if self.grounded => {
                velocity.y = -self.config.jump_speed;
                self.stage = JumpStage::First;
                self.grounded = false;
                log::debug!("Jump (stage 1)");
                Some(JumpStage::First)
            }
            JumpStage::First if !self.grounded => {
                velocity.y = -self.config.double_jump_speed;
                self.stage = JumpStage::Second;
                log::debug!("Double jump (stage 2)");
                Some(JumpStage::Second)
            }
            stage => {
                log::debug!("Jump rejected at stage {}", stage.index());
                None
            }
        }
    }
}
