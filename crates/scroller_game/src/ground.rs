//! Grounded detection from collision data.
//!
//! `grounded` is reset at the start of every tick and has to be re-confirmed
//! by a supporting contact: a contact between the player and a known static
//! collider whose point lies at least `support_threshold` below the player's
//! center (+y is down). Side and ceiling contacts never qualify.
//!
//! Collision *start* events only fire when a contact begins, so feeding them
//! alone would make a standing player flicker ungrounded. The policy decides
//! what the scheduler feeds in:
//!  - `PersistentContacts`: every contact the player currently holds.
//!  - `CollisionStartWithGrace`: only start events, with `grounded` held for
//!    `grace_ticks` after the last qualifying one (coyote time).

use std::collections::HashSet;

use glam::Vec2;
use serde::Deserialize;

use crate::simulation::{BodyHandle, ContactPair};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GroundingPolicy {
    #[default]
    PersistentContacts,
    CollisionStartWithGrace {
        grace_ticks: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroundUpdate {
    pub grounded: bool,
    /// Grounded went false -> true on this tick.
    pub landed: bool,
}

pub struct GroundContactDetector {
    player: BodyHandle,
    static_colliders: HashSet<BodyHandle>,
    support_threshold: f32,
    policy: GroundingPolicy,
    grounded: bool,
    grace_remaining: u32,
}

impl GroundContactDetector {
    pub fn new(player: BodyHandle, support_threshold: f32, policy: GroundingPolicy) -> Self {
        Self {
            player,
            static_colliders: HashSet::new(),
            support_threshold,
            policy,
            grounded: false,
            grace_remaining: 0,
        }
    }

    pub fn policy(&self) -> GroundingPolicy {
        self.policy
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn register_static(&mut self, handle: BodyHandle) {
        self.static_colliders.insert(handle);
    }

    pub fn unregister_static(&mut self, handle: BodyHandle) {
        self.static_colliders.remove(&handle);
    }

    pub fn is_static_collider(&self, handle: BodyHandle) -> bool {
        self.static_colliders.contains(&handle)
    }

    /// Drops grounded and any remaining grace. Called when the player launches
    /// a jump so the old support cannot re-ground them.
    pub fn clear(&mut self) {
        self.grounded = false;
        self.grace_remaining = 0;
    }

    pub fn update(&mut self, player_center: Vec2, contacts: &[ContactPair]) -> GroundUpdate {
        let was_grounded = self.grounded;
        self.grounded = false;

        let supported = contacts
            .iter()
            .any(|pair| self.is_supporting(pair, player_center));

        match self.policy {
            GroundingPolicy::PersistentContacts => {
                self.grounded = supported;
            }
            GroundingPolicy::CollisionStartWithGrace { grace_ticks } => {
                if supported {
                    self.grounded = true;
                    self.grace_remaining = grace_ticks;
                } else if self.grace_remaining > 0 {
                    self.grace_remaining -= 1;
                    self.grounded = true;
                }
            }
        }

        GroundUpdate {
            grounded: self.grounded,
            landed: self.grounded && !was_grounded,
        }
    }

    fn is_supporting(&self, pair: &ContactPair, player_center: Vec2) -> bool {
        let Some(other) = pair.other(self.player) else {
            return false;
        };
        if !self.static_colliders.contains(&other) {
            log::trace!("Skipping contact with non-world body {:?}", other);
            return false;
        }
        pair.points
            .iter()
            .any(|point| point.y >= player_center.y + self.support_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: BodyHandle = BodyHandle(1);
    const GROUND: BodyHandle = BodyHandle(2);
    const WALL: BodyHandle = BodyHandle(3);
    const CENTER: Vec2 = Vec2::new(100.0, 100.0);

    fn detector(policy: GroundingPolicy) -> GroundContactDetector {
        let mut detector = GroundContactDetector::new(PLAYER, 10.0, policy);
        detector.register_static(GROUND);
        detector.register_static(WALL);
        detector
    }

    fn contact(other: BodyHandle, point: Vec2) -> ContactPair {
        ContactPair {
            body_a: PLAYER,
            body_b: other,
            points: vec![point],
        }
    }

    fn floor_contact() -> ContactPair {
        contact(GROUND, Vec2::new(100.0, 130.0))
    }

    #[test]
    fn contact_beneath_grounds_player() {
        let mut detector = detector(GroundingPolicy::PersistentContacts);
        let update = detector.update(CENTER, &[floor_contact()]);
        assert!(update.grounded);
        assert!(update.landed);
    }

    #[test]
    fn side_and_ceiling_contacts_do_not_ground() {
        let mut detector = detector(GroundingPolicy::PersistentContacts);
        let side = contact(WALL, Vec2::new(120.0, 105.0));
        let ceiling = contact(GROUND, Vec2::new(100.0, 70.0));
        assert!(!detector.update(CENTER, &[side, ceiling]).grounded);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut detector = detector(GroundingPolicy::PersistentContacts);
        let edge = contact(GROUND, Vec2::new(100.0, 110.0));
        assert!(detector.update(CENTER, &[edge]).grounded);
        let just_short = contact(GROUND, Vec2::new(100.0, 109.9));
        assert!(!detector.update(CENTER, &[just_short]).grounded);
    }

    #[test]
    fn unknown_bodies_and_foreign_pairs_are_skipped() {
        let mut detector = detector(GroundingPolicy::PersistentContacts);
        let projectile = contact(BodyHandle(99), Vec2::new(100.0, 140.0));
        let foreign = ContactPair {
            body_a: BodyHandle(50),
            body_b: GROUND,
            points: vec![Vec2::new(100.0, 140.0)],
        };
        assert!(!detector.update(CENTER, &[projectile, foreign]).grounded);
    }

    #[test]
    fn grounded_resets_every_tick_without_contacts() {
        let mut detector = detector(GroundingPolicy::PersistentContacts);
        assert!(detector.update(CENTER, &[floor_contact()]).grounded);
        let update = detector.update(CENTER, &[]);
        assert!(!update.grounded);
        assert!(!update.landed);
    }

    #[test]
    fn landed_fires_only_on_transition() {
        let mut detector = detector(GroundingPolicy::PersistentContacts);
        assert!(detector.update(CENTER, &[floor_contact()]).landed);
        let second = detector.update(CENTER, &[floor_contact()]);
        assert!(second.grounded);
        assert!(!second.landed);
    }

    #[test]
    fn grace_window_holds_grounded_then_expires() {
        let mut detector = detector(GroundingPolicy::CollisionStartWithGrace { grace_ticks: 3 });
        assert!(detector.update(CENTER, &[floor_contact()]).landed);
        for tick in 0..3 {
            let update = detector.update(CENTER, &[]);
            assert!(update.grounded, "grace tick {tick}");
            assert!(!update.landed);
        }
        assert!(!detector.update(CENTER, &[]).grounded);
    }

    #[test]
    fn clear_cancels_grace() {
        let mut detector = detector(GroundingPolicy::CollisionStartWithGrace { grace_ticks: 5 });
        detector.update(CENTER, &[floor_contact()]);
        detector.clear();
        assert!(!detector.is_grounded());
        assert!(!detector.update(CENTER, &[]).grounded);
    }

    #[test]
    fn unregistered_static_no_longer_supports() {
        let mut detector = detector(GroundingPolicy::PersistentContacts);
        detector.unregister_static(GROUND);
        assert!(!detector.is_static_collider(GROUND));
        assert!(!detector.update(CENTER, &[floor_contact()]).grounded);
    }
}
