//! Action-level input state with both edge-triggered and level-triggered queries.
//!
//! Physical keys are translated into gameplay [`Action`]s through
//! [`KeyBindings`]. Several keys may drive the same action (arrow keys and WASD
//! both move the player), so an action stays held while *any* of its bound keys
//! is down.
//!
//! - **Level-triggered (held):** `is_pressed(action)` is true every tick the
//!   action is down. Used for movement and auto-fire.
//!
//! - **Edge-triggered (just_pressed):** true only until
//!   `end_tick()` runs. The loop calls `end_tick()` only after at least one
//!   fixed simulation tick has consumed the edges, so a tap that lands on a
//!   frame with zero ticks is not silently lost.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    Fire,
}

impl Action {
    pub const ALL: &'static [Action] = &[
        Action::MoveLeft,
        Action::MoveRight,
        Action::Jump,
        Action::Fire,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Escape,
    W,
    A,
    S,
    D,
    F,
    J,
}

/// Key → action table. Unbound keys produce no action.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<Key, Action>,
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn bind(&mut self, key: Key, action: Action) {
        if let Some(previous) = self.map.insert(key, action) {
            if previous != action {
                log::debug!("Rebound {:?} from {:?} to {:?}", key, previous, action);
            }
        }
    }

    pub fn action_for(&self, key: Key) -> Option<Action> {
        self.map.get(&key).copied()
    }

    pub fn keys_for(&self, action: Action) -> impl Iterator<Item = Key> + '_ {
        self.map
            .iter()
            .filter(move |(_, bound)| **bound == action)
            .map(|(key, _)| *key)
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings.bind(Key::Left, Action::MoveLeft);
        bindings.bind(Key::A, Action::MoveLeft);
        bindings.bind(Key::Right, Action::MoveRight);
        bindings.bind(Key::D, Action::MoveRight);
        bindings.bind(Key::Up, Action::Jump);
        bindings.bind(Key::W, Action::Jump);
        bindings.bind(Key::Space, Action::Jump);
        bindings.bind(Key::F, Action::Fire);
        bindings.bind(Key::J, Action::Fire);
        bindings
    }
}

/// Held actions for one tick, as recorded in replays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSnapshot {
    #[serde(default)]
    pub held: Vec<Action>,
}

impl ActionSnapshot {
    pub fn contains(&self, action: Action) -> bool {
        self.held.contains(&action)
    }
}

pub struct InputState {
    bindings: KeyBindings,
    keys_down: HashSet<Key>,
    held: HashSet<Action>,
    just_pressed: HashSet<Action>,
}

impl InputState {
    pub fn new() -> Self {
        Self::with_bindings(KeyBindings::default())
    }

    pub fn with_bindings(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            keys_down: HashSet::new(),
            held: HashSet::new(),
            just_pressed: HashSet::new(),
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Routes a physical key transition through the bindings.
    /// Returns the affected action, or `None` for unbound keys.
    pub fn handle_key(&mut self, key: Key, pressed: bool) -> Option<Action> {
        let action = self.bindings.action_for(key)?;
        if pressed {
            self.keys_down.insert(key);
            self.set_action(action, true);
        } else {
            self.keys_down.remove(&key);
            // A dual-bound action stays held while another of its keys is down.
            let still_down = self
                .bindings
                .keys_for(action)
                .any(|other| self.keys_down.contains(&other));
            if !still_down {
                self.set_action(action, false);
            }
        }
        Some(action)
    }

    pub fn set_action(&mut self, action: Action, pressed: bool) {
        if !pressed {
            self.held.remove(&action);
        } else if self.held.insert(action) {
            self.just_pressed.insert(action);
        }
    }

    /// Replaces the held set with `snapshot`, producing edges for every change.
    pub fn apply_snapshot(&mut self, snapshot: &ActionSnapshot) {
        for &action in Action::ALL {
            self.set_action(action, snapshot.contains(action));
        }
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn is_just_pressed(&self, action: Action) -> bool {
        self.just_pressed.contains(&action)
    }

    pub fn end_tick(&mut self) {
        self.just_pressed.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_action_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.set_action(Action::Jump, true);
        assert!(input.is_pressed(Action::Jump));
        assert!(input.is_just_pressed(Action::Jump));
    }

    #[test]
    fn test_release_clears_held() {
        let mut input = InputState::new();
        input.set_action(Action::Fire, true);
        input.set_action(Action::Fire, false);
        assert!(!input.is_pressed(Action::Fire));
    }

    #[test]
    fn test_repeated_press_is_idempotent() {
        let mut input = InputState::new();
        input.set_action(Action::Jump, true);
        input.end_tick();
        // Key repeat while held must not produce a second rising edge.
        input.set_action(Action::Jump, true);
        assert!(input.is_pressed(Action::Jump));
        assert!(!input.is_just_pressed(Action::Jump));
    }

    #[test]
    fn test_release_without_press_is_no_op() {
        let mut input = InputState::new();
        input.set_action(Action::MoveLeft, false);
        assert!(!input.is_pressed(Action::MoveLeft));
        assert!(!input.is_just_pressed(Action::MoveLeft));
    }

    #[test]
    fn test_end_tick_clears_edges_but_keeps_held() {
        let mut input = InputState::new();
        input.set_action(Action::MoveRight, true);
        input.set_action(Action::Jump, true);
        input.end_tick();
        assert!(!input.is_just_pressed(Action::MoveRight));
        assert!(!input.is_just_pressed(Action::Jump));
        assert!(input.is_pressed(Action::MoveRight));
        assert!(input.is_pressed(Action::Jump));
    }

    #[test]
    fn test_tap_between_ticks_survives_until_end_tick() {
        let mut input = InputState::new();
        input.set_action(Action::Jump, true);
        input.set_action(Action::Jump, false);
        assert!(!input.is_pressed(Action::Jump));
        assert!(input.is_just_pressed(Action::Jump));
    }

    #[test]
    fn test_unmapped_key_is_ignored() {
        let mut input = InputState::new();
        assert_eq!(input.handle_key(Key::Escape, true), None);
        assert_eq!(input.handle_key(Key::S, true), None);
        for &action in Action::ALL {
            assert!(!input.is_pressed(action));
        }
    }

    #[test]
    fn test_dual_binding_holds_until_both_keys_released() {
        let mut input = InputState::new();
        assert_eq!(input.handle_key(Key::Left, true), Some(Action::MoveLeft));
        input.handle_key(Key::A, true);
        input.handle_key(Key::Left, false);
        assert!(input.is_pressed(Action::MoveLeft));

        input.handle_key(Key::A, false);
        assert!(!input.is_pressed(Action::MoveLeft));
    }

    #[test]
    fn test_default_bindings_cover_every_action_twice() {
        let bindings = KeyBindings::default();
        for &action in Action::ALL {
            assert!(
                bindings.keys_for(action).count() >= 2,
                "{action:?} should have a dual binding"
            );
        }
    }

    #[test]
    fn test_apply_snapshot_produces_edges() {
        let mut input = InputState::new();
        input.apply_snapshot(&ActionSnapshot {
            held: vec![Action::MoveRight, Action::Fire],
        });
        assert!(input.is_just_pressed(Action::MoveRight));
        assert!(input.is_pressed(Action::Fire));
        input.end_tick();

        input.apply_snapshot(&ActionSnapshot {
            held: vec![Action::Fire],
        });
        assert!(!input.is_pressed(Action::MoveRight));
        assert!(!input.is_just_pressed(Action::Fire));
        assert!(input.is_pressed(Action::Fire));
    }

    #[test]
    fn test_action_names_parse_from_json() {
        let snapshot: ActionSnapshot =
            serde_json::from_str(r#"{ "held": ["move-left", "jump"] }"#).expect("parse");
        assert!(snapshot.contains(Action::MoveLeft));
        assert!(snapshot.contains(Action::Jump));
        assert!(!snapshot.contains(Action::Fire));
    }
}
