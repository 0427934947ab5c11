use scroller_core::input::{Action, ActionSnapshot};
use scroller_core::time::{Clock, ManualClock};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::game::{Game, TickReport};
use crate::simulation::Simulation;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_tick_ms")]
    pub fixed_dt_ms: u64,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub held: Vec<Action>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<ActionSnapshot> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(ActionSnapshot {
                    held: frame.held.clone(),
                });
            }
        }
        out
    }
}

/// Feeds every expanded frame through `game`, advancing `clock` by
/// `fixed_dt_ms` after each tick.
pub fn run_replay<S: Simulation>(
    game: &mut Game<S>,
    replay: &ReplaySequence,
    clock: &ManualClock,
) -> Vec<TickReport> {
    let inputs = replay.expanded_inputs();
    let mut reports = Vec::with_capacity(inputs.len());
    for snapshot in &inputs {
        game.apply_snapshot(snapshot);
        reports.push(game.tick(clock.now_ms()));
        clock.advance(replay.fixed_dt_ms);
    }
    reports
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt_ms == 0 {
        return Err("Replay validation failed: fixed_dt_ms must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_tick_ms() -> u64 {
    16
}

const fn default_repeat() -> u32 {
    1
}
