pub mod input;
pub mod time;

pub use input::{Action, ActionSnapshot, InputState, Key, KeyBindings};
pub use time::{Clock, ManualClock, SystemClock, TimeState};
