pub mod keyboard;
pub mod window;

pub use keyboard::map_key;
pub use window::{create_window, PlatformConfig};
