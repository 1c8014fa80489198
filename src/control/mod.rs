pub mod fan;

pub use fan::{FanController, FanError, FanStatus};
