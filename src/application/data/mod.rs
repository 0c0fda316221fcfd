mod log_level;
mod threshold;

pub use log_level::LogLevel;
pub use threshold::Threshold;
