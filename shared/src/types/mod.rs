pub mod json_error;
pub mod progress;
pub mod server_config;

pub use self::json_error::ErrorResponse;
pub use self::progress::{ProgressEvent, StreamPayload, progress_for};
pub use self::server_config::{AppConfig, ConfigError, ServerConfig, StreamConfig};
