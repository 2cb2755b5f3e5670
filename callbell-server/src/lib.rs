pub mod bootstrap;
pub mod config;
pub mod error;
pub mod hub;
pub mod signaling;
pub mod transport;

pub use bootstrap::Bootstrap;
pub use config::ServerConfig;
pub use error::{ConfigError, SignalError};
pub use hub::{HubObserver, HubStats, TracingObserver};
pub use signaling::SignalingService;
pub use transport::TransportKind;
