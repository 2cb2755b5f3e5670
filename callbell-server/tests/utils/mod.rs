pub mod mock_observer;
pub mod signal_helpers;
pub mod test_client;

pub use mock_observer::*;
pub use signal_helpers::*;
pub use test_client::*;
pub use test_server::*;
