mod polling;
mod signaling_service;
mod ws_handler;

pub use polling::{close_poll, open_poll, poll_events, push_event};
pub use signaling_service::*;
pub use ws_handler::*;
