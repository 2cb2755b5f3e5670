mod call_table;
mod connection_registry;
mod hub;
mod hub_command;
mod hub_observer;
mod switchboard;

pub use call_table::*;
pub use connection_registry::*;
pub use hub::*;
pub use hub_command::*;
pub use hub_observer::*;
pub use switchboard::*;
