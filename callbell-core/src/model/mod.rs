mod call;
mod connection;
mod error;
mod event;
mod payload;
mod user;

pub use call::{CallEndReason, CallId, CallState};
pub use connection::ConnectionId;
pub use error::{DecodeError, ParseIdError};
pub use event::{ClientEvent, ServerEvent};
pub use payload::{
    CallAccepted, CallCancelled, CallEnded, CallRef, CallReject, CallRejected, CallRequest,
    ErrorCode, ErrorPayload, PresenceQuery, PresenceState, UserPresence,
};
pub use user::UserId;
