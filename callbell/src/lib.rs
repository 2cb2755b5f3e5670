pub use callbell_core::model::{CallId, ClientEvent, ServerEvent, UserId};

pub mod model {
    pub use callbell_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use callbell_server::*;
}
