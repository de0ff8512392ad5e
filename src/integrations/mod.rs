//! External service integrations.

pub mod mintapi_client {
    pub use crate::mintapi_client::*;
}

pub mod account_cache {
    pub use crate::account_cache::*;
}

pub mod alexa_models {
    pub use crate::alexa_models::*;
}
