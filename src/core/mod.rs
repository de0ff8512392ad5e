// Domain-layer modules and shared errors/models
pub mod indexer {
    pub use crate::indexer::*;
}

pub mod matcher {
    pub use crate::matcher::*;
}

pub mod speech {
    pub use crate::speech::*;
}

pub mod pipeline {
    pub use crate::pipeline::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
