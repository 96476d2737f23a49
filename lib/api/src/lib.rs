pub mod error;
pub mod rest;

pub use error::{ApiError, ErrorBody};
pub use rest::{configure, cors_policy, parse_cors_origin, AppState, RestApi};
