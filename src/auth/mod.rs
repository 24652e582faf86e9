//! Authentication module for tapi.
//!
//! Every `/todos` route requires the shared API key in the `X-API-Key`
//! header.

mod api_key;
mod middleware;

pub use api_key::*;
pub use middleware::*;
