//! API token endpoints
//!
//! Every route acts on the authenticated requester's own tokens. Tokens owned
//! by anyone else are reported as missing.

mod handlers;
pub(crate) mod models;

pub(crate) use handlers::*;
