//! Cross-cutting HTTP middleware that is not part of the auth gates.

pub mod logging;

pub use logging::{request_logging, REQUEST_ID_HEADER};
