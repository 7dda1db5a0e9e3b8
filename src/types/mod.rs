//! Core data types.

pub mod message;
pub mod request;

pub use message::{ChatMessage, FunctionCall, ParsedCall, RequestId, Role};
pub use request::{CancelRequest, ConfirmRequest, StartRequest};
