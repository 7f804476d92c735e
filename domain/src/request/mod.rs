//! Request/response value objects exchanged with the router.

pub mod message;
pub mod response;

pub use message::{Attachment, Request, Role, SamplingParams, Turn};
pub use response::{FinishReason, Response, Usage};
