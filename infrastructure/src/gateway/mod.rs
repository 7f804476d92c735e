//! HTTP provider gateway and the wire formats it speaks.

mod anthropic;
mod http;
mod openai;

pub use http::{Credentials, HttpProviderGateway};
