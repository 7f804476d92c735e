//! Tool handler implementations

mod builtin;

pub use builtin::{EchoTool, ExtractCodeTool, UppercaseTool, WordCountTool, builtin_registry};
