//! Built-in text tools
//!
//! Small deterministic transformers available to every chain without
//! configuration.

use async_trait::async_trait;
use serde_json::{Value, json};
use switchboard_application::{ToolError, ToolHandler, ToolOutput, ToolRegistry};

/// Registry holding every built-in tool.
pub fn builtin_registry() -> ToolRegistry {
    ToolRegistry::new()
        .register(EchoTool)
        .register(WordCountTool)
        .register(UppercaseTool)
        .register(ExtractCodeTool)
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoTool;

#[async_trait]
impl ToolHandler for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    async fn run(&self, input: &str, _args: &Value) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::text(input))
    }
}

/// Counts words; `data` carries `{words, lines, chars}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCountTool;

#[async_trait]
impl ToolHandler for WordCountTool {
    fn name(&self) -> &str {
        "word_count"
    }

    async fn run(&self, input: &str, _args: &Value) -> Result<ToolOutput, ToolError> {
        let words = input.split_whitespace().count();
        let data = json!({
            "words": words,
            "lines": input.lines().count(),
            "chars": input.chars().count(),
        });
        Ok(ToolOutput::text(words.to_string()).with_data(data))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UppercaseTool;

#[async_trait]
impl ToolHandler for UppercaseTool {
    fn name(&self) -> &str {
        "uppercase"
    }

    async fn run(&self, input: &str, _args: &Value) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::text(input.to_uppercase()))
    }
}

/// Pulls the first fenced code block into `generated_code`.
///
/// An optional `language` argument restricts the search to blocks tagged
/// with that language. Input without a matching block passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractCodeTool;

#[async_trait]
impl ToolHandler for ExtractCodeTool {
    fn name(&self) -> &str {
        "extract_code"
    }

    async fn run(&self, input: &str, args: &Value) -> Result<ToolOutput, ToolError> {
        let language = match args.get("language") {
            None | Some(Value::Null) => None,
            Some(Value::String(lang)) => Some(lang.as_str()),
            Some(other) => {
                return Err(ToolError::InvalidArgs(format!(
                    "language must be a string, got {}",
                    other
                )));
            }
        };

        Ok(match find_fenced_block(input, language) {
            Some(block) => ToolOutput::text(block.code.clone())
                .with_generated_code(block.code)
                .with_data(json!({ "language": block.language })),
            None => ToolOutput::text(input),
        })
    }
}

#[derive(Debug, PartialEq)]
struct FencedBlock {
    language: Option<String>,
    code: String,
}

fn find_fenced_block(input: &str, language: Option<&str>) -> Option<FencedBlock> {
    let mut lines = input.lines();
    while let Some(line) = lines.next() {
        let Some(tag) = line.trim_start().strip_prefix("```") else {
            continue;
        };
        let tag = tag.trim();
        let body: Vec<&str> = lines
            .by_ref()
            .take_while(|l| !l.trim_start().starts_with("```"))
            .collect();

        let wanted = language.is_none_or(|lang| tag.eq_ignore_ascii_case(lang));
        if wanted {
            return Some(FencedBlock {
                language: (!tag.is_empty()).then(|| tag.to_string()),
                code: body.join("\n"),
            });
        }
    }
    None
}
