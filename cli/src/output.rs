//! Console and JSON formatting of run results

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use switchboard_application::{ChatMessage, UsageReport};
use switchboard_domain::{ChainOutput, Model, MultiCallResult, Response};

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn response(response: &Response) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(&format!(
            "{} via {}",
            response.model_id, response.provider_id
        )));
        output.push_str(response.content.trim());
        output.push('\n');
        output.push_str(
            &format!(
                "\n[{} tokens, {}ms, ${:.6}, {:?}]\n",
                response.usage.total_tokens,
                response.latency_ms(),
                response.cost,
                response.finish_reason
            )
            .dimmed()
            .to_string(),
        );
        output
    }

    pub fn multi(result: &MultiCallResult) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(&format!("Strategy: {}", result.strategy)));

        if let Some(best) = &result.best {
            output.push_str(&format!(
                "{} {}\n{}\n\n",
                "Best:".cyan().bold(),
                best.model_id,
                best.content.trim()
            ));
        }

        if let Some(consensus) = &result.consensus {
            let verdict = consensus.outcome.to_string();
            let verdict = if consensus.outcome.is_agreed() {
                verdict.green().bold()
            } else {
                verdict.yellow().bold()
            };
            output.push_str(&format!(
                "{} {} ({} of threshold {}, {} clusters)\n",
                "Consensus:".cyan().bold(),
                verdict,
                consensus.cluster_size,
                consensus.threshold,
                consensus.clusters
            ));
            if !consensus.members.is_empty() {
                output.push_str(&format!("Agreeing: {}\n", consensus.members.join(", ")));
            }
            output.push('\n');
        }

        for (rank, response) in result.responses.iter().enumerate() {
            output.push_str(&format!(
                "{}\n{}\n\n",
                format!("── #{} {} ──", rank + 1, response.model_id)
                    .yellow()
                    .bold(),
                response.content.trim()
            ));
        }

        for failure in &result.failures {
            output.push_str(&format!(
                "{}\nError: {}\n\n",
                format!("── {} ──", failure.model_id).red().bold(),
                failure.error
            ));
        }

        output.push_str(
            &format!(
                "[{}/{} succeeded, {}ms, ${:.6}]\n",
                result.responses.len(),
                result.attempted(),
                result.total_time.as_millis(),
                result.total_cost
            )
            .dimmed()
            .to_string(),
        );
        output
    }

    pub fn chain(result: &ChainOutput) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Chain output"));
        output.push_str(&result.output);
        output.push('\n');

        if let Some(code) = &result.generated_code {
            output.push_str(&format!("\n{}\n{}\n", "Generated code:".cyan().bold(), code));
        }

        output.push_str(
            &format!(
                "\n[{} nodes, {}ms, ${:.6}]\n",
                result.nodes_executed,
                result.total_time.as_millis(),
                result.total_cost
            )
            .dimmed()
            .to_string(),
        );
        output
    }

    pub fn models(models: &[&Model]) -> String {
        if models.is_empty() {
            return "No models match.\n".to_string();
        }
        let width = models.iter().map(|m| m.id.len()).max().unwrap_or(0);
        models
            .iter()
            .map(|model| {
                format!(
                    "{:<width$}  {:<10} tier {}  ctx {:>7}  {}\n",
                    model.id.bold(),
                    model.provider_id,
                    model.cost_tier,
                    model.context_window,
                    model.tags.join(",").dimmed(),
                    width = width
                )
            })
            .collect()
    }

    pub fn history(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .map(|message| {
                let who = match &message.model_id {
                    Some(model) => format!("{} ({})", message.role.as_str(), model),
                    None => message.role.as_str().to_string(),
                };
                format!("{} {}\n{}\n\n", who.cyan().bold(), message.created_at.dimmed(), message.content)
            })
            .collect()
    }

    pub fn usage(report: &UsageReport) -> String {
        if report.providers.is_empty() {
            return String::new();
        }
        let mut output = format!("\n{}\n", "Usage".cyan().bold());
        for line in &report.providers {
            output.push_str(&format!(
                "  {:<12} {:>3} calls  {:>7} tokens  ${:.6}\n",
                line.provider_id,
                line.ledger.calls,
                line.ledger.total_tokens(),
                line.ledger.total_cost
            ));
        }
        output.push_str(&format!("  {:<12} ${:.6}\n", "total", report.total_cost));
        output
    }

    fn header(title: &str) -> String {
        format!("{}\n\n", format!("== {} ==", title).bold())
    }
}

/// Pretty JSON of a result together with the usage snapshot
pub fn to_json(result: impl serde::Serialize, usage: &UsageReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({
        "result": result,
        "usage": usage,
    }))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use switchboard_domain::{FinishReason, Strategy, Usage};

    fn response(model: &str, content: &str) -> Response {
        Response {
            content: content.to_string(),
            usage: Usage::new(10, 5),
            finish_reason: FinishReason::Stop,
            latency: Duration::from_millis(120),
            cost: 0.001,
            provider_id: "alpha".to_string(),
            model_id: model.to_string(),
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_multi_lists_failures() {
        colored::control::set_override(false);
        let result = MultiCallResult {
            strategy: Strategy::Parallel,
            responses: vec![response("a1", "four")],
            best: Some(response("a1", "four")),
            total_cost: 0.001,
            total_time: Duration::from_millis(130),
            success: true,
            failures: vec![switchboard_domain::CallFailure {
                model_id: "b1".to_string(),
                error: "Provider beta returned HTTP 500".to_string(),
                retryable: true,
            }],
            consensus: None,
        };
        let text = ConsoleFormatter::multi(&result);
        assert!(text.contains("Best: a1"));
        assert!(text.contains("── b1 ──"));
        assert!(text.contains("[1/2 succeeded"));
    }

    #[test]
    fn test_json_wraps_result_and_usage() {
        let json = to_json(response("a1", "hi"), &UsageReport::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["result"]["model_id"], "a1");
        assert_eq!(value["usage"]["total_cost"], 0.0);
    }
}
