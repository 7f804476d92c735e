//! Progress reporting for strategy and chain runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use switchboard_application::ProgressNotifier;
use switchboard_domain::{NodeOutput, NodeType};

/// Spinner on stderr with one line per finished call or node
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(prefix: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        bar.set_prefix(prefix.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_node_start(&self, node_id: &str, node_type: NodeType) {
        self.bar.set_message(format!("{} ({})", node_id, node_type));
    }

    fn on_node_complete(&self, node_id: &str, output: &NodeOutput, elapsed: Duration) {
        let mut line = format!("{} {} {:>6}ms", "v".green(), node_id, elapsed.as_millis());
        if let Some(model) = &output.model_id {
            line.push_str(&format!(" {}", model.dimmed()));
        }
        if let Some(met) = output.condition_met {
            line.push_str(&format!(" -> {}", met));
        }
        self.bar.println(line);
    }

    fn on_call_complete(&self, model_id: &str, success: bool) {
        let status = if success {
            format!("{} {}", "v".green(), model_id)
        } else {
            format!("{} {}", "x".red(), model_id)
        };
        self.bar.println(status);
    }
}
