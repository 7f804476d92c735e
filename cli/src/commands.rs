//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use switchboard_domain::{ModelFilter, Strategy};

/// CLI arguments for switchboard
#[derive(Parser, Debug)]
#[command(name = "switchboard")]
#[command(author, version, about = "Route prompts across LLM providers")]
#[command(long_about = r#"
Switchboard sends prompts to models from several providers, fans them out
under a strategy (parallel, cascade, consensus, best-of-n) or runs them
through a chain graph of prompt, llm, tool, condition, merge and output nodes.

Configuration files are loaded from (in priority order):
1. SWITCHBOARD_* environment variables
2. --config <path>     Explicit config file
3. ./switchboard.toml  Project-level config
4. ~/.config/switchboard/config.toml   Global config

Example:
  switchboard call -m gpt-4o-mini "Explain lifetimes in one paragraph"
  switchboard call --vision --max-tier 1 "Describe the attached chart"
  switchboard fanout -s consensus -m gpt-4o-mini -m claude-3-5-haiku-latest "2+2?"
  switchboard chain pipeline.json --save pipeline
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Print machine-readable JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one prompt to one model, or to the cheapest model matching filters
    Call(CallArgs),

    /// Send one prompt to several models under a strategy
    Fanout(FanoutArgs),

    /// Run a chain graph from a JSON file or the graph library
    Chain(ChainArgs),

    /// List catalog models matching filters
    Models(FilterArgs),

    /// List saved graph names
    Graphs,

    /// Print the messages of a recorded conversation
    History {
        /// Conversation id
        conversation: String,
    },
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Prompt text
    pub prompt: String,

    /// Model to call; without it the cheapest matching model is chosen
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub sampling: SamplingArgs,

    /// Image URL to attach (repeatable)
    #[arg(long, value_name = "URL")]
    pub image: Vec<String>,

    /// Continue and record this conversation
    #[arg(long, value_name = "ID")]
    pub conversation: Option<String>,
}

#[derive(Args, Debug)]
pub struct FanoutArgs {
    /// Prompt text (not needed with --request)
    #[arg(required_unless_present = "request")]
    pub prompt: Option<String>,

    /// Models to call (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Fan-out strategy
    #[arg(short, long, default_value = "parallel")]
    pub strategy: Strategy,

    /// Agreeing answers needed for consensus
    #[arg(long, value_name = "N")]
    pub threshold: Option<usize>,

    /// System prompt sent to every model
    #[arg(long)]
    pub system: Option<String>,

    /// JSON strategy request `{prompt, models, strategy, consensusThreshold?}`
    #[arg(long, value_name = "PATH", conflicts_with_all = ["prompt", "model"])]
    pub request: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ChainArgs {
    /// Graph description file (`{nodes, edges}`)
    #[arg(required_unless_present = "saved")]
    pub file: Option<PathBuf>,

    /// Load the latest saved graph with this name instead of a file
    #[arg(long, value_name = "NAME", conflicts_with = "file")]
    pub saved: Option<String>,

    /// Save the graph under this name before running it
    #[arg(long, value_name = "NAME")]
    pub save: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct SamplingArgs {
    /// System prompt
    #[arg(long)]
    pub system: Option<String>,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,
}

/// Catalog filter flags
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Only models from this provider
    #[arg(long)]
    pub provider: Option<String>,

    /// Require image input support
    #[arg(long)]
    pub vision: bool,

    /// Require tool calling support
    #[arg(long)]
    pub tools: bool,

    /// Require streaming support
    #[arg(long)]
    pub streaming: bool,

    /// Highest acceptable cost tier
    #[arg(long, value_name = "TIER")]
    pub max_tier: Option<u8>,

    /// Smallest acceptable context window in tokens
    #[arg(long, value_name = "TOKENS")]
    pub min_context: Option<u32>,

    /// Required model tag
    #[arg(long)]
    pub tag: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> ModelFilter {
        let mut filter = ModelFilter::new();
        if let Some(provider) = &self.provider {
            filter = filter.with_provider(provider.clone());
        }
        if self.vision {
            filter = filter.with_vision();
        }
        if self.tools {
            filter = filter.with_tools();
        }
        if self.streaming {
            filter = filter.with_streaming();
        }
        if let Some(tier) = self.max_tier {
            filter = filter.with_max_cost_tier(tier);
        }
        if let Some(tokens) = self.min_context {
            filter = filter.with_min_context_window(tokens);
        }
        if let Some(tag) = &self.tag {
            filter = filter.with_tag(tag.clone());
        }
        filter
    }
}
