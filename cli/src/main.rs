//! CLI entrypoint for switchboard
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod output;
mod progress;

use anyhow::{Context, Result, bail};
use clap::Parser;
use commands::{CallArgs, ChainArgs, Cli, Command, FanoutArgs};
use output::{ConsoleFormatter, to_json};
use progress::ProgressReporter;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use switchboard_application::{
    ChainExecutor, ChatHistory, GraphLibrary, NoProgress, OrchestrationParams, ProgressNotifier,
    RecordStore, SingleCallRouter, StrategyEngine,
};
use switchboard_domain::request::Attachment;
use switchboard_domain::{ChainGraph, GraphDescription, Request, StrategyRequest};
use switchboard_infrastructure::{
    ConfigLoader, FileConfig, HttpProviderGateway, JsonlRecordStore, MemoryRecordStore,
    builtin_registry,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

type Router = SingleCallRouter<HttpProviderGateway>;

/// Everything a subcommand needs, built once from configuration
struct App {
    router: Router,
    params: OrchestrationParams,
    store: Arc<dyn RecordStore>,
    json: bool,
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let Some(command) = cli.command else {
        bail!("No command given. Run `switchboard --help` for usage.");
    };

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    config.validate().context("Invalid configuration")?;

    info!("Starting switchboard");

    let app = App::build(&config, cli.json, cli.quiet)?;
    app.run(command).await
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Initialize logging based on verbosity level
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("--log-file must name a file: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Could not create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

impl App {
    fn build(config: &FileConfig, json: bool, quiet: bool) -> Result<Self> {
        let params = config.orchestration.to_params();

        // === Dependency Injection ===
        let catalog = Arc::new(config.to_catalog());
        let gateway = Arc::new(
            HttpProviderGateway::new(config.credentials(), params.call_timeout)
                .context("Failed to create HTTP client")?,
        );
        let router = SingleCallRouter::new(gateway, catalog).with_call_timeout(params.call_timeout);

        let store: Arc<dyn RecordStore> = match &config.store.path {
            Some(path) => Arc::new(
                JsonlRecordStore::open(path)
                    .with_context(|| format!("Failed to open store at {}", path.display()))?,
            ),
            None => Arc::new(MemoryRecordStore::new()),
        };

        Ok(Self {
            router,
            params,
            store,
            json,
            quiet,
        })
    }

    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Call(args) => self.call(args).await?,
            Command::Fanout(args) => self.fanout(args).await?,
            Command::Chain(args) => self.chain(args).await?,
            Command::Models(filter) => {
                let models = self.router.catalog().list_models(&filter.to_filter());
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&models)?);
                } else {
                    print!("{}", ConsoleFormatter::models(&models));
                }
                return Ok(());
            }
            Command::Graphs => {
                let names = GraphLibrary::new(Arc::clone(&self.store)).names().await?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&names)?);
                } else {
                    for name in names {
                        println!("{}", name);
                    }
                }
                return Ok(());
            }
            Command::History { conversation } => {
                let messages = ChatHistory::new(Arc::clone(&self.store))
                    .conversation(&conversation)
                    .await?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&messages)?);
                } else {
                    print!("{}", ConsoleFormatter::history(&messages));
                }
                return Ok(());
            }
        }

        if !self.json {
            print!("{}", ConsoleFormatter::usage(&self.router.accountant().snapshot()));
        }
        Ok(())
    }

    async fn call(&self, args: CallArgs) -> Result<()> {
        let history = ChatHistory::new(Arc::clone(&self.store));

        let mut request = Request::new(args.prompt);
        if let Some(system) = args.sampling.system {
            request = request.with_system_prompt(system);
        }
        if let Some(temperature) = args.sampling.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = args.sampling.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        for url in args.image {
            request = request.with_attachment(Attachment::Image { url });
        }
        if let Some(conversation) = &args.conversation {
            request = request.with_history(history.history(conversation).await?);
        }

        let response = match &args.model {
            Some(model) => self.router.call(&request, model).await?,
            None => {
                self.router
                    .call_best_fit(&request, &args.filter.to_filter())
                    .await?
            }
        };

        if let Some(conversation) = &args.conversation {
            history.record_exchange(conversation, &request, &response).await?;
        }

        if self.json {
            println!("{}", to_json(&response, &self.router.accountant().snapshot())?);
        } else {
            print!("{}", ConsoleFormatter::response(&response));
        }
        Ok(())
    }

    async fn fanout(&self, args: FanoutArgs) -> Result<()> {
        let request = match (&args.request, args.prompt) {
            (Some(path), _) => read_json::<StrategyRequest>(path)?,
            (None, Some(prompt)) => {
                let mut request = StrategyRequest::new(prompt, args.model, args.strategy);
                if let Some(threshold) = args.threshold {
                    request = request.with_consensus_threshold(threshold);
                }
                request.system_prompt = args.system;
                request
            }
            (None, None) => bail!("A prompt or --request file is required"),
        };

        let engine = StrategyEngine::new(self.router.clone())
            .with_consensus_threshold(self.params.consensus_threshold);

        let reporter = self.reporter(request.strategy.as_str());
        let progress: &dyn ProgressNotifier = match &reporter {
            Some(reporter) => reporter,
            None => &NoProgress,
        };
        let result = engine.run_with_progress(&request, progress).await?;
        if let Some(reporter) = reporter {
            reporter.finish();
        }

        if !result.success {
            warn!(strategy = %result.strategy, "No model produced an answer");
        }

        if self.json {
            println!("{}", to_json(&result, &self.router.accountant().snapshot())?);
        } else {
            print!("{}", ConsoleFormatter::multi(&result));
        }
        Ok(())
    }

    async fn chain(&self, args: ChainArgs) -> Result<()> {
        let library = GraphLibrary::new(Arc::clone(&self.store));

        let description = match (&args.file, &args.saved) {
            (Some(path), _) => read_json::<GraphDescription>(path)?,
            (None, Some(name)) => library.load(name).await?,
            (None, None) => bail!("A graph file or --saved name is required"),
        };

        let graph = ChainGraph::from_description(&description)?;
        graph.execution_order()?;

        if let Some(name) = &args.save {
            let id = library.save(name, &description).await?;
            info!(graph = %name, id = %id, "Graph saved");
        }

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let executor = ChainExecutor::new(self.router.clone(), Arc::new(builtin_registry()))
            .with_merge_separator(self.params.merge_separator.clone())
            .with_cancellation(cancel);

        let reporter = self.reporter("chain");
        let progress: &dyn ProgressNotifier = match &reporter {
            Some(reporter) => reporter,
            None => &NoProgress,
        };
        let result = executor.execute_with_progress(&graph, progress).await?;
        if let Some(reporter) = reporter {
            reporter.finish();
        }

        if self.json {
            println!("{}", to_json(&result, &self.router.accountant().snapshot())?);
        } else {
            print!("{}", ConsoleFormatter::chain(&result));
        }
        Ok(())
    }

    fn reporter(&self, prefix: &str) -> Option<ProgressReporter> {
        (!self.quiet && !self.json).then(|| ProgressReporter::new(prefix))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}
