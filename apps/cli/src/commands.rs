//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use opsplit_core::{SplitOptions, Splitter, titles};
use opsplit_gateway::{GenerationParams, create_backend};
use opsplit_kb::KnowledgeBase;
use opsplit_shared::{
    AppConfig, BackendConfig, BackendKind, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// opsplit — decompose coarse operation sequences into executable sub-steps.
#[derive(Parser)]
#[command(
    name = "opsplit",
    version,
    about = "Split coarse operation descriptions into atomic, agent-executable sub-steps.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Split an operation sequence into sub-steps.
    Split {
        /// Operation text, or a path to a file containing it.
        input: String,

        /// Output file path (console output when omitted); in batch mode,
        /// the output directory.
        #[arg(short, long)]
        output: Option<String>,

        /// Knowledge-base directory (overrides config).
        #[arg(short = 'k', long)]
        knowledge_base: Option<String>,

        /// Config file path.
        #[arg(short = 'c', long)]
        config: Option<String>,

        /// Batch mode: the input file holds one operation per line.
        #[arg(short, long)]
        batch: bool,

        /// Backend kind override: openai, anthropic, ollama, or mock.
        #[arg(long)]
        backend: Option<String>,

        /// Model name override.
        #[arg(long)]
        model: Option<String>,

        /// Omit the knowledge-base digest from the prompt.
        #[arg(long)]
        no_context: bool,
    },

    /// Query the knowledge base.
    Kb {
        /// Knowledge-base directory (overrides config).
        #[arg(short = 'k', long)]
        knowledge_base: Option<String>,

        /// Config file path.
        #[arg(short = 'c', long)]
        config: Option<String>,

        #[command(subcommand)]
        action: KbAction,
    },

    /// Extract the most prominent title from each HTML file in a directory.
    Titles {
        /// Directory containing HTML files.
        #[arg(short, long)]
        directory: String,

        /// Output JSON report path.
        #[arg(short, long)]
        output: String,

        /// Recurse into subdirectories.
        #[arg(short, long)]
        recursive: bool,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Knowledge-base subcommands.
#[derive(Subcommand)]
pub(crate) enum KbAction {
    /// List all operation names.
    List,
    /// List all operation ids.
    Ids,
    /// Show one operation record by name or id.
    Show { operation: String },
    /// Keyword search over names, contexts, and scenes.
    Search { keyword: String },
    /// Filter operations by feature or scene.
    Category { keyword: String },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "opsplit=info",
        1 => "opsplit=debug",
        _ => "opsplit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Split {
            input,
            output,
            knowledge_base,
            config,
            batch,
            backend,
            model,
            no_context,
        } => {
            cmd_split(
                &input,
                output.as_deref(),
                knowledge_base.as_deref(),
                config.as_deref(),
                batch,
                backend.as_deref(),
                model.as_deref(),
                no_context,
            )
            .await
        }
        Command::Kb {
            knowledge_base,
            config,
            action,
        } => cmd_kb(knowledge_base.as_deref(), config.as_deref(), action),
        Command::Titles {
            directory,
            output,
            recursive,
        } => cmd_titles(&directory, &output, recursive),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// split
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
async fn cmd_split(
    input: &str,
    output: Option<&str>,
    knowledge_base: Option<&str>,
    config_path: Option<&str>,
    batch: bool,
    backend_override: Option<&str>,
    model_override: Option<&str>,
    no_context: bool,
) -> Result<()> {
    let mut config = load_app_config(config_path)?;

    if let Some(kind) = backend_override {
        config.backend.kind = kind.parse::<BackendKind>()?;
    }
    if let Some(model) = model_override {
        config.backend.model = model.to_string();
    }

    let kb_path = knowledge_base.unwrap_or(&config.defaults.knowledge_base);
    info!(kb = kb_path, backend = %config.backend.kind, "initializing splitter");

    let kb = KnowledgeBase::load(kb_path)?;
    println!(
        "  Knowledge base: {} ({} operations, {} file(s) skipped)",
        kb_path,
        kb.len(),
        kb.skipped()
    );

    let backend_config = BackendConfig::resolve(&config.backend)?;
    let backend = create_backend(&backend_config)?;
    let params = GenerationParams {
        temperature: config.backend.temperature,
        max_tokens: config.backend.max_tokens,
    };

    let splitter = Splitter::new(kb, backend, params, config.defaults.context_max_chars);

    let opts = SplitOptions {
        include_context: config.defaults.include_context && !no_context,
        output_filename: None,
    };

    let operations = read_operations(input, batch)?;

    if operations.len() == 1 {
        split_single(&splitter, &operations[0], output, &opts).await
    } else {
        split_batch(&splitter, &operations, output, &opts).await
    }
}

/// Read the operation list: a file path yields its contents (one
/// operation per line in batch mode), anything else is literal text.
fn read_operations(input: &str, batch: bool) -> Result<Vec<String>> {
    let path = Path::new(input);
    if !path.exists() {
        return Ok(vec![input.to_string()]);
    }

    let content = std::fs::read_to_string(path)?;
    let operations: Vec<String> = if batch {
        content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    } else {
        vec![content.trim().to_string()]
    };

    if operations.is_empty() {
        return Err(eyre!("input file '{input}' contains no operations"));
    }
    Ok(operations)
}

async fn split_single(
    splitter: &Splitter,
    operation: &str,
    output: Option<&str>,
    opts: &SplitOptions,
) -> Result<()> {
    match output {
        Some(out) => {
            let written = splitter
                .split_to_file(operation, Path::new(out), opts)
                .await?;
            println!("  Record written to: {}", written.display());
        }
        None => {
            let record = splitter.split(operation, opts).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }
    Ok(())
}

async fn split_batch(
    splitter: &Splitter,
    operations: &[String],
    output: Option<&str>,
    opts: &SplitOptions,
) -> Result<()> {
    let output_dir = PathBuf::from(
        output.ok_or_else(|| eyre!("batch mode requires an output directory (use --output)"))?,
    );
    std::fs::create_dir_all(&output_dir)?;

    let progress = ProgressBar::new(operations.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    // One failed item never aborts the rest; each outcome is reported.
    for (i, operation) in operations.iter().enumerate() {
        progress.set_message(operation.clone());
        let path = output_dir.join(format!("output_{:03}.json", i + 1));

        match splitter.split_to_file(operation, &path, opts).await {
            Ok(written) => {
                succeeded += 1;
                progress.println(format!(
                    "  ✓ [{}/{}] {}",
                    i + 1,
                    operations.len(),
                    written.display()
                ));
            }
            Err(e) => {
                failed += 1;
                progress.println(format!(
                    "  ✗ [{}/{}] {operation}: {e}",
                    i + 1,
                    operations.len()
                ));
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();

    println!();
    println!("  Batch complete: {succeeded} succeeded, {failed} failed");

    if succeeded == 0 {
        return Err(eyre!("all {failed} operations failed"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// kb
// ---------------------------------------------------------------------------

fn cmd_kb(knowledge_base: Option<&str>, config_path: Option<&str>, action: KbAction) -> Result<()> {
    let config = load_app_config(config_path)?;
    let kb_path = knowledge_base.unwrap_or(&config.defaults.knowledge_base);

    let kb = KnowledgeBase::load(kb_path)?;

    match action {
        KbAction::List => {
            for name in kb.operation_names() {
                println!("{name}");
            }
        }
        KbAction::Ids => {
            for id in kb.operation_ids() {
                println!("{id}");
            }
        }
        KbAction::Show { operation } => match kb.get_by_name(&operation) {
            Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
            None => return Err(eyre!("no operation named '{operation}' in the knowledge base")),
        },
        KbAction::Search { keyword } => {
            let hits = kb.search(&keyword);
            if hits.is_empty() {
                println!("no operations matching '{keyword}'");
            }
            for record in hits {
                println!(
                    "{}  ({}, from {})",
                    record.operation_name, record.operation_id, record.source_filename
                );
            }
        }
        KbAction::Category { keyword } => {
            for record in kb.by_category(&keyword) {
                println!(
                    "{}  (feature: {}, scene: {})",
                    record.operation_name, record.feature, record.scene
                );
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// titles
// ---------------------------------------------------------------------------

fn cmd_titles(directory: &str, output: &str, recursive: bool) -> Result<()> {
    info!(directory, recursive, "scanning HTML files");

    let report = titles::scan_directory(directory, recursive)?;
    titles::write_report(&report, Path::new(output))?;

    println!("  Report written to: {output}");
    println!("  Total files:      {}", report.total_files);
    println!("  With title:       {}", report.files_with_title);
    println!(
        "  Without title:    {}",
        report.total_files - report.files_with_title
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn load_app_config(path: Option<&str>) -> Result<AppConfig> {
    match path {
        Some(p) => Ok(load_config_from(Path::new(p))?),
        None => Ok(load_config()?),
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
