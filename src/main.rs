//! Semgraph CLI - build semantic graphs of Python repositories

use anyhow::Context;
use clap::{Parser, Subcommand};
use semgraph::builder::{BuildReport, RepositoryOutcome};
use semgraph::callgraph::{Code2Flow, JsonCallGraph};
use semgraph::config::{self, OutputFormat, SemgraphConfig};
use semgraph::export::{self, GraphDocument};
use semgraph::ui::{self, BuildProgress, Icons};
use semgraph::{SemanticGraphBuilder, SqliteStore};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "semgraph")]
#[command(version)]
#[command(about = "Semantic graph builder for Python repositories")]
#[command(long_about = r#"
Semgraph builds one directed graph per repository whose nodes are files,
classes and functions, connected by:
  • Encapsulation / Ownership (lexical nesting)
  • Import (resolved across files, including re-exports)
  • ClassHierarchy (base classes)
  • Invoke (calls from code2flow, validated against imports)

Example usage:
  semgraph build --path ./project --persist
  semgraph build --path ./repos --batch --code2flow
  semgraph stats --graph .semgraph/project.db
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to semgraph.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the semantic graph of a repository
    Build {
        /// Repository root (or a directory of repositories with --batch)
        #[arg(short, long)]
        path: PathBuf,

        /// Output directory for persisted graphs
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write one graph artifact per repository
        #[arg(long)]
        persist: bool,

        /// Artifact format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// code2flow JSON document to integrate as Invoke edges
        #[arg(long, conflicts_with = "code2flow")]
        call_graph: Option<PathBuf>,

        /// Run code2flow (optionally naming the program) to produce Invoke edges
        #[arg(long, num_args = 0..=1, default_missing_value = "code2flow")]
        code2flow: Option<String>,

        /// Treat every child directory of --path as its own repository
        #[arg(long)]
        batch: bool,

        /// Worker threads
        #[arg(short, long)]
        threads: Option<usize>,
    },

    /// Show statistics of a persisted graph (.db or .json)
    Stats {
        /// Path to the graph artifact
        #[arg(short, long)]
        graph: PathBuf,
    },

    /// Write a default semgraph.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

/// Build settings after merging CLI flags over the config file
struct BuildSettings {
    out: PathBuf,
    persist: bool,
    format: OutputFormat,
    call_graph: Option<PathBuf>,
    code2flow: Option<String>,
    excludes: Vec<String>,
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins when set
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Build { path, out, persist, format, call_graph, code2flow, batch, threads } => {
            let file_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
            let settings = merge_settings(file_config, out, persist, format, call_graph, code2flow, threads);
            run_build(&path, batch, settings)
        }

        Commands::Stats { graph } => run_stats(&graph),

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &SemgraphConfig::starter(), force)?;
            ui::success(&format!("Wrote {}", path.display()));
            Ok(())
        }
    }
}

fn merge_settings(
    file: SemgraphConfig,
    out: Option<PathBuf>,
    persist: bool,
    format: Option<OutputFormat>,
    call_graph: Option<PathBuf>,
    code2flow: Option<String>,
    threads: Option<usize>,
) -> BuildSettings {
    BuildSettings {
        out: out
            .or_else(|| file.output.map(PathBuf::from))
            .unwrap_or_else(config::default_output_dir),
        persist,
        format: format.or(file.format).unwrap_or_default(),
        call_graph: call_graph.or_else(|| file.call_graph.map(PathBuf::from)),
        code2flow: code2flow.or(file.code2flow),
        excludes: file.exclude,
        threads: threads.or(file.threads),
    }
}

fn run_build(path: &Path, batch: bool, settings: BuildSettings) -> anyhow::Result<()> {
    let started = Instant::now();
    ui::header(&format!("Building semantic graph: {}", path.display()));

    let (progress, tx) = BuildProgress::new();
    let mut builder = SemanticGraphBuilder::new()?
        .excludes(settings.excludes.clone())
        .progress(tx);
    if let Some(threads) = settings.threads {
        builder = builder.threads(threads);
    }
    if let Some(document) = &settings.call_graph {
        ui::info("Call graph", &document.display().to_string());
        builder = builder.call_graph(JsonCallGraph::new(document));
    } else if let Some(program) = &settings.code2flow {
        ui::info("Call graph", &format!("running {}", program));
        builder = builder.call_graph(Code2Flow::new(program.clone()));
    }

    let outcomes: Vec<RepositoryOutcome> = if batch {
        builder.build_from_repos(path)?
    } else {
        vec![RepositoryOutcome {
            root: path.to_path_buf(),
            result: builder.build_from_one(path),
        }]
    };
    // Dropping the builder closes the progress channel
    drop(builder);
    progress.finish();

    let mut failed = 0;
    let mut totals = (0, 0, 0);
    for outcome in outcomes {
        match outcome.result {
            Ok(report) => {
                print_report(&report);
                if settings.persist {
                    persist(&report, &settings)?;
                }
                totals.0 += report.files;
                totals.1 += report.graph.node_count();
                totals.2 += report.graph.edge_count();
            }
            Err(e) => {
                failed += 1;
                ui::error(&format!("{}: {}", outcome.root.display(), e));
            }
        }
    }

    ui::finish_summary(started.elapsed(), totals.0, totals.1, totals.2);
    if failed > 0 {
        anyhow::bail!("{} repository build(s) failed", failed);
    }
    Ok(())
}

fn print_report(report: &BuildReport) {
    ui::section(&report.repository);
    println!("{}", ui::graph_table(&report.graph.stats(), report.duplicates_removed));
    if !report.linkers.is_empty() {
        println!("{}", ui::linker_table(&report.linkers));
    }
    if report.skipped > 0 {
        ui::warn(&format!("{} file(s) could not be read or parsed", report.skipped));
    }
    ui::timing(&format!("{:.2?}", report.duration));
}

fn persist(report: &BuildReport, settings: &BuildSettings) -> anyhow::Result<()> {
    config::ensure_output_dir(&settings.out)?;
    let path = match settings.format {
        OutputFormat::Json => export::write_json(&settings.out, &report.repository, &report.graph)?,
        OutputFormat::Sqlite => {
            let path = settings
                .out
                .join(format!("{}.{}", report.repository, settings.format.extension()));
            let mut store = SqliteStore::open(&path)?;
            store.save_graph(&report.repository, &report.graph)?;
            path
        }
    };
    ui::status(Icons::DATABASE, "Saved", &path.display().to_string());
    Ok(())
}

fn run_stats(path: &Path) -> anyhow::Result<()> {
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    if is_json {
        let document = GraphDocument::read(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let graph = document.to_graph()?;
        ui::section(&document.repository);
        println!("{}", ui::graph_table(&graph.stats(), 0));
    } else {
        if !path.exists() {
            anyhow::bail!("no graph database at {}", path.display());
        }
        let store = SqliteStore::open(path)?;
        let stats = store.stats()?;
        ui::section(stats.repository.as_deref().unwrap_or("graph"));
        println!("{}", ui::db_table(&stats));
    }
    Ok(())
}
