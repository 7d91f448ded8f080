//! # Repo Analyzer CLI (`repo-analyzer`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `repo-analyzer repo <url>` | Clone a repository and analyze its source |
//! | `repo-analyzer dir <path>` | Analyze a source tree on disk |
//! | `repo-analyzer resume <file>` | Analyze a résumé (PDF, DOCX or text) |
//! | `repo-analyzer corpus <path>` | Print the corpus that would be sent |
//! | `repo-analyzer extract <file>` | Print the cleaned résumé text |
//!
//! Results go to stdout as JSON; logs go to stderr (`RUST_LOG` controls the
//! level). Exit codes: 2 for unusable input, 3 for oracle failures.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use repo_analyzer::analyze::Analyzer;
use repo_analyzer::config::{self, Config};
use repo_analyzer::connector_fs::{read_corpus, WalkOptions};
use repo_analyzer::error::AnalyzeError;
use repo_analyzer::models::AnalysisMode;
use repo_analyzer::oracle::GeminiOracle;
use repo_analyzer::recovery::ExtractionResult;
use repo_analyzer::schemas::{RepoAnalysis, ResumeAnalysis};

const DEFAULT_CONFIG: &str = "./config/analyzer.toml";

/// Repo Analyzer: bounded corpora and structured LLM analysis for source
/// repositories and résumés.
#[derive(Parser)]
#[command(name = "repo-analyzer", version)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply if the default
    /// path does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone a Git repository (shallow) and analyze its source code.
    Repo {
        /// Repository URL.
        url: String,

        /// What the project was supposed to be; enables alignment scoring.
        #[arg(long)]
        desired_project: Option<String>,

        /// Print the oracle's mapping as-is instead of the typed view.
        #[arg(long)]
        raw: bool,
    },

    /// Analyze a source tree that is already on disk.
    Dir {
        path: PathBuf,

        #[arg(long)]
        desired_project: Option<String>,

        #[arg(long)]
        raw: bool,
    },

    /// Analyze a résumé file.
    Resume {
        file: PathBuf,

        /// Job description to match the candidate against.
        #[arg(long)]
        job_description: Option<String>,

        /// Required skills, free text (e.g. "Rust, Kubernetes").
        #[arg(long)]
        required_skills: Option<String>,

        #[arg(long)]
        raw: bool,
    },

    /// Print the assembled corpus for a source tree without calling the LLM.
    Corpus {
        path: PathBuf,

        /// Also list skipped files and why, on stderr.
        #[arg(long)]
        show_skipped: bool,
    },

    /// Print the cleaned text of a document without calling the LLM.
    Extract { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_or_default(&cli.config)?;

    match run(cli.command, &cfg).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn load_or_default(path: &Path) -> anyhow::Result<Config> {
    if path == Path::new(DEFAULT_CONFIG) && !path.exists() {
        return Ok(Config::default());
    }
    config::load_config(path)
}

async fn run(command: Commands, cfg: &Config) -> Result<(), AnalyzeError> {
    match command {
        Commands::Corpus { path, show_skipped } => {
            let walk = walk_options(cfg)?;
            let (corpus, scan) = read_corpus(&path, &walk, cfg.limits.corpus_max_chars)?;
            if show_skipped {
                for skipped in &scan.skipped {
                    eprintln!("skipped {:<48} {}", skipped.relative_path, skipped.reason);
                }
            }
            println!("{}", corpus.text);
        }
        Commands::Extract { file } => {
            let analyzer = analyzer(cfg)?;
            let bytes = read_input(&file)?;
            let text = analyzer.document_text(&bytes, file_name(&file).as_deref())?;
            println!("{}", text);
        }
        Commands::Repo {
            url,
            desired_project,
            raw,
        } => {
            let result = analyzer(cfg)?.analyze_repository(&url, desired_project).await?;
            print_result(&result, raw)?;
        }
        Commands::Dir {
            path,
            desired_project,
            raw,
        } => {
            let result = analyzer(cfg)?.analyze_directory(&path, desired_project).await?;
            print_result(&result, raw)?;
        }
        Commands::Resume {
            file,
            job_description,
            required_skills,
            raw,
        } => {
            let bytes = read_input(&file)?;
            let result = analyzer(cfg)?
                .analyze_document(
                    &bytes,
                    file_name(&file).as_deref(),
                    job_description,
                    required_skills,
                )
                .await?;
            print_result(&result, raw)?;
        }
    }
    Ok(())
}

/// Builds the analyzer. Credentials are read here, once; a missing key only
/// surfaces when the oracle is actually called.
fn analyzer(cfg: &Config) -> Result<Analyzer, AnalyzeError> {
    let credentials = cfg.oracle.resolve_credentials();
    let oracle = GeminiOracle::new(&cfg.oracle, credentials)?;
    Analyzer::new(cfg, Arc::new(oracle)).map_err(|e| AnalyzeError::Internal(e.to_string()))
}

fn walk_options(cfg: &Config) -> Result<WalkOptions, AnalyzeError> {
    WalkOptions::new(cfg.limits.file_max_chars, &cfg.walker.exclude_globs)
        .map_err(|e| AnalyzeError::Internal(e.to_string()))
}

fn read_input(path: &Path) -> Result<Vec<u8>, AnalyzeError> {
    std::fs::read(path)
        .map_err(|e| AnalyzeError::SourceNotFound(format!("{}: {}", path.display(), e)))
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}

fn print_result(result: &ExtractionResult, raw: bool) -> Result<(), AnalyzeError> {
    let json = if raw {
        serde_json::to_string_pretty(&result.fields)
    } else {
        match result.mode {
            AnalysisMode::CodeAnalysis => serde_json::to_string_pretty(&RepoAnalysis::from(result)),
            AnalysisMode::ResumeAnalysis => {
                serde_json::to_string_pretty(&ResumeAnalysis::from(result))
            }
        }
    }
    .map_err(|e| AnalyzeError::Internal(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
