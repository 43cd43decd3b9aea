//! gitavatar command-line tool.
//!
//! Reads the committers of a Git working copy and downloads each person's
//! Gravatar image into an output directory, named after the committer.

mod progress;
mod style;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing_subscriber::EnvFilter;

use gitavatar_core::gravatar::CollisionPolicy;
use gitavatar_core::{
    fingerprint, AppConfig, AvatarEngine, CommitterIdentity, FetchReport, IdentityMatch,
};

use crate::progress::{LogWriter, ProgressSink};
use crate::style::Tone;

/// Default configuration file, used when present and `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "gitavatar.toml";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Fetch Gravatar images for every committer in a Git repository.
#[derive(Parser, Debug)]
#[command(name = "gitavatar", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show diagnostic information.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download an image for every unique committer.
    Fetch(FetchArgs),

    /// List the unique committers without downloading anything.
    List {
        #[command(flatten)]
        source: SourceArgs,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print the Gravatar fingerprint of one or more email addresses.
    Hash {
        /// Email addresses to hash.
        #[arg(required = true)]
        emails: Vec<String>,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

/// Where committers come from and how they are merged.
#[derive(Args, Debug)]
struct SourceArgs {
    /// Path to the Git repository (working copy).
    #[arg(short, long)]
    repository: Option<PathBuf>,

    /// Merge committers by email only, ignoring shared names.
    #[arg(long)]
    email_only: bool,

    /// Only include committers matching this name or email (repeatable).
    #[arg(long = "only", value_name = "NAME_OR_EMAIL")]
    only: Vec<String>,
}

#[derive(Args, Debug)]
struct FetchArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output directory for images.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Image size in pixels.
    #[arg(short, long)]
    size: Option<u32>,

    /// Base URL of the image service.
    #[arg(long)]
    base_url: Option<String>,

    /// Maximum simultaneous downloads (0 = unbounded).
    #[arg(long)]
    concurrency: Option<usize>,

    /// Append the fingerprint to every file name so shared names never collide.
    #[arg(long)]
    suffix_fingerprint: bool,

    /// Exit with a failure status if any download failed.
    #[arg(long)]
    strict: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Hidden until a fetch starts; log lines are written around it.
    let bar = ProgressBar::hidden();
    let log_bar = bar.clone();
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(move || LogWriter::new(log_bar.clone()))
        .init();

    match run(cli, bar).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", style::status(Tone::Bad, &format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, bar: ProgressBar) -> Result<ExitCode> {
    match cli.command {
        Commands::Hash { emails } => cmd_hash(&emails).map(|_| ExitCode::SUCCESS),
        Commands::Init { output } => cmd_init(&output).map(|_| ExitCode::SUCCESS),
        Commands::Validate => cmd_validate(cli.config.as_deref()).map(|_| ExitCode::SUCCESS),
        Commands::List { source, json } => {
            let mut config = load_config(cli.config.as_deref())?;
            source.apply(&mut config);
            config.validate().context("invalid configuration")?;
            cmd_list(config, &source.only, json)
                .await
                .map(|_| ExitCode::SUCCESS)
        }
        Commands::Fetch(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            args.apply(&mut config);
            config.validate().context("invalid configuration")?;
            cmd_fetch(config, &args, bar).await
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Load the explicit config file, else `./gitavatar.toml` if present, else defaults.
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(path).context("failed to load configuration file"),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            AppConfig::load_from_file(DEFAULT_CONFIG_FILE)
                .context("failed to load configuration file")
        }
        None => Ok(AppConfig::default()),
    }
}

impl SourceArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(ref repository) = self.repository {
            config.repository.path = repository.clone();
        }
        if self.email_only {
            config.fetch.identity_match = IdentityMatch::EmailOnly;
        }
    }
}

impl FetchArgs {
    fn apply(&self, config: &mut AppConfig) {
        self.source.apply(config);
        if let Some(ref output) = self.output {
            config.output.directory = output.clone();
        }
        if let Some(size) = self.size {
            config.gravatar.size = size;
        }
        if let Some(ref base_url) = self.base_url {
            config.gravatar.base_url = base_url.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.fetch.max_concurrent = concurrency;
        }
        if self.suffix_fingerprint {
            config.output.collision = CollisionPolicy::SuffixFingerprint;
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

async fn cmd_fetch(config: AppConfig, args: &FetchArgs, bar: ProgressBar) -> Result<ExitCode> {
    let repository = config.repository.path.clone();
    let engine = AvatarEngine::with_sink(config, Arc::new(ProgressSink::new(bar.clone())));
    let committers = engine
        .committers(&args.source.only)
        .await
        .with_context(|| format!("cannot read committers from '{}'", repository.display()))?;
    if committers.is_empty() {
        println!("{}", style::status(Tone::Caution, "No committers found."));
        return Ok(ExitCode::SUCCESS);
    }

    bar.set_length(committers.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.blue} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("=> "),
    );
    bar.set_draw_target(ProgressDrawTarget::stderr());
    bar.enable_steady_tick(Duration::from_millis(100));

    let report = engine.fetch(committers).await;
    bar.finish_and_clear();
    let report = report.context("avatar fetch aborted")?;
    print_report(&report);

    if args.strict && report.summary.has_errors() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &FetchReport) {
    let summary = &report.summary;
    println!();
    println!("{}", style::heading("Fetch summary"));
    println!("{}", style::count_row("Committers", report.committers, Tone::Good));
    println!("{}", style::count_row("Saved", summary.success_count, Tone::Good));
    println!("{}", style::count_row("No avatar", summary.not_found_count, Tone::Caution));
    println!("{}", style::count_row("Failed", summary.failed_count(), Tone::Bad));
    println!(
        "{}",
        style::detail_row("Directory", &report.target_dir.display().to_string())
    );
    println!();

    if summary.has_errors() {
        println!("{}", style::status(Tone::Caution, "Some avatars could not be fetched:"));
        for error in &summary.errors {
            println!("  {}", style::status(Tone::Bad, error));
        }
        println!();
    } else {
        println!("{}", style::status(Tone::Good, "All available avatars fetched."));
    }
}

/// Name, email and fingerprint per committer; `None` when the email cannot
/// be hashed.
fn list_rows(
    committers: &BTreeSet<CommitterIdentity>,
) -> Vec<(&CommitterIdentity, Option<String>)> {
    committers
        .iter()
        .map(|c| (c, fingerprint(c.email()).ok()))
        .collect()
}

async fn cmd_list(config: AppConfig, only: &[String], json: bool) -> Result<()> {
    let repository = config.repository.path.clone();
    let committers = AvatarEngine::new(config)
        .committers(only)
        .await
        .with_context(|| format!("cannot read committers from '{}'", repository.display()))?;
    let rows = list_rows(&committers);

    if json {
        let values: Vec<serde_json::Value> = rows
            .iter()
            .map(|(c, fp)| {
                serde_json::json!({
                    "name": c.name(),
                    "email": c.email(),
                    "fingerprint": fp,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No committers found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Email", "Fingerprint"]);
    for (committer, fp) in &rows {
        table.add_row(vec![
            Cell::new(committer.name()),
            Cell::new(committer.email()),
            Cell::new(fp.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{table}");
    println!("{}", style::quiet(&format!("{} unique committers", rows.len())));
    Ok(())
}

fn cmd_hash(emails: &[String]) -> Result<()> {
    for email in emails {
        let fp = fingerprint(email).with_context(|| format!("cannot hash '{}'", email))?;
        println!("{}  {}", fp, email.trim());
    }
    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# gitavatar configuration
# Every value below is the default; command-line flags override them.

[repository]
path = "."

[output]
directory = "./gravatars"
# "overwrite" or "suffix_fingerprint"
collision = "overwrite"

[gravatar]
base_url = "https://www.gravatar.com/avatar"
size = 90
rating = "g"
# timeout_secs = 30

[fetch]
# 0 fetches every committer at once
max_concurrent = 0
# "email_or_name" or "email_only"
identity_match = "email_or_name"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit the repository path and output directory");
    println!(
        "  2. Validate with: gitavatar validate --config {}",
        output.display()
    );
    println!(
        "  3. Fetch avatars: gitavatar fetch --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: Option<&Path>) -> Result<()> {
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    println!("Validating configuration: {}", path.display());
    println!();

    let config = AppConfig::load_from_file(path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    match config.validate() {
        Ok(()) => println!("  [OK] All values are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    let options = config.fetch_options();
    println!();
    println!("Configuration summary:");
    println!("  Repository    : {}", config.repository.path.display());
    println!("  Output        : {}", config.output.directory.display());
    println!("  Collisions    : {:?}", options.collision);
    println!("  Image service : {}", config.gravatar.base_url);
    println!("  Image size    : {}", config.gravatar.size);
    println!("  Rating        : {}", config.gravatar.rating);
    println!(
        "  Concurrency   : {}",
        match options.max_concurrent {
            0 => "unbounded".to_string(),
            n => n.to_string(),
        }
    );
    println!("  Identity match: {:?}", config.fetch.identity_match);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_flags_override_config() {
        let cli = Cli::parse_from([
            "gitavatar",
            "fetch",
            "-r",
            "/src/project",
            "-o",
            "/tmp/out",
            "-s",
            "120",
            "--concurrency",
            "4",
            "--email-only",
            "--suffix-fingerprint",
        ]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch command");
        };
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.repository.path, PathBuf::from("/src/project"));
        assert_eq!(config.output.directory, PathBuf::from("/tmp/out"));
        assert_eq!(config.gravatar.size, 120);
        assert_eq!(config.fetch.max_concurrent, 4);
        assert_eq!(config.fetch.identity_match, IdentityMatch::EmailOnly);
        assert_eq!(config.output.collision, CollisionPolicy::SuffixFingerprint);
    }

    #[test]
    fn test_fetch_without_flags_keeps_config() {
        let cli = Cli::parse_from(["gitavatar", "fetch"]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch command");
        };
        let mut config = AppConfig::default();
        config.gravatar.size = 64;
        args.apply(&mut config);
        assert_eq!(config.gravatar.size, 64);
        assert_eq!(config.fetch.identity_match, IdentityMatch::EmailOrName);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["gitavatar", "list", "-v", "--config", "x.toml", "--json"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::List { json: true, .. }));
    }

    #[test]
    fn test_hash_requires_email() {
        assert!(Cli::try_parse_from(["gitavatar", "hash"]).is_err());
        assert!(cmd_hash(&["  ".to_string()]).is_err());
        assert!(cmd_hash(&["tim@tigranetworks.co.uk".to_string()]).is_ok());
    }

    #[test]
    fn test_init_writes_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gitavatar.toml");
        cmd_init(&path).unwrap();

        let config = AppConfig::load_and_validate(&path).unwrap();
        assert_eq!(config.gravatar.size, 90);
        assert!(cmd_init(&path).is_err());
        cmd_validate(Some(&path)).unwrap();
    }

    #[test]
    fn test_list_rows_keep_committers_without_fingerprint() {
        let committers = BTreeSet::from([
            CommitterIdentity::new("Tim Long", "tim@tigranetworks.co.uk"),
            CommitterIdentity::new("Blank", "   "),
        ]);
        let rows = list_rows(&committers);

        assert_eq!(rows.len(), 2);
        let blank = rows.iter().find(|(c, _)| c.name() == "Blank").unwrap();
        assert_eq!(blank.1, None);
        let tim = rows.iter().find(|(c, _)| c.name() == "Tim Long").unwrap();
        assert_eq!(tim.1.as_deref(), Some("df0478426c0e47cc5e557d5391e5255d"));
    }
}
