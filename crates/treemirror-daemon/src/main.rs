//! treemirror - Periodic one-way directory mirroring
//!
//! This binary keeps a replica directory identical to a source directory:
//! - Loads YAML configuration, then applies command-line overrides
//! - Validates both roots before touching anything
//! - Runs a synchronization pass every `interval` seconds
//! - Writes one line per action to stdout and the action log
//! - Shuts down gracefully on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! `main` resolves the configuration and builds a [`MirrorService`]. The
//! service either runs a single pass (`--once`, `--dry-run`) or hands the
//! synchronizer to a [`SyncScheduler`] that loops until a
//! `CancellationToken` is triggered by the signal handler.

use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use treemirror_audit::{ActionLogger, MemorySyncLog};
use treemirror_core::{
    config::{Config, ConfigBuilder},
    domain::SyncRoots,
    ports::sync_log::ISyncLog,
};
use treemirror_sync::{
    engine::TreeSynchronizer, filesystem::LocalFileSystemAdapter, scheduler::SyncScheduler,
};

// ============================================================================
// Command line
// ============================================================================

/// Keep a replica directory identical to a source directory
#[derive(Debug, Parser)]
#[command(name = "treemirror", version, about, long_about = None)]
struct Cli {
    /// Source directory to mirror from
    #[arg(short, long, value_name = "DIR")]
    source: Option<PathBuf>,

    /// Replica directory to mirror into
    #[arg(short, long, value_name = "DIR")]
    replica: Option<PathBuf>,

    /// Seconds between synchronization passes
    #[arg(short, long, value_name = "SECONDS")]
    interval: Option<u64>,

    /// Append-only file receiving one line per action
    #[arg(short = 'l', long = "logfile", value_name = "FILE")]
    logfile: Option<PathBuf>,

    /// Alternate configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Report what would change without modifying the replica
    #[arg(long)]
    dry_run: bool,

    /// Increase diagnostic verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Overlays the flags that were given on top of `config`
    fn overrides(&self, config: Config) -> ConfigBuilder {
        let mut builder = ConfigBuilder::from_config(config);
        if let Some(source) = &self.source {
            builder = builder.sync_source(source.clone());
        }
        if let Some(replica) = &self.replica {
            builder = builder.sync_replica(replica.clone());
        }
        if let Some(interval) = self.interval {
            builder = builder.sync_interval_secs(interval);
        }
        if let Some(logfile) = &self.logfile {
            builder = builder.logging_action_log(logfile.clone());
        }
        builder
    }
}

/// Loads the explicit `--config` file, or `default_path` if it exists
///
/// A default file that exists but cannot be parsed is an error, like an
/// explicit one.
fn load_config(cli: &Cli, default_path: &Path) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config file {}", path.display())),
        None => Config::load_if_exists(default_path)
            .with_context(|| format!("Failed to load config file {}", default_path.display())),
    }
}

/// Filter directive used when `RUST_LOG` is not set
fn filter_directive(verbose: u8, configured_level: &str) -> String {
    match verbose {
        0 => configured_level.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_tracing(verbose: u8, configured_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(filter_directive(verbose, configured_level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    });

    // stdout is reserved for action lines
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

// ============================================================================
// MirrorService
// ============================================================================

/// Validated runtime state for one invocation
struct MirrorService {
    synchronizer: Arc<TreeSynchronizer>,
    roots: SyncRoots,
    interval: Duration,
    action_log: PathBuf,
}

impl MirrorService {
    /// Builds the service from a validated configuration
    ///
    /// Fails if either root is missing, is not a directory, or the two
    /// roots overlap.
    fn new(config: &Config, dry_run: bool) -> Result<Self> {
        let (Some(source), Some(replica), Some(action_log)) = (
            config.sync.source.as_ref(),
            config.sync.replica.as_ref(),
            config.logging.action_log.as_ref(),
        ) else {
            bail!("Configuration is missing a source, replica or action log path");
        };

        let roots = SyncRoots::new(source, replica).context("Invalid synchronization roots")?;

        let mut synchronizer =
            TreeSynchronizer::new(Arc::new(LocalFileSystemAdapter::new()), &config.sync);
        synchronizer.set_dry_run(dry_run);

        Ok(Self {
            synchronizer: Arc::new(synchronizer),
            roots,
            interval: config.sync.interval(),
            action_log: action_log.clone(),
        })
    }

    fn scheduler(self, log: Arc<dyn ISyncLog>) -> SyncScheduler {
        SyncScheduler::new(self.synchronizer, self.roots, log, self.interval)
    }

    fn open_action_log(&self) -> Result<Arc<dyn ISyncLog>> {
        let logger = ActionLogger::open(&self.action_log)?;
        Ok(Arc::new(logger))
    }

    /// Runs one pass against the real replica
    async fn run_once(self) -> Result<()> {
        let log = self.open_action_log()?;
        let report = self.scheduler(log).run_pass().await?;
        info!(
            actions = report.total_actions(),
            duration_ms = report.duration_ms,
            "Single pass complete"
        );
        Ok(())
    }

    /// Runs one pass that only reports; the action log file is not touched
    async fn run_dry(self) -> Result<()> {
        let log = Arc::new(MemorySyncLog::new());
        let report = self
            .scheduler(Arc::clone(&log) as Arc<dyn ISyncLog>)
            .run_pass()
            .await?;

        let mut stdout = std::io::stdout().lock();
        for line in log.lines() {
            writeln!(stdout, "[dry-run] {line}").context("Failed to write dry-run report")?;
        }
        info!(
            actions = report.total_actions(),
            duration_ms = report.duration_ms,
            "Dry run complete, replica unchanged"
        );
        Ok(())
    }

    /// Runs passes until `shutdown` is cancelled
    async fn run_periodic(self, shutdown: CancellationToken) -> Result<()> {
        let log = self.open_action_log()?;
        let stats = self.scheduler(log).run(shutdown).await;
        if stats.failures > 0 {
            warn!(
                passes = stats.passes,
                failures = stats.failures,
                "Some sync passes failed"
            );
        }
        Ok(())
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_config(&cli, &Config::default_path())?;

    let config = match cli.overrides(loaded).build_validated() {
        Ok(config) => config,
        Err(errors) => {
            for e in &errors {
                eprintln!("treemirror: {e}");
            }
            bail!("Invalid configuration ({} error(s))", errors.len());
        }
    };

    init_tracing(cli.verbose, &config.logging.level);

    let service = MirrorService::new(&config, cli.dry_run)?;
    info!(
        source = %service.roots.source().display(),
        replica = %service.roots.replica().display(),
        interval_secs = service.interval.as_secs(),
        "treemirror starting"
    );

    let result = if cli.dry_run {
        service.run_dry().await
    } else if cli.once {
        service.run_once().await
    } else {
        let shutdown_token = CancellationToken::new();
        let signal_token = shutdown_token.clone();
        tokio::spawn(async move {
            shutdown_signal(signal_token).await;
        });
        service.run_periodic(shutdown_token).await
    };

    match &result {
        Ok(()) => info!("treemirror shut down gracefully"),
        Err(e) => error!(error = %format!("{e:#}"), "treemirror exiting with error"),
    }

    result
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("treemirror").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_short_flags() {
        let cli = parse(&["-s", "/src", "-r", "/rep", "-i", "30", "-l", "/tmp/a.log"]);
        assert_eq!(cli.source, Some(PathBuf::from("/src")));
        assert_eq!(cli.replica, Some(PathBuf::from("/rep")));
        assert_eq!(cli.interval, Some(30));
        assert_eq!(cli.logfile, Some(PathBuf::from("/tmp/a.log")));
        assert!(!cli.once);
        assert!(!cli.dry_run);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_long_flags_and_verbosity() {
        let cli = parse(&[
            "--source",
            "/src",
            "--replica",
            "/rep",
            "--logfile",
            "/log",
            "--once",
            "--dry-run",
            "-vv",
        ]);
        assert!(cli.once);
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_rejects_non_numeric_interval() {
        let result = Cli::try_parse_from(["treemirror", "-i", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let base = ConfigBuilder::new()
            .sync_source(PathBuf::from("/cfg/src"))
            .sync_replica(PathBuf::from("/cfg/rep"))
            .sync_interval_secs(60)
            .logging_action_log(PathBuf::from("/cfg/actions.log"))
            .build();

        let cli = parse(&["-r", "/cli/rep", "-i", "5"]);
        let merged = cli.overrides(base).build();

        assert_eq!(merged.sync.source, Some(PathBuf::from("/cfg/src")));
        assert_eq!(merged.sync.replica, Some(PathBuf::from("/cli/rep")));
        assert_eq!(merged.sync.interval_secs, 5);
        assert_eq!(
            merged.logging.action_log,
            Some(PathBuf::from("/cfg/actions.log"))
        );
    }

    #[test]
    fn test_default_interval_is_ten_seconds() {
        let merged = parse(&[]).overrides(Config::default()).build();
        assert_eq!(merged.sync.interval_secs, 10);
    }

    #[test]
    fn test_missing_required_values_fail_validation() {
        let errors = parse(&["-s", "/src"])
            .overrides(Config::default())
            .build_validated()
            .unwrap_err();
        let fields: Vec<String> = errors.into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"sync.replica".to_string()));
        assert!(fields.contains(&"logging.action_log".to_string()));
        assert!(!fields.contains(&"sync.source".to_string()));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");
        let cli = parse(&["-c", missing.to_str().unwrap()]);
        assert!(load_config(&cli, &dir.path().join("default.yaml")).is_err());
    }

    #[test]
    fn test_missing_default_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&parse(&[]), &dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.sync.interval_secs, 10);
        assert!(config.sync.recreate_empty_files);
    }

    #[test]
    fn test_malformed_default_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "sync:\n  recreate_empty_files: false\n  interval_secs: [oops",
        )
        .unwrap();

        let err = load_config(&parse(&[]), &path).unwrap_err();
        assert!(format!("{err:#}").contains("config.yaml"));
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "sync:\n  interval_secs: 42\n").unwrap();

        let cli = parse(&["--config", path.to_str().unwrap()]);
        let config = load_config(&cli, &dir.path().join("default.yaml")).unwrap();
        assert_eq!(config.sync.interval_secs, 42);
    }

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(0, "warn"), "warn");
        assert_eq!(filter_directive(1, "warn"), "debug");
        assert_eq!(filter_directive(3, "warn"), "trace");
    }

    #[test]
    fn test_service_rejects_nested_roots() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let rep = src.join("replica");
        fs::create_dir_all(&rep).unwrap();

        let config = ConfigBuilder::new()
            .sync_source(src)
            .sync_replica(rep)
            .logging_action_log(dir.path().join("a.log"))
            .build();
        assert!(MirrorService::new(&config, false).is_err());
    }

    #[tokio::test]
    async fn test_run_once_mirrors_and_logs() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let rep = dir.path().join("rep");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::create_dir(&rep).unwrap();
        fs::write(src.join("sub/file.txt"), b"payload").unwrap();
        let log_path = dir.path().join("actions.log");

        let config = ConfigBuilder::new()
            .sync_source(src)
            .sync_replica(rep.clone())
            .logging_action_log(log_path.clone())
            .build();
        MirrorService::new(&config, false)
            .unwrap()
            .run_once()
            .await
            .unwrap();

        assert_eq!(fs::read(rep.join("sub/file.txt")).unwrap(), b"payload");
        let log = fs::read_to_string(&log_path).unwrap();
        assert_eq!(log.lines().count(), 2);
        assert!(log.starts_with("Created directory: "));
    }

    #[tokio::test]
    async fn test_dry_run_leaves_replica_and_log_untouched() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let rep = dir.path().join("rep");
        fs::create_dir(&src).unwrap();
        fs::create_dir(&rep).unwrap();
        fs::write(src.join("new.txt"), b"new").unwrap();
        let log_path = dir.path().join("actions.log");

        let config = ConfigBuilder::new()
            .sync_source(src)
            .sync_replica(rep.clone())
            .logging_action_log(log_path.clone())
            .build();
        MirrorService::new(&config, true)
            .unwrap()
            .run_dry()
            .await
            .unwrap();

        assert!(!rep.join("new.txt").exists());
        assert!(!log_path.exists());
    }
}
