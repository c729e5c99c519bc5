use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use grapnel::config::{LOCK_FILE, PACKAGE_FILE, RcFile, TARGET_DIR, find_rc_file, load_package_file};
use grapnel::lockfile::write_lockfile;
use grapnel::resolver::{Resolver, install_libraries};
use grapnel::source::Registry;

#[derive(Parser)]
#[command(name = "grapnel")]
#[command(version, about = "Resolve, fetch and install source dependencies")]
struct Cli {
    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Report each resolved library
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Report resolution progress
    #[arg(long, global = true)]
    debug: bool,

    /// Rewrite rule file to use instead of the first .grapnelrc found
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the package file, install it and write the lock file
    Update {
        #[arg(short, long, default_value = PACKAGE_FILE)]
        package: PathBuf,
        #[arg(short, long, default_value = LOCK_FILE)]
        lock: PathBuf,
        #[arg(short, long, default_value = TARGET_DIR)]
        target: PathBuf,
    },
    /// Install the revisions pinned by the lock file
    Install {
        #[arg(short, long, default_value = LOCK_FILE)]
        lock: PathBuf,
        #[arg(short, long, default_value = TARGET_DIR)]
        target: PathBuf,
    },
}

impl Cli {
    fn level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}

/// Install the global subscriber; the guard must live until exit when logging to a file
fn init_logging(cli: &Cli) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.level()));

    let Some(path) = &cli.log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn load_rc_file(config: Option<&Path>) -> anyhow::Result<RcFile> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => match find_rc_file() {
            Some(path) => path,
            None => return Ok(RcFile::default()),
        },
    };
    tracing::debug!("Loading rewrite rules from {}", path.display());
    Ok(RcFile::load(&path)?)
}

/// Resolve `package`, install into `target` and optionally record a lock file
async fn sync(resolver: &Resolver, package: &Path, target: &Path, lock: Option<&Path>) -> anyhow::Result<()> {
    let deps = load_package_file(package).with_context(|| format!("Failed to load {}", package.display()))?;
    let mut finalized = resolver.resolve_dependencies(deps).await?;

    let result = install_libraries(target, &finalized, resolver.registry())
        .context("Failed to install libraries")
        .and_then(|()| match lock {
            Some(lock) => write_lockfile(lock, &finalized).context("Failed to write lock file"),
            None => Ok(()),
        });
    finalized.destroy();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let rc = load_rc_file(cli.config.as_deref())?;

    let mut registry = Registry::standard();
    registry.add_rules(rc.rewrite_rules()?);
    let resolver = Resolver::new(Arc::new(registry)).with_fetch_timeout(rc.resolver.fetch_timeout());

    match &cli.command {
        Command::Update { package, lock, target } => sync(&resolver, package, target, Some(lock)).await,
        Command::Install { lock, target } => sync(&resolver, lock, target, None).await,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
