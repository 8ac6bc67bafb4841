use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mailroom_intake::watch::spawn_folder_watcher;
use mailroom_intake::{render, IntakeClient, ScanLog};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Files are picked up on creation; give writers a moment to finish.
const SETTLE: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "mailroom-intake")]
#[command(about = "Scan shipping-label photos into the mailroom log")]
#[command(version)]
struct Cli {
    /// Base URL of the mailroom server
    #[arg(long, env = "MAILROOM_SERVER", default_value = "http://127.0.0.1:3000")]
    server: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "MAILROOM_CLIENT_TIMEOUT_SECS", default_value_t = 90)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one or more label photos, one after another
    Scan {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Watch a folder and scan each new photo as it arrives
    Watch { dir: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = IntakeClient::new(&cli.server, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Scan { files } => scan_files(&client, &files).await,
        Commands::Watch { dir } => watch_folder(&client, &dir).await,
    }
}

async fn scan_files(client: &IntakeClient, files: &[PathBuf]) -> Result<()> {
    let mut log = ScanLog::new();
    for path in files {
        let line = log.apply(client.scan_file(path).await);
        println!("{}: {line}", path.display());
    }
    print_session(&log);

    let failed = files.len() - log.len();
    if failed > 0 {
        bail!("{failed} of {} scans failed", files.len());
    }
    Ok(())
}

async fn watch_folder(client: &IntakeClient, dir: &Path) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(64);
    let _watcher = spawn_folder_watcher(dir, tx).with_context(|| format!("watching {}", dir.display()))?;
    info!(dir = %dir.display(), "watching for label photos");
    println!("Watching {} (Ctrl-C to stop)", dir.display());

    let mut log = ScanLog::new();
    loop {
        let path = tokio::select! {
            next = rx.recv() => match next {
                Some(path) => path,
                None => {
                    warn!("folder watcher stopped");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        };
        tokio::time::sleep(SETTLE).await;
        let line = log.apply(client.scan_file(&path).await);
        println!("\n{}: {line}", path.display());
        print_session(&log);
    }
    Ok(())
}

fn print_session(log: &ScanLog) {
    println!("\n{}\n", render::metrics(log));
    if !log.is_empty() {
        println!("{}", render::table(log.records()));
    }
}
