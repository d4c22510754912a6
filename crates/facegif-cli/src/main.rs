use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

// `#[zbus::proxy]` generates `StudioProxy` (async) and `StudioProxyBlocking`.
#[zbus::proxy(
    interface = "org.facegif.Studio1",
    default_service = "org.facegif.Studio1",
    default_path = "/org/facegif/Studio1"
)]
trait Studio {
    async fn upload_source(&self, path: &str) -> zbus::Result<String>;
    async fn upload_target(&self, path: &str) -> zbus::Result<String>;
    async fn search(&self, query: &str) -> zbus::Result<String>;
    async fn select(&self, id: &str) -> zbus::Result<String>;
    async fn process(&self) -> zbus::Result<String>;
    async fn download(&self, dir: &str) -> zbus::Result<String>;
    async fn reset(&self) -> zbus::Result<String>;
    async fn dismiss_error(&self) -> zbus::Result<String>;
    async fn toggle_theme(&self) -> zbus::Result<String>;
    async fn status(&self) -> zbus::Result<String>;
}

#[derive(Parser)]
#[command(name = "facegif", about = "FaceGIF face swap demo CLI")]
struct Cli {
    /// D-Bus method timeout in seconds (processing can take a while)
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload your own photo
    UploadSource {
        path: PathBuf,
    },
    /// Upload a target photo (clears any selected candidate)
    UploadTarget {
        path: PathBuf,
    },
    /// Search for target candidates
    Search {
        query: String,
    },
    /// Select a candidate by id (clears any uploaded target)
    Select {
        id: String,
    },
    /// Run the face swap
    Process,
    /// Save the result as face-swap-result.jpg
    Download {
        /// Destination directory (default: the daemon's download dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Clear photos, target, and result
    Reset,
    /// Clear the last reported error
    Dismiss,
    /// Toggle between dark and light theme
    Theme,
    /// Show daemon and session status
    Status,
}

/// Uploads go over the bus as paths, so make them absolute for the daemon.
fn absolute(path: PathBuf) -> Result<String> {
    let abs = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .context("resolving current directory")?
            .join(path)
    };
    Ok(abs.to_string_lossy().into_owned())
}

fn print_json(raw: &str) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(raw).context("daemon returned invalid JSON")?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let conn = zbus::connection::Builder::session()?
        .method_timeout(Duration::from_secs(cli.timeout))
        .build()
        .await
        .context("connecting to the session bus")?;
    let proxy = StudioProxy::new(&conn)
        .await
        .context("facegifd is not reachable; is it running?")?;

    match cli.command {
        Commands::UploadSource { path } => {
            print_json(&proxy.upload_source(&absolute(path)?).await?)?;
        }
        Commands::UploadTarget { path } => {
            print_json(&proxy.upload_target(&absolute(path)?).await?)?;
        }
        Commands::Search { query } => {
            print_json(&proxy.search(&query).await?)?;
        }
        Commands::Select { id } => {
            print_json(&proxy.select(&id).await?)?;
        }
        Commands::Process => {
            println!("Processing...");
            print_json(&proxy.process().await?)?;
        }
        Commands::Download { dir } => {
            let dir = match dir {
                Some(d) => absolute(d)?,
                None => String::new(),
            };
            let written = proxy.download(&dir).await?;
            println!("Saved {written}");
        }
        Commands::Reset => {
            print_json(&proxy.reset().await?)?;
        }
        Commands::Dismiss => {
            print_json(&proxy.dismiss_error().await?)?;
        }
        Commands::Theme => {
            print_json(&proxy.toggle_theme().await?)?;
        }
        Commands::Status => {
            let status = proxy.status().await;
            match status {
                Ok(raw) => print_json(&raw)?,
                Err(e) => {
                    tracing::debug!(error = %e, "status call failed");
                    println!("facegifd: not connected");
                }
            }
        }
    }

    Ok(())
}
