use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use gcs_config::SinkKind;

mod commands;

#[derive(Parser)]
#[command(name = "gcs")]
#[command(about = "GrooveCoaster play digest", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one digest pass and deliver it
    Run {
        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Override notify.sink
        #[arg(long, value_enum)]
        sink: Option<SinkArg>,
    },

    /// Inspect or override the stored watermark
    Watermark {
        #[command(subcommand)]
        cmd: WatermarkCmd,
    },

    /// Inspect the snapshot cache
    Snapshot {
        #[command(subcommand)]
        cmd: SnapshotCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> local ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum WatermarkCmd {
    /// Print the stored watermark
    Show {
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },

    /// Replace the stored watermark. Records newer than it are re-reported on the next run.
    Set {
        /// `YYYY-MM-DD HH:MM:SS` in the configured zone, or RFC 3339
        value: String,

        #[arg(long = "config")]
        config_paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum SnapshotCmd {
    /// Print one cached snapshot as JSON
    Show {
        /// Record id
        id: String,

        #[arg(long = "config")]
        config_paths: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SinkArg {
    Log,
    Post,
}

impl From<SinkArg> for SinkKind {
    fn from(s: SinkArg) -> Self {
        match s {
            SinkArg::Log => SinkKind::Log,
            SinkArg::Post => SinkKind::Post,
        }
    }
}

fn main() -> Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run { config_paths, sink } => {
            commands::run::run(&config_paths, sink.map(SinkKind::from))?;
        }

        Commands::Watermark { cmd } => match cmd {
            WatermarkCmd::Show { config_paths } => commands::cache::watermark_show(&config_paths)?,
            WatermarkCmd::Set {
                value,
                config_paths,
            } => commands::cache::watermark_set(&config_paths, &value)?,
        },

        Commands::Snapshot { cmd } => match cmd {
            SnapshotCmd::Show { id, config_paths } => {
                commands::cache::snapshot_show(&config_paths, &id)?
            }
        },

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = gcs_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
