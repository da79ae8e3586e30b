#![forbid(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use sbconf_edit::config::Settings;
use sbconf_edit::workspace::Workspace;

/// View and edit sing-box configuration files by tag
#[derive(Debug, Parser)]
#[command(name = "sbconf-edit", version)]
struct Cli {
    /// Configuration directory to use instead of the discovered one
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show discovered configuration directories
    Paths,
    /// Select the configuration directory for later commands
    Use { dir: PathBuf },
    /// Group the directory's files into functional categories
    Categories,
    /// List the navigable keys of a file
    Keys { file: String },
    /// Translate a tag path into a positional path
    Resolve { file: String, path: String },
    /// Print the value at a path (the whole file when omitted)
    Get {
        file: String,
        #[arg(default_value = "")]
        path: String,
    },
    /// Validate the active directory with `sing-box check`
    Check,
    /// Replace the value at a path and save the file
    Set {
        file: String,
        /// Target path; the whole file when omitted
        #[arg(long, default_value = "")]
        path: String,
        /// New value; `{...}`/`[...]` is written as-is, anything else as a string
        value: Option<String>,
        /// Read the new value from stdin
        #[arg(long, conflicts_with = "value")]
        stdin: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize response")?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    message: String,
}

fn run(cli: Cli, workspace: &Workspace) -> Result<()> {
    if let Some(dir) = &cli.dir {
        workspace.set_active(dir)?;
    }

    match cli.command {
        Command::Paths => print_json(&workspace.config_paths()),
        Command::Use { dir } => {
            let path = workspace.set_active(&dir)?;
            let settings_path = Settings::path();
            let mut stored = Settings::load_from(&settings_path)?;
            stored.active_dir = Some(path.clone());
            stored.save_to(&settings_path)?;
            print_json(&StatusResponse {
                status: "success",
                message: format!("Configuration directory set to '{}'", path.display()),
            })
        }
        Command::Categories => print_json(&workspace.functional_configs()?),
        Command::Keys { file } => print_json(&workspace.top_keys(&file)?),
        Command::Resolve { file, path } => {
            println!("{}", workspace.resolve_path(&file, &path)?);
            Ok(())
        }
        Command::Get { file, path } => {
            println!("{}", workspace.get_content(&file, &path)?);
            Ok(())
        }
        Command::Check => {
            let report = workspace.check_config()?;
            if !report.success {
                bail!("Configuration check failed:\n{}", report.output.trim_end());
            }
            print_json(&StatusResponse {
                status: "success",
                message: "Configuration check passed".to_string(),
            })
        }
        Command::Set {
            file,
            path,
            value,
            stdin,
        } => {
            let content = if stdin {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read value from stdin")?;
                buf
            } else {
                value.context("Missing value (pass it as an argument or use --stdin)")?
            };
            workspace.save_content(&file, &path, &content)?;
            print_json(&StatusResponse {
                status: "success",
                message: format!("Saved '{file}'"),
            })
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.trace_level())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!(settings = %Settings::path().display(), "Loaded settings");
    let workspace = Workspace::open(settings);

    if let Err(e) = run(cli, &workspace) {
        error!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}
