#![deny(unsafe_code)]

mod config;
mod constants;
mod persistence;
mod platform;
mod query;
mod reconcile;
mod switcher;
mod topology;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level as TraceLevel, error, info};
use tracing_subscriber::FmtSubscriber;

use config::Settings;
use persistence::ProfileStore;
use platform::NativeApi;
use switcher::DisplaySwitcher;

/// Save and restore multi-monitor display layouts
#[derive(Debug, Parser)]
#[command(name = "monitor-switcher", version)]
struct Cli {
    /// Log every strategy attempt and candidate topology
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Capture the active display layout
    Save {
        /// Profile name, or a file path
        target: String,
    },
    /// Restore a stored display layout
    Load {
        /// Profile name, or a file path
        target: String,
        /// Apply the stored layout verbatim, without adapter id remapping
        #[arg(long)]
        no_id_match: bool,
    },
    /// Print the current display layout
    Print {
        /// Include connected but inactive outputs
        #[arg(long)]
        all: bool,
    },
    /// Print a stored layout without applying it
    Show {
        /// Profile name, or a file path
        target: String,
    },
    /// List stored profiles
    List,
    /// Delete a stored profile or snapshot file
    Delete {
        /// Profile name, or a file path
        target: String,
    },
}

/// A target with a path separator or a `.json` extension is a file,
/// anything else names a profile
fn resolve_target(store: &ProfileStore, target: &str) -> Result<PathBuf> {
    let is_file = target.contains(['/', '\\'])
        || Path::new(target)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(constants::config::PROFILE_EXTENSION));
    if is_file {
        return Ok(PathBuf::from(target));
    }
    store
        .path_for(target)
        .with_context(|| format!("Invalid profile name {target:?}"))
}

fn run(command: Command, settings: &Settings) -> Result<()> {
    let store = settings.profile_store();
    let switcher = DisplaySwitcher::new(NativeApi::default());

    match command {
        Command::Save { target } => {
            let path = resolve_target(&store, &target)?;
            let snapshot = switcher
                .save_snapshot(&path)
                .with_context(|| format!("Failed to save display layout to {}", path.display()))?;
            info!(
                path = %path.display(),
                paths = snapshot.paths.len(),
                "display layout saved"
            );
        }
        Command::Load {
            target,
            no_id_match,
        } => {
            let path = resolve_target(&store, &target)?;
            let match_adapter_ids = settings.match_adapter_ids && !no_id_match;
            let tier = switcher
                .load_and_apply_snapshot(&path, match_adapter_ids)
                .with_context(|| format!("Failed to restore display layout from {}", path.display()))?;
            info!(path = %path.display(), %tier, "display layout restored");
        }
        Command::Print { all } => {
            let snapshot = switcher
                .query_current(!all)
                .context("Failed to query the current display layout")?;
            print!("{}", switcher.printable_representation(&snapshot));
        }
        Command::Show { target } => {
            let path = resolve_target(&store, &target)?;
            let snapshot = persistence::load_snapshot(&path)
                .with_context(|| format!("Failed to read display layout from {}", path.display()))?;
            print!("{}", switcher.printable_representation(&snapshot));
        }
        Command::List => {
            let names = store
                .list()
                .with_context(|| format!("Failed to list profiles in {}", store.dir().display()))?;
            if names.is_empty() {
                info!(dir = %store.dir().display(), "no stored profiles");
            }
            for name in names {
                println!("{name}");
            }
        }
        Command::Delete { target } => {
            let path = resolve_target(&store, &target)?;
            persistence::delete_snapshot(&path)
                .with_context(|| format!("Failed to delete {}", path.display()))?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Settings first, so the file can set the log level
    let settings = Settings::load();
    let log_level = if cli.debug {
        TraceLevel::DEBUG
    } else {
        settings
            .as_ref()
            .map(Settings::log_level)
            .unwrap_or(TraceLevel::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to initialise logging: {e}");
    }

    match settings.and_then(|settings| run(cli.command, &settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_load_with_flags() {
        let cli = Cli::try_parse_from(["monitor-switcher", "--debug", "load", "work", "--no-id-match"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(
            cli.command,
            Command::Load { ref target, no_id_match: true } if target == "work"
        ));
    }

    #[test]
    fn test_parse_rejects_missing_target() {
        assert!(Cli::try_parse_from(["monitor-switcher", "save"]).is_err());
    }

    #[test]
    fn test_resolve_target() {
        let store = ProfileStore::new("/profiles");
        assert_eq!(
            resolve_target(&store, "work").unwrap(),
            PathBuf::from("/profiles/work.json")
        );
        assert_eq!(
            resolve_target(&store, "layout.json").unwrap(),
            PathBuf::from("layout.json")
        );
        assert_eq!(
            resolve_target(&store, "./saved/desk").unwrap(),
            PathBuf::from("./saved/desk")
        );
        let error = resolve_target(&store, "..").unwrap_err();
        assert!(format!("{error:#}").starts_with("Invalid profile name"));
    }

    fn settings_with_profiles(dir: &Path) -> Settings {
        Settings {
            profiles_dir: Some(dir.to_path_buf()),
            ..Settings::default()
        }
    }

    #[test]
    fn test_delete_resolves_targets_like_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with_profiles(&dir.path().join("Profiles"));
        let store = settings.profile_store();
        let snapshot = topology::fixtures::single_monitor(topology::fixtures::ADAPTER_A);

        let profile = store.path_for("desk").unwrap();
        persistence::save_snapshot(&profile, &snapshot).unwrap();
        let file = dir.path().join("work.json");
        persistence::save_snapshot(&file, &snapshot).unwrap();

        run(Command::Delete { target: "desk".to_string() }, &settings).unwrap();
        assert!(!profile.exists());

        let target = file.to_string_lossy().into_owned();
        run(Command::Delete { target }, &settings).unwrap();
        assert!(!file.exists());

        assert!(run(Command::Delete { target: "desk".to_string() }, &settings).is_err());
    }
}
