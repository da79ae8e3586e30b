//! Locating sing-box configuration directories
//!
//! The systemd unit is the most reliable source: its `ExecStart=` line names
//! the directory passed with `-C` (or `-D`). The preset search paths fill in
//! whatever else exists on the machine.

use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

use super::settings::Settings;
use crate::constants::discovery::{CONFIG_DIR_FLAGS, EXEC_START_PREFIX};

/// Outcome of probing the machine for configuration directories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Discovery {
    /// Readable directories, cleaned, deduplicated and sorted
    pub found_paths: Vec<PathBuf>,
    /// Directory named by the systemd unit, when it exists
    pub systemd_default: Option<PathBuf>,
    /// Where editing starts: the systemd directory, else the first found
    #[serde(rename = "current_active_path")]
    pub initial_active: Option<PathBuf>,
}

/// Lexically normalize a path (drops `.` components and trailing slashes)
pub fn clean_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Whether `path` is an existing, listable directory
pub fn is_valid_config_dir(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => match fs::read_dir(path) {
            Ok(_) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Directory is not readable");
                false
            }
        },
        Ok(_) => false,
        Err(e) => {
            if !matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ) {
                warn!(path = %path.display(), error = %e, "Cannot access path");
            }
            false
        }
    }
}

/// Config directory named on an `ExecStart=` line of a unit file
pub fn parse_exec_start(unit: &str) -> Option<PathBuf> {
    for line in unit.lines() {
        let Some(command) = line.trim().strip_prefix(EXEC_START_PREFIX) else {
            continue;
        };
        let parts: Vec<&str> = command.split_whitespace().collect();
        for (i, part) in parts.iter().enumerate() {
            if CONFIG_DIR_FLAGS.contains(part) {
                if let Some(dir) = parts.get(i + 1) {
                    return Some(clean_path(Path::new(dir)));
                }
            }
        }
    }
    None
}

/// First config directory found in the given unit files
pub fn detect_systemd_config_path(service_files: &[PathBuf]) -> Option<PathBuf> {
    for service_file in service_files {
        let Ok(contents) = fs::read_to_string(service_file) else {
            continue;
        };
        if let Some(path) = parse_exec_start(&contents) {
            info!(path = %path.display(), unit = %service_file.display(), "Detected config path from systemd unit");
            return Some(path);
        }
    }
    None
}

/// Probe the unit files and search paths from `settings`
pub fn discover(settings: &Settings) -> Discovery {
    let mut found_paths = Vec::new();

    let systemd_default = detect_systemd_config_path(&settings.service_files).filter(|path| {
        let valid = is_valid_config_dir(path);
        if !valid {
            warn!(path = %path.display(), "systemd config path does not exist or is not readable");
        }
        valid
    });
    if let Some(path) = &systemd_default {
        found_paths.push(path.clone());
    }

    for candidate in &settings.search_paths {
        let candidate = clean_path(candidate);
        if is_valid_config_dir(&candidate) && !found_paths.contains(&candidate) {
            found_paths.push(candidate);
        }
    }
    found_paths.sort();

    let initial_active = systemd_default.clone().or_else(|| found_paths.first().cloned());

    info!(
        found = found_paths.len(),
        systemd = ?systemd_default,
        active = ?initial_active,
        "Config directory discovery finished"
    );

    Discovery {
        found_paths,
        systemd_default,
        initial_active,
    }
}
