//! File-level operations on the active configuration directory
//!
//! Every call is a fresh read (and, for saves, a fresh write) of the files on
//! disk; nothing is cached between calls.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Output};
use tracing::{error, info, warn};

use crate::classify::{classify, Classification};
use crate::config::discovery::is_valid_config_dir;
use crate::config::{discover, ActiveDirectory, Discovery, Settings};
use crate::constants::check::{CHECK_SUBCOMMAND, CONFIG_DIR_FLAG, SING_BOX_BINARY};
use crate::constants::files::{CONFIG_SUFFIX, TEMP_PREFIX, TEMP_SUFFIX};
use crate::keys::{list_keys, KeyListing};
use crate::{patch, resolve};

/// Candidate files of a directory with whatever could be read of them
#[derive(Debug, Default)]
pub struct DirectorySnapshot {
    /// Sorted filenames
    pub files: Vec<String>,
    /// Contents by filename; unreadable files are absent
    pub contents: HashMap<String, Vec<u8>>,
}

/// Classification of the active directory
#[derive(Debug, Serialize)]
pub struct FunctionalConfigs {
    #[serde(flatten)]
    pub classification: Classification,
    pub active_config_path: PathBuf,
}

/// Discovery report plus the directory currently selected
#[derive(Debug, Serialize)]
pub struct ConfigPaths {
    pub found_paths: Vec<PathBuf>,
    pub systemd_default: Option<PathBuf>,
    pub current_active_path: Option<PathBuf>,
}

fn is_config_file(name: &str) -> bool {
    name.ends_with(CONFIG_SUFFIX)
}

/// Regular `.json` files directly inside `dir`, sorted
pub fn list_config_files(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read configuration directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
        if file_type.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = %entry.path().display(), "Skipping file with non UTF-8 name");
            continue;
        };
        if is_config_file(&name) {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

/// List and read every candidate file of `dir`
pub fn snapshot(dir: &Path) -> Result<DirectorySnapshot> {
    let files = list_config_files(dir)?;
    let mut contents = HashMap::with_capacity(files.len());
    for file in &files {
        match fs::read(dir.join(file)) {
            Ok(bytes) => {
                contents.insert(file.clone(), bytes);
            }
            Err(e) => warn!(file = %file, error = %e, "Failed to read config file"),
        }
    }
    Ok(DirectorySnapshot { files, contents })
}

/// Full path of `filename` after checking it names a `.json` file that lives
/// directly in `dir`
pub fn validate_filename(dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.is_empty() {
        bail!("Filename is empty");
    }
    if !is_config_file(filename) {
        bail!("Invalid file type '{filename}', only .json files are allowed");
    }
    let mut components = Path::new(filename).components();
    if !matches!((components.next(), components.next()), (Some(Component::Normal(_)), None)) {
        bail!("Access outside the configuration directory is not allowed: '{filename}'");
    }

    let exists = list_config_files(dir)
        .context("Failed to validate filename")?
        .iter()
        .any(|name| name == filename);
    if !exists {
        bail!("File '{filename}' not found in the configuration directory");
    }
    Ok(dir.join(filename))
}

/// Replace `path` with `bytes` via a temporary file in the same directory
/// and a rename.
///
/// The temporary name is random and ends in `.tmp`, so a leftover from a
/// crash is neither listed here nor loaded by `sing-box run -C`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    temp.write_all(bytes)
        .with_context(|| format!("Failed to write temporary file {}", temp.path().display()))?;
    temp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush temporary file {}", temp.path().display()))?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(temp.path(), meta.permissions())
            .with_context(|| format!("Failed to copy permissions onto {}", temp.path().display()))?;
    }

    temp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Outcome of validating a directory with `sing-box check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub success: bool,
    /// stdout followed by stderr
    pub output: String,
}

impl CheckReport {
    /// sing-box prints nothing for a clean configuration; any output,
    /// warnings included, counts as a failed check
    pub fn from_output(output: &Output) -> Self {
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Self {
            success: output.status.success() && text.trim().is_empty(),
            output: text,
        }
    }
}

/// `sing-box check -C <dir>`
pub fn check_command(dir: &Path) -> Command {
    let mut command = Command::new(SING_BOX_BINARY);
    command.arg(CHECK_SUBCOMMAND).arg(CONFIG_DIR_FLAG).arg(dir);
    command
}

/// Operations the front end performs against the active directory
#[derive(Debug, Clone)]
pub struct Workspace {
    settings: Settings,
    active: ActiveDirectory,
}

impl Workspace {
    pub fn new(settings: Settings, active: ActiveDirectory) -> Self {
        Self { settings, active }
    }

    /// Start from the environment override, the remembered directory, the
    /// systemd directory or the first directory found, in that order
    pub fn open(settings: Settings) -> Self {
        let remembered = settings
            .active_dir
            .clone()
            .filter(|dir| is_valid_config_dir(dir));
        let initial = Settings::active_dir_override()
            .or(remembered)
            .or_else(|| discover(&settings).initial_active);
        info!(active = ?initial, "Opening workspace");
        Self::new(settings, ActiveDirectory::new(initial))
    }

    pub fn active(&self) -> &ActiveDirectory {
        &self.active
    }

    pub fn config_paths(&self) -> ConfigPaths {
        let Discovery {
            found_paths,
            systemd_default,
            ..
        } = discover(&self.settings);
        ConfigPaths {
            found_paths,
            systemd_default,
            current_active_path: self.active.get(),
        }
    }

    pub fn set_active(&self, path: &Path) -> Result<PathBuf> {
        self.active.set(path)
    }

    pub fn functional_configs(&self) -> Result<FunctionalConfigs> {
        let dir = self.active.require()?;
        let snapshot = snapshot(&dir)?;
        let classification = classify(&snapshot.files, &snapshot.contents);
        info!(
            dir = %dir.display(),
            files = classification.files.len(),
            unmatched = classification.unmatched.len(),
            "Classified configuration directory"
        );
        Ok(FunctionalConfigs {
            classification,
            active_config_path: dir,
        })
    }

    /// Run `sing-box check` against the active directory
    pub fn check_config(&self) -> Result<CheckReport> {
        let dir = self.active.require()?;
        let output = check_command(&dir)
            .output()
            .with_context(|| format!("Failed to run {SING_BOX_BINARY} {CHECK_SUBCOMMAND}"))?;
        let report = CheckReport::from_output(&output);
        if report.success {
            info!(dir = %dir.display(), "Configuration check passed");
        } else {
            warn!(dir = %dir.display(), status = %output.status, "Configuration check failed");
        }
        Ok(report)
    }

    fn read_file(&self, filename: &str) -> Result<(PathBuf, Vec<u8>)> {
        let dir = self.active.require()?;
        let path = validate_filename(&dir, filename)?;
        let bytes = fs::read(&path).with_context(|| format!("Failed to read file '{filename}'"))?;
        Ok((path, bytes))
    }

    pub fn top_keys(&self, filename: &str) -> Result<KeyListing> {
        let (_, bytes) = self.read_file(filename)?;
        list_keys(&bytes).with_context(|| format!("Cannot list keys of '{filename}'"))
    }

    pub fn resolve_path(&self, filename: &str, path: &str) -> Result<String> {
        let (_, bytes) = self.read_file(filename)?;
        Ok(resolve::resolve(&bytes, path))
    }

    pub fn get_content(&self, filename: &str, path: &str) -> Result<String> {
        let (_, bytes) = self.read_file(filename)?;
        patch::read(&bytes, path).with_context(|| format!("Cannot read '{path}' from '{filename}'"))
    }

    /// Read-modify-write of one file; nothing touches the disk on failure
    pub fn save_content(&self, filename: &str, path: &str, content: &str) -> Result<()> {
        let (file_path, bytes) = self.read_file(filename)?;
        let updated = patch::write(&bytes, path, content).inspect_err(|e| {
            error!(file = %filename, path = %path, error = %e, "Failed to apply edit");
        })?;
        write_atomic(&file_path, &updated)?;
        info!(file = %filename, path = %path, bytes = updated.len(), "Saved file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;
    use tempfile::TempDir;

    fn workspace_with(files: &[(&str, &str)]) -> (TempDir, Workspace) {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let settings = Settings {
            search_paths: Vec::new(),
            service_files: Vec::new(),
            active_dir: None,
            log_level: "info".to_string(),
        };
        let workspace = Workspace::new(settings, ActiveDirectory::new(Some(dir.path().to_path_buf())));
        (dir, workspace)
    }

    const OUTBOUNDS: &str = "{\n  // upstreams\n  \"outbounds\": [\n    {\"type\": \"direct\", \"tag\": \"direct\"},\n    {\"type\": \"vless\", \"tag\": \"hk\", \"server\": \"1.2.3.4\"}\n  ]\n}\n";

    #[test]
    fn test_list_config_files_filters_and_sorts() {
        let (dir, _) = workspace_with(&[("b.json", "{}"), ("a.json", "{}"), ("notes.txt", "")]);
        fs::create_dir(dir.path().join("sub.json")).unwrap();
        assert_eq!(list_config_files(dir.path()).unwrap(), vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_validate_filename_rules() {
        let (dir, _) = workspace_with(&[("a.json", "{}")]);
        assert_eq!(validate_filename(dir.path(), "a.json").unwrap(), dir.path().join("a.json"));
        assert!(validate_filename(dir.path(), "").is_err());
        assert!(validate_filename(dir.path(), "a.txt").is_err());
        assert!(validate_filename(dir.path(), "../a.json").is_err());
        assert!(validate_filename(dir.path(), "sub/a.json").is_err());
        assert!(validate_filename(dir.path(), "/etc/a.json").is_err());
        assert!(validate_filename(dir.path(), "missing.json").is_err());
    }

    #[test]
    fn test_save_by_tag_preserves_comments() {
        let (dir, workspace) = workspace_with(&[("20_out.json", OUTBOUNDS)]);
        workspace
            .save_content("20_out.json", "outbounds.hk", r#"{"type": "vless", "tag": "hk", "server": "5.6.7.8"}"#)
            .unwrap();

        let saved = fs::read_to_string(dir.path().join("20_out.json")).unwrap();
        assert!(saved.contains("// upstreams"));
        assert_eq!(workspace.get_content("20_out.json", "outbounds.1.server").unwrap(), "5.6.7.8");
        assert_eq!(workspace.get_content("20_out.json", "outbounds.0.tag").unwrap(), "direct");
    }

    #[test]
    fn test_failed_save_leaves_file_untouched() {
        let (dir, workspace) = workspace_with(&[("20_out.json", OUTBOUNDS)]);
        let err = workspace.save_content("20_out.json", "outbounds.jp", "{}").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DocumentError>(),
            Some(DocumentError::PathNotFound { .. })
        ));
        assert_eq!(fs::read_to_string(dir.path().join("20_out.json")).unwrap(), OUTBOUNDS);
        assert_eq!(list_config_files(dir.path()).unwrap(), vec!["20_out.json"]);
    }

    #[test]
    fn test_save_whole_document() {
        let (dir, workspace) = workspace_with(&[("00_log.json", r#"{"log":{}}"#)]);
        workspace.save_content("00_log.json", "", "{\"log\": {\"level\": \"warn\"}}").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("00_log.json")).unwrap(),
            "{\"log\": {\"level\": \"warn\"}}"
        );
    }

    #[test]
    fn test_top_keys_and_resolve() {
        let (_dir, workspace) = workspace_with(&[("20_out.json", OUTBOUNDS)]);
        let keys = workspace.top_keys("20_out.json").unwrap();
        assert_eq!(keys.context_key.as_deref(), Some("outbounds"));
        assert_eq!(keys.keys, vec!["direct", "hk"]);
        assert_eq!(workspace.resolve_path("20_out.json", "outbounds.hk").unwrap(), "outbounds.1");
    }

    #[test]
    fn test_functional_configs() {
        let (dir, workspace) = workspace_with(&[
            ("a.json", r#"{"log":{}}"#),
            ("b.json", r#"{"log":{}}"#),
            ("c.json", r#"{"foo": 1}"#),
            ("readme.md", "not a config"),
        ]);
        let configs = workspace.functional_configs().unwrap();
        let entries: Vec<(&str, &str)> = configs
            .classification
            .ordered
            .iter()
            .map(|e| (e.name.as_str(), e.file.as_str()))
            .collect();
        assert_eq!(entries, vec![("日志 1", "a.json"), ("日志 2", "b.json"), ("其他-c", "c.json")]);
        assert_eq!(configs.active_config_path, dir.path());
    }

    #[test]
    fn test_open_prefers_remembered_directory() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            search_paths: Vec::new(),
            service_files: Vec::new(),
            active_dir: Some(dir.path().to_path_buf()),
            log_level: "info".to_string(),
        };
        // only meaningful when the environment does not force a directory
        if Settings::active_dir_override().is_none() {
            let workspace = Workspace::open(settings);
            assert_eq!(workspace.active().get(), Some(dir.path().to_path_buf()));
        }
    }

    #[test]
    fn test_no_active_directory() {
        let workspace = Workspace::new(Settings::default(), ActiveDirectory::default());
        assert!(workspace.functional_configs().is_err());
        assert!(workspace.top_keys("a.json").is_err());
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.json");
        fs::write(&path, "old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.json");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o640);
    }

    #[test]
    fn test_leftover_temp_file_is_not_listed() {
        let (dir, _) = workspace_with(&[("a.json", "{}")]);
        let leftover = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir.path())
            .unwrap();
        let (_, leftover_path) = leftover.keep().unwrap();
        assert!(leftover_path.exists());
        assert_eq!(list_config_files(dir.path()).unwrap(), vec!["a.json"]);
    }

    #[test]
    fn test_check_command_arguments() {
        let command = check_command(Path::new("/etc/sing-box/conf"));
        assert_eq!(command.get_program(), SING_BOX_BINARY);
        let args: Vec<&std::ffi::OsStr> = command.get_args().collect();
        assert_eq!(args, vec!["check", "-C", "/etc/sing-box/conf"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_check_report_requires_clean_exit_and_silence() {
        use std::os::unix::process::ExitStatusExt;

        let output = |code: i32, stdout: &str, stderr: &str| Output {
            status: std::process::ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        };

        assert!(CheckReport::from_output(&output(0, "", "")).success);

        let report = CheckReport::from_output(&output(1, "", "FATAL decode config: unknown field\n"));
        assert!(!report.success);
        assert_eq!(report.output, "FATAL decode config: unknown field\n");

        let report = CheckReport::from_output(&output(0, "WARN deprecated field\n", ""));
        assert!(!report.success);
    }

    #[test]
    fn test_check_needs_active_directory() {
        let workspace = Workspace::new(Settings::default(), ActiveDirectory::default());
        assert!(workspace.check_config().is_err());
    }
}
