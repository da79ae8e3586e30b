//! Fixed names, paths and defaults of sbconf-edit
//!
//! Grouped by the part of the tool that consumes them.

/// Document addressing constants
pub mod document {
    /// Separator between path segments ("outbounds.0.tag")
    pub const PATH_SEPARATOR: char = '.';

    /// Array-valued roots whose entries can be addressed by tag
    pub const TAGGED_ROOTS: [&str; 2] = ["outbounds", "inbounds"];

    /// Field holding the human identifier of an inbound/outbound entry
    pub const TAG_FIELD: &str = "tag";

    /// UTF-8 byte order mark some editors prepend to JSON files
    pub const BYTE_ORDER_MARK: &str = "\u{feff}";
}

/// Configuration directory file constants
pub mod files {
    /// Suffix used when stripping the extension for display
    pub const CONFIG_SUFFIX: &str = ".json";

    /// Display prefix for files without a recognized root key
    pub const UNMATCHED_PREFIX: &str = "其他-";

    /// Prefix of the temporary file used for atomic saves
    pub const TEMP_PREFIX: &str = ".sbconf-edit";

    /// Suffix of that temporary file; never `.json`, so sing-box and the
    /// directory listing both ignore it
    pub const TEMP_SUFFIX: &str = ".tmp";
}

/// sing-box config directory discovery
pub mod discovery {
    /// Preset directories probed for configuration files
    pub const DEFAULT_SEARCH_PATHS: [&str; 4] = [
        "/usr/local/etc/sing-box/conf/",
        "/etc/sing-box/conf/",
        "/root/singbox/conf/",
        "/root/sing-box/conf/",
    ];

    /// systemd units that may launch sing-box
    pub const SERVICE_FILES: [&str; 4] = [
        "/etc/systemd/system/sing-box.service",
        "/etc/systemd/system/singbox.service",
        "/usr/lib/systemd/system/sing-box.service",
        "/lib/systemd/system/sing-box.service",
    ];

    /// Unit file key carrying the launch command
    pub const EXEC_START_PREFIX: &str = "ExecStart=";

    /// sing-box flags that take the configuration directory as their argument
    pub const CONFIG_DIR_FLAGS: [&str; 2] = ["-C", "-D"];
}

/// Settings file location
pub mod config {
    /// Directory under the user's config dir
    pub const APP_DIR: &str = "sbconf-edit";

    /// Settings filename
    pub const FILENAME: &str = "settings.json";

    /// Environment variable forcing the active configuration directory
    pub const ACTIVE_DIR_ENV: &str = "SBCONF_ACTIVE_DIR";

    /// Environment variable overriding the log level
    pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
}

/// Validation through the sing-box binary
pub mod check {
    /// Program looked up on `PATH`
    pub const SING_BOX_BINARY: &str = "sing-box";

    /// Subcommand that validates a configuration without starting it
    pub const CHECK_SUBCOMMAND: &str = "check";

    /// Flag naming the configuration directory to validate
    pub const CONFIG_DIR_FLAG: &str = "-C";
}
