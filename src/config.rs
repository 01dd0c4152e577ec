use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::services::transfer::DEFAULT_LOG_FILE;

/// Dual-panel dashboard for copying and moving files with rclone
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory shown in the source panel at startup
    #[arg(long, env = "RCLONE_TUI_SOURCE", default_value = "/")]
    pub source: PathBuf,

    /// Directory shown in the destination panel at startup
    #[arg(long, env = "RCLONE_TUI_DEST", default_value = "/")]
    pub dest: PathBuf,

    /// Transfer tool to invoke
    #[arg(long, env = "RCLONE_TUI_TOOL", default_value = "rclone")]
    pub tool: String,

    /// Log file for detached transfers
    #[arg(long, env = "RCLONE_TUI_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Threads computing directory sizes
    #[arg(
        long,
        env = "RCLONE_TUI_SIZE_WORKERS",
        default_value_t = 4,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub size_workers: u16,

    /// Write a diagnostic log to ~/.rclone-tui/debug
    #[arg(long, env = "RCLONE_TUI_DEBUG")]
    pub debug: bool,
}

/// Startup settings after path validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub tool: String,
    pub log_file: PathBuf,
    pub size_workers: usize,
    pub debug: bool,
}

impl Settings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            source: resolve_start_dir(&args.source),
            destination: resolve_start_dir(&args.dest),
            tool: args.tool.clone(),
            log_file: args.log_file.clone(),
            size_workers: usize::from(args.size_workers.max(1)),
            debug: args.debug,
        }
    }

    /// Returns the config directory path (~/.rclone-tui)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".rclone-tui"))
    }

    /// Returns the diagnostic log directory (~/.rclone-tui/debug)
    pub fn debug_dir() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("debug"))
    }
}

fn is_readable_dir(path: &Path) -> bool {
    path.is_dir() && fs::read_dir(path).is_ok()
}

/// Get a valid directory path, falling back to parent directories if needed
pub fn get_valid_path(target_path: &Path, fallback: &Path) -> PathBuf {
    let mut current = target_path.to_path_buf();

    loop {
        if is_readable_dir(&current) {
            return current;
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => break,
        }
    }

    if is_readable_dir(fallback) {
        return fallback.to_path_buf();
    }

    PathBuf::from("/")
}

/// Absolute, existing, readable start directory for `path`. Relative paths
/// are taken from the working directory; symlinks are resolved.
pub fn resolve_start_dir(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => return PathBuf::from("/"),
        }
    };

    let valid = get_valid_path(&absolute, Path::new("/"));
    valid.canonicalize().unwrap_or(valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["rclone-tui"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        // Keep the test independent of the caller's environment.
        for var in [
            "RCLONE_TUI_SOURCE",
            "RCLONE_TUI_DEST",
            "RCLONE_TUI_TOOL",
            "RCLONE_TUI_LOG_FILE",
            "RCLONE_TUI_SIZE_WORKERS",
            "RCLONE_TUI_DEBUG",
        ] {
            if env::var_os(var).is_some() {
                return;
            }
        }
        let args = parse(&[]);
        assert_eq!(args.source, PathBuf::from("/"));
        assert_eq!(args.dest, PathBuf::from("/"));
        assert_eq!(args.tool, "rclone");
        assert_eq!(args.log_file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(args.size_workers, 4);
        assert!(!args.debug);
    }

    #[test]
    fn test_flags_override() {
        let args = parse(&[
            "--source",
            "/tmp",
            "--dest",
            "/var",
            "--tool",
            "rclone-beta",
            "--log-file",
            "/tmp/x.log",
            "--size-workers",
            "2",
            "--debug",
        ]);
        assert_eq!(args.source, PathBuf::from("/tmp"));
        assert_eq!(args.dest, PathBuf::from("/var"));
        assert_eq!(args.tool, "rclone-beta");
        assert_eq!(args.log_file, PathBuf::from("/tmp/x.log"));
        assert_eq!(args.size_workers, 2);
        assert!(args.debug);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(Args::try_parse_from(["rclone-tui", "--size-workers", "0"]).is_err());
    }

    #[test]
    fn test_missing_dir_falls_back_to_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone/deeper");
        let resolved = resolve_start_dir(&missing);
        assert_eq!(resolved, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_file_resolves_to_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, b"x").unwrap();
        assert_eq!(resolve_start_dir(&file), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_get_valid_path_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = get_valid_path(Path::new("relative/nowhere"), dir.path());
        assert_eq!(resolved, dir.path());
    }

    #[test]
    fn test_settings_from_args() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().to_string_lossy().to_string();
        let args = parse(&["--source", &src, "--dest", "/nonexistent/rclone-tui/dst", "--size-workers", "3"]);
        let settings = Settings::from_args(&args);
        assert_eq!(settings.source, dir.path().canonicalize().unwrap());
        assert_eq!(settings.destination, PathBuf::from("/"));
        assert_eq!(settings.size_workers, 3);
    }
}
