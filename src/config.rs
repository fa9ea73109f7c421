use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";
const DEFAULT_POLL_MS: u64 = 1000;
const DEFAULT_SUPPRESS_MS: u64 = 100;
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Command-line arguments for the capture monitor.
#[derive(Debug, Parser)]
#[command(name = "sharkwatch", about = "Live terminal view of a remote packet capture")]
pub struct Args {
    /// Capture server base URL
    #[arg(long, env = "SHARKWATCH_SERVER", default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Record poll interval while capturing, in milliseconds
    #[arg(long, env = "SHARKWATCH_POLL_MS", default_value_t = DEFAULT_POLL_MS,
          value_parser = clap::value_parser!(u64).range(50..))]
    pub poll_ms: u64,

    /// Scroll events this soon after a programmatic scroll are not user intent
    #[arg(long, env = "SHARKWATCH_SUPPRESS_MS", default_value_t = DEFAULT_SUPPRESS_MS)]
    pub suppress_ms: u64,

    /// Rows from the bottom that still count as "at the tail"
    #[arg(long, env = "SHARKWATCH_TAIL_TOLERANCE", default_value_t = 0)]
    pub tail_tolerance: usize,

    /// Per-request timeout, in milliseconds
    #[arg(long, env = "SHARKWATCH_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: u64,

    /// Directory that receives exported capture files
    #[arg(long, env = "SHARKWATCH_EXPORT_DIR", default_value = ".")]
    pub export_dir: PathBuf,

    /// Interface to preselect instead of the first active one
    #[arg(long, short, env = "SHARKWATCH_INTERFACE")]
    pub interface: Option<String>,

    /// Initial capture filter expression
    #[arg(long, short, env = "SHARKWATCH_FILTER", default_value = "")]
    pub filter: String,

    /// Write logs here; the terminal belongs to the UI
    #[arg(long, env = "SHARKWATCH_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: String,
    pub poll_interval: Duration,
    pub suppress_window: Duration,
    pub tail_tolerance: usize,
    pub request_timeout: Duration,
    pub export_dir: PathBuf,
    pub interface: Option<String>,
    pub filter: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            suppress_window: Duration::from_millis(DEFAULT_SUPPRESS_MS),
            tail_tolerance: 0,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            export_dir: PathBuf::from("."),
            interface: None,
            filter: String::new(),
            log_file: None,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            server: args.server.trim().trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(args.poll_ms),
            suppress_window: Duration::from_millis(args.suppress_ms),
            tail_tolerance: args.tail_tolerance,
            request_timeout: Duration::from_millis(args.timeout_ms),
            export_dir: args.export_dir,
            interface: args
                .interface
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            filter: args.filter,
            log_file: args.log_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_original_timings() {
        let config = Config::from(Args::parse_from(["sharkwatch"]));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.suppress_window, Duration::from_millis(100));
        assert_eq!(config.server, DEFAULT_SERVER);
        assert_eq!(config.interface, None);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::from(Args::parse_from([
            "sharkwatch",
            "--server",
            "http://capture.local:8080/",
            "--poll-ms",
            "250",
            "-i",
            " eth1 ",
            "-f",
            "tcp port 443",
        ]));
        assert_eq!(config.server, "http://capture.local:8080");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.interface.as_deref(), Some("eth1"));
        assert_eq!(config.filter, "tcp port 443");
    }

    #[test]
    fn poll_interval_has_a_floor() {
        assert!(Args::try_parse_from(["sharkwatch", "--poll-ms", "0"]).is_err());
    }
}
