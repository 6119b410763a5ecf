use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{cli::Cli, error::Error, sink::file};

/// Used if neither the command line, the environment nor a config file names a port.
pub const DEFAULT_PORT: &str = "/dev/tty.nodemcu";

/// See [`DEFAULT_PORT`].
pub const DEFAULT_BAUD: u32 = 230_400;

/// How long a read waits for a newline before handing out a partial line.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(200);

/// A `host:port` destination for the network sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogAddr {
    /// Host name or IP address.
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl FromStr for LogAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = match s.split(':').collect::<Vec<_>>()[..] {
            [host, port] => (host, port),
            _ => return Err(Error::log_addr(s, "expected exactly one `:` as in host:port")),
        };

        if host.is_empty() {
            return Err(Error::log_addr(s, "the host is empty"));
        }

        let port = port
            .parse::<u16>()
            .map_err(|e| Error::log_addr(s, format!("bad port `{port}`: {e}")))?;

        Ok(Self {
            host: host.into(),
            port,
        })
    }
}

impl Display for LogAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// What the sinks should do, validated at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Enables the file sink.
    pub log_dir: Option<PathBuf>,

    /// Enables the network sink.
    pub log_addr: Option<LogAddr>,

    /// Hide DEBUG output on the console.
    pub quiet: bool,
}

impl SinkConfig {
    /// Check the log directory, then parse the log address.
    ///
    /// The order matters: a bad directory is reported even if the address is also bad.
    pub fn validate(
        log_dir: Option<PathBuf>,
        log_addr: Option<&str>,
        quiet: bool,
    ) -> Result<Self, Error> {
        if let Some(dir) = &log_dir {
            file::check_writable(dir).map_err(|e| Error::log_dir(dir, e))?;
        }

        let log_addr = log_addr.map(LogAddr::from_str).transpose()?;

        Ok(Self {
            log_dir,
            log_addr,
            quiet,
        })
    }
}

/// Everything needed to start monitoring.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Serial device path.
    pub port: String,

    /// Serial baud rate.
    pub baud: u32,

    /// See [`DEFAULT_READ_TIMEOUT`].
    pub read_timeout: Duration,

    /// See [`SinkConfig`].
    pub sinks: SinkConfig,
}

impl Settings {
    /// Combine the command line (which already includes environment variables)
    /// with an optional config file, falling back to defaults.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self, Error> {
        let log_dir = match &cli.log_dir {
            // `--log-dir` without a value turns the file sink off.
            Some(dir) => dir.clone(),
            None => Some(config.log_dir.clone().unwrap_or_else(default_log_dir)),
        };

        let log_addr = match &cli.log_addr {
            Some(addr) => addr.clone(),
            None => config.log_addr.clone(),
        };

        let quiet = cli.quiet || config.quiet.unwrap_or(false);

        let sinks = SinkConfig::validate(log_dir, log_addr.as_deref(), quiet)?;

        Ok(Self {
            port: cli
                .port
                .clone()
                .or_else(|| config.port.clone())
                .unwrap_or_else(|| DEFAULT_PORT.into()),
            baud: cli.baud.or(config.baud).unwrap_or(DEFAULT_BAUD),
            read_timeout: cli
                .read_timeout_ms
                .or(config.read_timeout_ms)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_READ_TIMEOUT),
            sinks,
        })
    }
}

/// A `logs` directory next to the executable.
pub fn default_log_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Settings read from a configuration file.
/// Anything given on the command line takes precedence.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Which serial port to use.
    pub port: Option<String>,

    /// Baud rate for the serial port.
    pub baud: Option<u32>,

    /// Where to store log files.
    pub log_dir: Option<PathBuf>,

    /// Where to send log lines, `host:port`.
    pub log_addr: Option<String>,

    /// Only INFO and above on the console.
    pub quiet: Option<bool>,

    /// How long to wait for a newline, in milliseconds.
    pub read_timeout_ms: Option<u64>,
}

impl Config {
    fn ron() -> ron::Options {
        ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .with_default_extension(ron::extensions::Extensions::UNWRAP_NEWTYPES)
    }

    /// Deserialize a .ron file's contents.
    pub fn deserialize(input: &str) -> Result<Self, ron::error::SpannedError> {
        Self::ron().from_str::<Config>(input)
    }

    /// An example configuration with all fields filled in.
    pub fn example() -> Self {
        Self {
            port: Some("/dev/ttyUSB0".into()),
            baud: Some(DEFAULT_BAUD),
            log_dir: Some("/var/log/serial-monitor".into()),
            log_addr: Some("localhost:9020".into()),
            quiet: Some(false),
            read_timeout_ms: Some(DEFAULT_READ_TIMEOUT.as_millis() as u64),
        }
    }

    /// Serialize the configuration in a "pretty" (i.e. non-compact) fashion.
    pub fn serialize_pretty(&self) -> Result<String, ron::Error> {
        Self::ron().to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Setup a new configuration from a RON file.
    pub fn new_from_path<P: AsRef<Path>>(p: P) -> Result<Self, Error> {
        let path = p.as_ref();
        let bad_file = |problem: String| Error::ConfigFile {
            path: path.to_path_buf(),
            problem,
        };

        let s = std::fs::read_to_string(path).map_err(|e| bad_file(e.to_string()))?;

        Self::deserialize(&s).map_err(|e| bad_file(e.to_string()))
    }
}
