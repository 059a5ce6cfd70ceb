use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const MAX_PONG_WAIT_SECS: u64 = 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,

    /// Number of rendered updates a WebSocket client may have queued before sends start waiting
    #[arg(long, env, default_value_t = ws::settings::DEFAULT_OUTBOUND_CAPACITY,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub ws_outbound_capacity: usize,

    /// Number of pending feed refresh requests; further requests coalesce into them
    #[arg(long, env, default_value_t = ws::settings::DEFAULT_BROADCAST_CAPACITY,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub ws_broadcast_capacity: usize,

    /// Seconds a refresh waits for room in a slow client's queue before it is dropped
    #[arg(long, env, default_value_t = 30)]
    pub ws_send_timeout_secs: u64,

    /// Seconds allowed for writing a single WebSocket message
    #[arg(long, env, default_value_t = 30)]
    pub ws_write_timeout_secs: u64,

    /// Keep-alive reference interval in seconds (at most one day).
    /// Keep-alive pings are sent at 90% of this interval.
    #[arg(long, env, default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..=MAX_PONG_WAIT_SECS))]
    pub ws_pong_wait_secs: u64,

    /// Maximum number of feed counter sends in flight at once, across all clients
    #[arg(long, env, default_value_t = ws::settings::DEFAULT_MAX_CONCURRENT_SENDS,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub ws_max_concurrent_sends: usize,

    /// Number of most recent feed entries considered when counting unread entries
    #[arg(long, env, default_value_t = 100)]
    pub max_feeds_per_page: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or("127.0.0.1")
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }

    /// Settings for the realtime feed notification manager.
    pub fn ws_settings(&self) -> ws::Settings {
        ws::Settings {
            outbound_capacity: self.ws_outbound_capacity,
            broadcast_capacity: self.ws_broadcast_capacity,
            send_timeout: Duration::from_secs(self.ws_send_timeout_secs),
            write_timeout: Duration::from_secs(self.ws_write_timeout_secs),
            pong_wait: Duration::from_secs(self.ws_pong_wait_secs),
            max_concurrent_sends: self.ws_max_concurrent_sends,
        }
    }
}
