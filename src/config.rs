use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Database connection URL
    #[arg(long, env = "SWAPMEET_DATABASE_URL")]
    pub database_url: String,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub pubsub: PubsubConfig,

    #[command(flatten)]
    pub matching: MatchingConfig,

    #[command(flatten)]
    pub policy: PolicyConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "SWAPMEET_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SWAPMEET_PORT", default_value_t = 3000)]
    pub port: u16,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Secret key for JWT verification
    #[arg(long, env = "SWAPMEET_JWT_SECRET")]
    pub jwt_secret: String,
}

#[derive(Clone, Debug, Args)]
pub struct PubsubConfig {
    /// Redis connection URL for the realtime transport
    #[arg(long, env = "SWAPMEET_REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// Capacity of each per-channel broadcast buffer
    #[arg(long, env = "SWAPMEET_CHANNEL_CAPACITY", default_value_t = 64)]
    pub channel_capacity: usize,
}

#[derive(Clone, Debug, Args)]
pub struct MatchingConfig {
    /// Maximum admissible value difference for a trade, as a fraction of the
    /// smaller item's declared value
    #[arg(long, env = "SWAPMEET_VALUE_TOLERANCE", default_value_t = 0.10)]
    pub value_tolerance: f64,
}

#[derive(Clone, Debug, Args)]
pub struct PolicyConfig {
    /// Comma-separated terms that block a message when present in its text
    #[arg(
        long,
        env = "SWAPMEET_BANNED_TERMS",
        default_value = "whatsapp,telegram,bank,transfer,venmo,zelle,pay",
        value_delimiter = ','
    )]
    pub banned_terms: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "SWAPMEET_LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
