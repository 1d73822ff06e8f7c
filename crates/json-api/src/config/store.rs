//! Store Config

use std::time::Duration;

use clap::Args;

/// Where token documents live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreBackend {
    /// `PostgreSQL`, migrated on startup.
    Postgres,

    /// Process-local; everything is lost on restart.
    Memory,
}

/// Store settings.
#[derive(Debug, Args)]
pub struct StoreConfig {
    /// Store backend (postgres, memory)
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value_t = StoreBackend::Postgres)]
    pub store: StoreBackend,

    /// `PostgreSQL` connection string (required for the postgres backend)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Seconds between sweeps of expired tokens (0 disables the sweep)
    #[arg(long, env = "SWEEP_INTERVAL_SECONDS", default_value_t = 0_u64)]
    pub sweep_interval_seconds: u64,
}

impl StoreConfig {
    /// Sweep period, if the sweep is enabled.
    #[must_use]
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_seconds > 0).then(|| Duration::from_secs(self.sweep_interval_seconds))
    }
}
