pub mod app_config;
pub mod config;
pub mod period;
pub mod records;
pub mod sites;

use thiserror::Error;

pub use app_config::{AppConfig, DatabaseConfig, DbConfig};
pub use config::{
    load_app_config, load_app_config_from_env, load_db_config, load_db_config_from_env,
};
pub use period::{
    month_label, monthly_periods, monthly_periods_from_str, parse_date, Period, PeriodError,
};
pub use records::{
    Channel, ChannelTotals, OrganicPageRecord, SearchQueryRecord, TrafficByUrlRecord,
};
pub use sites::{load_sites, parse_sites, SitesFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sites file {path}: {source}")]
    SitesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sites file: {0}")]
    SitesFileParse(#[source] serde_yaml::Error),

    #[error("invalid sites config: {0}")]
    Validation(String),
}
