mod app_config;
mod config;
mod items;
mod sites;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use items::{CatalogItem, ItemError};
pub use sites::{load_site_overrides, SiteId, SiteOverride, SitesFile, UnknownSite};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sites file {path}: {source}")]
    SitesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sites file: {0}")]
    SitesFileParse(#[from] serde_yaml::Error),

    #[error("sites file validation failed: {0}")]
    Validation(String),
}
