use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error as ThisError;
use url::Url;

#[derive(Debug, ThisError)]
pub enum EnvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("`{command}` failed with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("missing service config: set {var} or provide {}", path.display())]
    MissingServiceConfig { var: &'static str, path: PathBuf },

    #[error("invalid database name `{0}`: only ASCII alphanumerics and `_` are allowed")]
    InvalidDatabaseName(String),

    #[error("no containers found for the compose file")]
    NoContainers,

    #[error("container `{name}` is {state}, expected running")]
    ContainerNotRunning { name: String, state: String },

    #[error("service at {url} not ready: {reason}")]
    ServiceNotReady { url: Url, reason: String },
}
