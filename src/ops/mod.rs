//! Environment lifecycle: the up, down, reset and status procedures.

mod ready;

use tracing::info;
use url::Url;

use crate::compose::{Compose, ServiceStatus};
use crate::config::{self, Config};
use crate::db;
use crate::error::EnvError;

pub struct E2eEnv {
    cfg: Config,
}

impl E2eEnv {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Build the container images and start the environment.
    ///
    /// # Errors
    ///
    /// Will return an error if a service config cannot be resolved, if a
    /// `docker compose` invocation exits non-zero, or (with `wait`) if the
    /// environment never becomes ready.
    pub async fn up(&self, wait: bool) -> Result<(), EnvError> {
        let compose = self.compose()?;

        info!(compose_file = %self.cfg.compose_file.display(), "building container images");
        compose.build().await?;

        info!("starting containers");
        compose.up().await?;

        if wait {
            ready::wait_for_ready(&compose, &self.probes()).await?;
            info!("environment is up and ready");
        }
        Ok(())
    }

    /// Stop and remove the containers.
    ///
    /// # Errors
    ///
    /// Will return an error if a service config cannot be resolved or if
    /// `docker compose down` exits non-zero.
    pub async fn down(&self) -> Result<(), EnvError> {
        info!("stopping containers");
        self.compose()?.down().await
    }

    /// Tear everything down, wipe both test databases and start again.
    ///
    /// # Errors
    ///
    /// Will return an error if any step fails; later steps are not attempted.
    pub async fn reset(&self, wait: bool) -> Result<(), EnvError> {
        self.down().await?;

        info!(
            database = %self.cfg.idx_back_mysql_database,
            mysql_url = %config::redacted(&self.cfg.mysql_url),
            "resetting index backend database"
        );
        db::mysql::reset_database(&self.cfg.mysql_url, &self.cfg.idx_back_mysql_database).await?;

        info!(
            file = %self.cfg.tracker_database_file.display(),
            "resetting tracker database"
        );
        db::sqlite::reset_database(&self.cfg.tracker_database_file).await?;

        self.up(wait).await
    }

    /// Container states as reported by `docker compose ps`.
    ///
    /// # Errors
    ///
    /// Will return an error if a service config cannot be resolved or if the
    /// `ps` invocation fails.
    pub async fn status(&self) -> Result<Vec<ServiceStatus>, EnvError> {
        self.compose()?.ps().await
    }

    fn compose(&self) -> Result<Compose, EnvError> {
        Ok(Compose::new(
            self.cfg.compose_file.clone(),
            self.injected_env()?,
        ))
    }

    /// The environment handed to every `docker compose` invocation: the same
    /// variables the compose file interpolates, with defaults applied.
    ///
    /// # Errors
    ///
    /// Will return an error if a mandatory service config is missing.
    pub fn injected_env(&self) -> Result<Vec<(String, String)>, EnvError> {
        let mut env = vec![
            (
                "TORRUST_IDX_BACK_USER_UID".to_string(),
                self.cfg.idx_back_user_uid.to_string(),
            ),
            (
                "TORRUST_IDX_BACK_CONFIG".to_string(),
                self.cfg.idx_back_config_contents()?,
            ),
            (
                "TORRUST_IDX_BACK_MYSQL_DATABASE".to_string(),
                self.cfg.idx_back_mysql_database.clone(),
            ),
            (
                "TORRUST_TRACKER_CONFIG".to_string(),
                self.cfg.tracker_config_contents()?,
            ),
            (
                "TORRUST_TRACKER_API_TOKEN".to_string(),
                self.cfg.tracker_api_token.clone(),
            ),
        ];
        if let Some(index_config) = self.cfg.index_config_contents()? {
            env.push(("TORRUST_INDEX_CONFIG".to_string(), index_config));
        }
        Ok(env)
    }

    fn probes(&self) -> [Url; 2] {
        [
            self.cfg.tracker_health_url.clone(),
            self.cfg.index_health_url.clone(),
        ]
    }
}
