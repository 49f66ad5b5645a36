//! Thin wrapper around the `docker compose` CLI.
//!
//! Build, up and down pass their output straight through to the terminal;
//! `ps` is captured and parsed so callers can inspect container states.

use std::path::PathBuf;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::EnvError;

/// One compose invocation target: the compose file plus the environment
/// injected into every call, so compose-file interpolation sees the same
/// values on build, up, down and ps.
#[derive(Debug, Clone)]
pub struct Compose {
    file: PathBuf,
    env: Vec<(String, String)>,
}

impl Compose {
    pub fn new(file: PathBuf, env: Vec<(String, String)>) -> Self {
        Self { file, env }
    }

    /// `docker compose build`
    pub async fn build(&self) -> Result<(), EnvError> {
        self.run(&["build"]).await
    }

    /// `docker compose up --detach`
    pub async fn up(&self) -> Result<(), EnvError> {
        self.run(&["up", "--detach"]).await
    }

    /// `docker compose down`
    pub async fn down(&self) -> Result<(), EnvError> {
        self.run(&["down"]).await
    }

    /// `docker compose ps --all --format json`, parsed into container states.
    ///
    /// # Errors
    ///
    /// Will return an error if the command cannot be spawned, exits non-zero
    /// or prints something that is not the expected JSON.
    pub async fn ps(&self) -> Result<Vec<ServiceStatus>, EnvError> {
        let args = self.args(&["ps", "--all", "--format", "json"]);
        debug!(?args, "running docker compose");

        let output = self.command(&args).output().await?;
        if !output.status.success() {
            return Err(EnvError::CommandFailed {
                command: display_command(&args),
                status: output.status,
            });
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        Ok(parse_ps_output(&raw)?)
    }

    async fn run(&self, subcommand: &[&str]) -> Result<(), EnvError> {
        let args = self.args(subcommand);
        debug!(?args, "running docker compose");

        let status = self.command(&args).status().await?;
        if !status.success() {
            return Err(EnvError::CommandFailed {
                command: display_command(&args),
                status,
            });
        }
        Ok(())
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new("docker");
        command.args(args);
        command.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        command
    }

    /// Full argument list for a subcommand. Split out so tests can check it.
    fn args(&self, subcommand: &[&str]) -> Vec<String> {
        let mut args = vec![
            "compose".to_string(),
            "--file".to_string(),
            self.file.display().to_string(),
        ];
        args.extend(subcommand.iter().map(ToString::to_string));
        args
    }
}

fn display_command(args: &[String]) -> String {
    format!("docker {}", args.join(" "))
}

/// One row of `docker compose ps --format json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceStatus {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Service", default)]
    pub service: String,
    #[serde(rename = "State")]
    pub state: String,
    /// Empty when the container defines no healthcheck.
    #[serde(rename = "Health", default)]
    pub health: Option<String>,
}

impl ServiceStatus {
    /// Running, and healthy where a healthcheck is defined.
    pub fn is_running(&self) -> bool {
        let healthy = match self.health.as_deref() {
            None | Some("") => true,
            Some(health) => health.eq_ignore_ascii_case("healthy"),
        };
        self.state.eq_ignore_ascii_case("running") && healthy
    }
}

/// Parse `ps --format json` output. Current Docker emits one JSON object per
/// line; older releases emit a single array. Accept both.
pub fn parse_ps_output(raw: &str) -> Result<Vec<ServiceStatus>, serde_json::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed);
    }
    trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(serde_json::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose() -> Compose {
        Compose::new(
            PathBuf::from("./docker-compose.yml"),
            vec![(
                "TORRUST_TRACKER_API_TOKEN".to_string(),
                "MyAccessToken".to_string(),
            )],
        )
    }

    #[test]
    fn args_carry_the_compose_file_and_the_subcommand() {
        assert_eq!(
            compose().args(&["up", "--detach"]),
            vec!["compose", "--file", "./docker-compose.yml", "up", "--detach"]
        );
    }

    #[test]
    fn parses_one_json_object_per_line() {
        let raw = concat!(
            r#"{"Name":"torrust-idx-back-1","Service":"idx-back","State":"running","Health":""}"#,
            "\n",
            r#"{"Name":"torrust-mysql-1","Service":"mysql","State":"running","Health":"healthy"}"#,
            "\n",
        );

        let services = parse_ps_output(raw).expect("parse failed");

        assert_eq!(services.len(), 2);
        assert_eq!(services[0].name, "torrust-idx-back-1");
        assert!(services.iter().all(ServiceStatus::is_running));
    }

    #[test]
    fn parses_the_legacy_array_form() {
        let raw = r#"[
            {"Name":"torrust-tracker-1","Service":"tracker","State":"exited"}
        ]"#;

        let services = parse_ps_output(raw).expect("parse failed");

        assert_eq!(services.len(), 1);
        assert_eq!(services[0].state, "exited");
        assert!(!services[0].is_running());
    }

    #[test]
    fn empty_output_means_no_containers() {
        let services = parse_ps_output("\n").expect("parse failed");
        assert!(services.is_empty());
    }

    #[test]
    fn running_requires_a_healthy_healthcheck_when_one_is_defined() {
        let status = ServiceStatus {
            name: "torrust-mysql-1".to_string(),
            service: "mysql".to_string(),
            state: "running".to_string(),
            health: Some("starting".to_string()),
        };
        assert!(!status.is_running());
    }
}
