use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Result, ToolError};
use crate::redact::redact_env;

/// Describes how to run a tool inside a container: the image to use, host
/// paths to bind-mount, environment to set, host environment variables to
/// pass through verbatim, and the command to execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerEngineSpec {
    pub image: String,
    #[serde(default)]
    pub mounts: Vec<(String, String)>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub env_passthrough: Vec<String>,
    pub command: Vec<String>,
}

/// Runs tool invocations by shelling out to the `docker` CLI, the same
/// strategy the execution-engine layer uses for any externally-managed
/// runtime it doesn't want to reimplement a client library for.
pub struct ContainerEngine {
    docker_bin: String,
}

impl ContainerEngine {
    pub fn new() -> Self {
        Self {
            docker_bin: "docker".to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_binary(docker_bin: impl Into<String>) -> Self {
        Self {
            docker_bin: docker_bin.into(),
        }
    }

    pub async fn run(&self, spec: &ContainerEngineSpec) -> Result<String> {
        let mut args: Vec<String> = vec!["run".into(), "--rm".into()];

        for (host, container) in &spec.mounts {
            args.push("-v".into());
            args.push(format!("{host}:{container}"));
        }
        for (key, value) in &spec.env {
            args.push("-e".into());
            args.push(format!("{key}={value}"));
        }
        for key in &spec.env_passthrough {
            args.push("-e".into());
            args.push(key.clone());
        }
        args.push(spec.image.clone());
        args.extend(spec.command.iter().cloned());

        debug!(
            image = %spec.image,
            env = ?redact_env(&spec.env),
            "invoking container engine"
        );

        self.run_docker(&args).await
    }

    async fn run_docker(&self, args: &[String]) -> Result<String> {
        let output = Command::new(&self.docker_bin)
            .args(args)
            .output()
            .await
            .map_err(|e| ToolError::EngineSpawn(format!("failed to exec docker: {e}")))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(%stderr, "container run failed");
            Err(ToolError::ExecutionFailed(format!(
                "docker {} failed: {}",
                args.first().map(String::as_str).unwrap_or(""),
                stderr.trim()
            )))
        }
    }
}

impl Default for ContainerEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_surfaces_spawn_error() {
        let engine = ContainerEngine::with_binary("praxis-nonexistent-binary");
        let spec = ContainerEngineSpec {
            image: "alpine".into(),
            mounts: vec![],
            env: BTreeMap::new(),
            env_passthrough: vec![],
            command: vec!["echo".into(), "hi".into()],
        };
        let err = engine.run(&spec).await.unwrap_err();
        assert!(matches!(err, ToolError::EngineSpawn(_)));
    }

    #[test]
    fn redact_env_hides_secrets_before_logging() {
        let mut env = BTreeMap::new();
        env.insert("TOKEN".to_string(), "abc123".to_string());
        let redacted = redact_env(&env);
        assert_eq!(redacted["TOKEN"], "***redacted***");
    }
}
