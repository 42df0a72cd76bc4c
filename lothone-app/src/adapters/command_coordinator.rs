//! Service coordinator that runs a supervisor command

use std::time::Duration;

use async_trait::async_trait;
use lothone_core::error::{CoreError, CoreResult};
use lothone_core::traits::ServiceCoordinator;
use lothone_core::utils::log_sanitizer::truncate_for_log;
use tokio::process::Command;

/// Restarts the proxy daemon with e.g. `systemctl restart v2ray`.
pub struct CommandServiceCoordinator {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandServiceCoordinator {
    /// # Arguments
    /// * `command` - Program followed by its arguments
    /// * `timeout` - Bound on one restart; `None` waits for the command to exit
    pub fn new(command: &[String], timeout: Option<Duration>) -> CoreResult<Self> {
        let (program, args) = command
            .split_first()
            .filter(|(program, _)| !program.trim().is_empty())
            .ok_or_else(|| CoreError::validation("restart_command", "must name a program"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn failure(&self, detail: impl Into<String>) -> CoreError {
        CoreError::ExternalService {
            service: self.describe(),
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl ServiceCoordinator for CommandServiceCoordinator {
    async fn restart(&self) -> CoreResult<()> {
        log::info!("Running `{}`", self.describe());
        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);

        let output = command.output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output)
                .await
                .map_err(|_| self.failure(format!("timed out after {}s", limit.as_secs())))?,
            None => output.await,
        }
        .map_err(|e| self.failure(format!("failed to spawn: {e}")))?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(self.failure(format!(
            "{}: {}",
            output.status,
            truncate_for_log(stderr.trim())
        )))
    }
}
