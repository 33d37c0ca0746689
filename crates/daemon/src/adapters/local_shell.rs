// SPDX-License-Identifier: MIT

//! Runs the self-host drift probe as a child process rather than over a
//! remote session, since the appliance scans itself in-place.

use appliance_scanner::LocalShell;
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

pub struct ProcessLocalShell {
    shell: String,
}

impl ProcessLocalShell {
    pub fn new(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }
}

impl Default for ProcessLocalShell {
    fn default() -> Self {
        Self::new(if cfg!(windows) { "powershell" } else { "/bin/sh" })
    }
}

#[async_trait]
impl LocalShell for ProcessLocalShell {
    async fn run(&self, script: &str, timeout: Duration) -> Result<String, String> {
        let mut command = Command::new(&self.shell);
        if self.shell.contains("powershell") {
            command.arg("-NoProfile").arg("-Command").arg(script);
        } else {
            command.arg("-c").arg(script);
        }

        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| "local shell timed out".to_string())?
            .map_err(|err| format!("failed to spawn local shell: {err}"))?;

        if !output.status.success() {
            return Err(format!(
                "local shell exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
