//! External-program query corrector.
//!
//! The program is started once per correction. It receives the
//! [`CorrectionRequest`] as a JSON object on stdin and must print the
//! revised query on stdout; markdown code fences are accepted. A non-zero
//! exit status counts as a failed correction.

use std::{
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::{bail, Context, Result};
use log::debug;
use quarry_core::{CorrectionRequest, Corrector};

#[derive(Debug, Clone)]
pub struct CommandCorrector {
    program: PathBuf,
}

impl CommandCorrector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Corrector for CommandCorrector {
    fn fix(&self, request: &CorrectionRequest<'_>) -> Result<String> {
        let payload = serde_json::to_vec(request).context("Failed to encode correction request")?;
        debug!(
            "Running corrector {} (attempt {})",
            self.program.display(),
            request.attempt
        );

        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start corrector {}", self.program.display()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .context("Failed to send request to corrector")?;
        }

        let output = child
            .wait_with_output()
            .context("Failed to wait for corrector")?;
        if !output.status.success() {
            bail!(
                "Corrector exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        String::from_utf8(output.stdout).context("Corrector output is not valid UTF-8")
    }
}
