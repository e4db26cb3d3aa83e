//! Claude CLI連携モジュール
//!
//! `claude -p <prompt> --output-format text` を実行し、応答のJSONを解析する

use super::ExcuseClassifier;
use crate::error::{AttendanceError, Result};
use fellow_attendance_common::{build_excuse_prompt, parse_excuse_response, ExcuseAnalysis};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct ClaudeCliClassifier {
    program: String,
    verbose: bool,
}

impl Default for ClaudeCliClassifier {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ClaudeCliClassifier {
    pub fn new(verbose: bool) -> Self {
        Self {
            program: "claude".to_string(),
            verbose,
        }
    }

    /// 実行ファイルを差し替える（テスト用）
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn run(&self, prompt: &str) -> Result<String> {
        // Windowsではcmd /c経由
        #[cfg(windows)]
        let output = Command::new("cmd")
            .args(["/c", &self.program, "-p", prompt, "--output-format", "text"])
            .output()
            .map_err(|e| AttendanceError::CliExecution(format!("{}: {}", self.program, e)))?;

        #[cfg(not(windows))]
        let output = Command::new(&self.program)
            .args(["-p", prompt, "--output-format", "text"])
            .output()
            .map_err(|e| AttendanceError::CliExecution(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AttendanceError::ApiCall(format!(
                "Claude CLI failed (code {:?}): {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let response = String::from_utf8_lossy(&output.stdout).to_string();

        if self.verbose {
            let preview: String = response.chars().take(500).collect();
            log::debug!("claude response: {}", preview);
        }

        Ok(response)
    }
}

impl ExcuseClassifier for ClaudeCliClassifier {
    async fn classify(
        &self,
        email_body: &str,
        sender_email: &str,
        sender_name: &str,
    ) -> Result<ExcuseAnalysis> {
        let prompt = build_excuse_prompt(email_body, sender_email, sender_name);
        let response = self.run(&prompt)?;
        parse_excuse_response(&response).map_err(|e| AttendanceError::ApiParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[tokio::test]
    async fn test_missing_program_is_cli_error() {
        let classifier =
            ClaudeCliClassifier::new(false).with_program("fellow-attendance-no-such-binary");
        let err = classifier.classify("body", "a@x.com", "A").await.unwrap_err();
        assert!(matches!(err, AttendanceError::CliExecution(_)));
    }
}
