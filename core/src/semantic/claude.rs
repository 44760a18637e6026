//! Adapter that hands the analysis request to an external command: the
//! `claude` CLI by default, or a configured replacement.
//!
//! The child process is killed when the returned future is dropped, which
//! is how the pipeline's timeout and abort stop it.

use super::prompt::build_analysis_prompt;
use super::{CollaboratorError, SemanticAnalyzer, SemanticRequest, SemanticResponse};
use futures::future::{BoxFuture, FutureExt};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct ClaudeAnalyzer {
    model: String,
    custom_command: Option<String>,
}

impl ClaudeAnalyzer {
    pub fn new(model: impl Into<String>, custom_command: Option<String>) -> Self {
        Self {
            model: model.into(),
            custom_command,
        }
    }

    /// Whether a backend can be launched at all.
    pub fn is_available(&self) -> bool {
        self.custom_command.is_some() || find_executable("claude").is_some()
    }

    /// The custom command runs an arbitrary program and must only come
    /// from trusted configuration.
    fn command(&self) -> Result<Command, CollaboratorError> {
        if let Some(custom) = &self.custom_command {
            let mut parts = custom.split_whitespace();
            let program = parts.next().ok_or_else(|| {
                CollaboratorError::CommandFailed("Custom command is empty".to_owned())
            })?;
            let mut cmd = Command::new(program);
            cmd.args(parts);
            return Ok(cmd);
        }

        let claude = find_executable("claude").ok_or_else(|| {
            CollaboratorError::Unavailable("claude CLI not found on PATH".to_owned())
        })?;
        let mut cmd = Command::new(claude);
        cmd.args(["--print", "--model", self.model.as_str()]);
        Ok(cmd)
    }

    async fn run(&self, prompt: String) -> Result<String, CollaboratorError> {
        let mut child = self
            .command()?
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(std::env::temp_dir())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CollaboratorError::CommandFailed(e.to_string()))?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(prompt.as_bytes()).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            let detail = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            return Err(CollaboratorError::CommandFailed(detail));
        }
        if let Err(e) = fed {
            log::debug!("[semantic] Command exited before reading the whole prompt: {e}");
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() {
            return Err(CollaboratorError::EmptyResponse);
        }
        Ok(stdout)
    }
}

impl SemanticAnalyzer for ClaudeAnalyzer {
    fn analyze<'a>(
        &'a self,
        request: &'a SemanticRequest,
    ) -> BoxFuture<'a, Result<SemanticResponse, CollaboratorError>> {
        async move {
            let prompt = build_analysis_prompt(request);
            log::debug!(
                "[semantic] Sending {} chars to {}",
                prompt.len(),
                self.custom_command.as_deref().unwrap_or("claude")
            );
            let output = self.run(prompt).await?;
            parse_response(&output)
        }
        .boxed()
    }
}

/// First `name` executable on PATH, then under `~/.local/bin`.
fn find_executable(name: &str) -> Option<PathBuf> {
    let file = if cfg!(target_os = "windows") {
        format!("{name}.exe")
    } else {
        name.to_owned()
    };
    let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default();
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".local/bin"));
    }
    dirs.into_iter().map(|dir| dir.join(&file)).find(|p| p.is_file())
}

/// Decode the outermost JSON object in `output`, ignoring any fences or
/// prose around it.
fn parse_response(output: &str) -> Result<SemanticResponse, CollaboratorError> {
    let json = output
        .find('{')
        .zip(output.rfind('}'))
        .filter(|(start, end)| start < end)
        .map(|(start, end)| &output[start..=end]);
    let Some(json) = json else {
        let preview: String = output.trim().chars().take(200).collect();
        return Err(CollaboratorError::ParseError(format!(
            "No JSON object in output: {preview}"
        )));
    };
    serde_json::from_str(json)
        .map_err(|e| CollaboratorError::ParseError(format!("Invalid response JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskLevel;
    use std::time::{Duration, Instant};

    fn empty_request() -> SemanticRequest {
        SemanticRequest::new(("A", "contract A {}"), ("B", "contract B {}"), &[], &[], 100)
    }

    #[test]
    fn test_parse_fenced_response() {
        let output = "Here is the analysis:\n```json\n{\"summary\": \"s\", \"riskLevel\": \"medium\"}\n```\nDone.";
        let response = parse_response(output).unwrap();
        assert_eq!(response.summary, "s");
        assert_eq!(response.risk_level, Some(RiskLevel::Medium));
    }

    #[test]
    fn test_parse_response_errors() {
        assert!(matches!(
            parse_response("no structured output"),
            Err(CollaboratorError::ParseError(_))
        ));
        assert!(matches!(
            parse_response("} backwards {"),
            Err(CollaboratorError::ParseError(_))
        ));
        assert!(matches!(
            parse_response(r#"{"riskLevel": "extreme"}"#),
            Err(CollaboratorError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_custom_command() {
        let analyzer = ClaudeAnalyzer::new("sonnet", Some("   ".to_owned()));
        let request = empty_request();
        assert!(matches!(
            analyzer.analyze(&request).await,
            Err(CollaboratorError::CommandFailed(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_custom_command_receives_prompt_on_stdin() {
        // `wc -c` consumes the whole prompt and prints a byte count.
        let analyzer = ClaudeAnalyzer::new("sonnet", Some("wc -c".to_owned()));
        assert!(analyzer.is_available());
        let request = empty_request();
        assert!(matches!(
            analyzer.analyze(&request).await,
            Err(CollaboratorError::ParseError(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_custom_command_output_is_decoded() {
        let analyzer = ClaudeAnalyzer::new("sonnet", Some(r#"echo {"summary":"echoed"}"#.to_owned()));
        let request = empty_request();
        let response = analyzer.analyze(&request).await.unwrap();
        assert_eq!(response.summary, "echoed");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dropping_the_call_stops_a_slow_command() {
        let analyzer = ClaudeAnalyzer::new("sonnet", Some("sleep 5".to_owned()));
        let request = empty_request();
        let started = Instant::now();
        let result =
            tokio::time::timeout(Duration::from_millis(200), analyzer.analyze(&request)).await;
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
