// HTML to PDF conversion through an external program

use super::ExportError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Converts a rendered HTML report into PDF bytes
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>, ExportError>;
}

/// Runs a converter that reads HTML on stdin and writes PDF to stdout
/// (`wkhtmltopdf - -` by default)
pub struct CommandPdfRenderer {
    command: String,
    args: Vec<String>,
}

impl CommandPdfRenderer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether the converter can be found on PATH
    pub fn is_available(&self) -> bool {
        which::which(&self.command).is_ok()
    }
}

#[async_trait]
impl PdfRenderer for CommandPdfRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, ExportError> {
        let program = which::which(&self.command).map_err(|_| {
            ExportError::Converter(format!(
                "{} not found. Please ensure it is installed and in PATH.",
                self.command
            ))
        })?;

        let mut child = Command::new(program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExportError::Converter(format!("Failed to spawn {}: {}", self.command, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A converter that exits early surfaces through its exit status below
            if let Err(e) = stdin.write_all(html.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(ExportError::Converter(format!(
                "{} failed with exit code {:?}: {}",
                self.command,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(ExportError::Converter(format!(
                "{} returned empty output",
                self.command
            )));
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_converter() {
        let renderer = CommandPdfRenderer::new("this-converter-does-not-exist-12345", vec![]);
        assert!(!renderer.is_available());
        let err = renderer.render("<p>hi</p>").await.unwrap_err();
        assert!(matches!(err, ExportError::Converter(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_converter_output_is_returned() {
        // `cat` echoes the input back, standing in for a converter
        let renderer = CommandPdfRenderer::new("cat", vec![]);
        let bytes = renderer.render("<p>report</p>").await.unwrap();
        assert_eq!(bytes, b"<p>report</p>");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_converter_failure() {
        let renderer = CommandPdfRenderer::new("false", vec![]);
        let err = renderer.render("<p>report</p>").await.unwrap_err();
        assert!(matches!(err, ExportError::Converter(_)));
    }
}
