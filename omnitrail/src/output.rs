//! Output formatting for the CLI.
//!
//! Text mode prints the ADG listing followed by the pretty envelope; JSON mode
//! prints one compact document.

use anyhow::Result;
use omnitrail_core::{Algorithm, Envelope, Trail, format_adg};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writer for command output with format abstraction.
pub struct OutputWriter {
    format: OutputFormat,
    stdout: io::Stdout,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            stdout: io::stdout(),
        }
    }

    /// Render a completed trail in the configured format.
    pub fn render(&self, trail: &Trail) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut json = serde_json::to_string(&TrailOutput::from_trail(trail))?;
                json.push('\n');
                Ok(json)
            }
            OutputFormat::Text => {
                let mut text = format_adg(trail);
                text.push_str(&serde_json::to_string_pretty(trail.envelope())?);
                text.push('\n');
                Ok(text)
            }
        }
    }

    /// Write a completed trail to stdout.
    pub fn write_trail(&self, trail: &Trail) -> Result<()> {
        let rendered = self.render(trail)?;
        let mut handle = self.stdout.lock();
        handle.write_all(rendered.as_bytes())?;
        handle.flush()?;
        Ok(())
    }

    /// Write an error message to stderr.
    ///
    /// In JSON mode, writes a JSON error object with success=false.
    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        match self.format {
            OutputFormat::Json => {
                let error_output = ErrorOutput {
                    success: false,
                    result_code,
                    error: format!("{:#}", error),
                };
                if let Ok(json) = serde_json::to_string(&error_output) {
                    let _ = writeln!(io::stderr(), "{}", json);
                }
            }
            OutputFormat::Text => {
                let _ = writeln!(io::stderr(), "Error: {:#}", error);
            }
        }
    }
}

/// Error output structure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// The JSON document: ADG exports per enabled algorithm plus the envelope.
#[derive(Debug, Serialize)]
pub struct TrailOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha1: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<BTreeMap<String, String>>,
    pub envelope: &'a Envelope,
}

impl<'a> TrailOutput<'a> {
    pub fn from_trail(trail: &'a Trail) -> Self {
        let enabled = |algorithm| trail.algorithms().contains(&algorithm);
        Self {
            sha1: enabled(Algorithm::Sha1).then(|| trail.sha1_adgs()),
            sha256: enabled(Algorithm::Sha256).then(|| trail.sha256_adgs()),
            envelope: trail.envelope(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scanned(algorithms: &[Algorithm]) -> (TempDir, Trail) {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("sub/file.txt"), b"content").unwrap();

        let mut trail = Trail::builder()
            .algorithms(algorithms.iter().copied())
            .allow(temp_dir.path())
            .build()
            .unwrap();
        trail.add(temp_dir.path()).unwrap();
        (temp_dir, trail)
    }

    #[test]
    fn test_json_document_shape() {
        let (_temp_dir, trail) = scanned(&Algorithm::ALL);
        let rendered = OutputWriter::new(true).render(&trail).unwrap();
        assert_eq!(rendered.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        // two directories plus the file
        assert_eq!(object["sha1"].as_object().unwrap().len(), 3);
        assert_eq!(object["sha256"].as_object().unwrap().len(), 3);
        assert!(object["envelope"]["mapping"].is_object());
        assert!(object["envelope"]["header"]["features"]["file"].is_object());
    }

    #[test]
    fn test_json_omits_disabled_algorithms() {
        let (_temp_dir, trail) = scanned(&[Algorithm::Sha256]);
        let rendered = OutputWriter::new(true).render(&trail).unwrap();

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert!(value.get("sha1").is_none());
        assert!(value.get("sha256").is_some());
    }

    #[test]
    fn test_text_listing_then_envelope() {
        let (_temp_dir, trail) = scanned(&Algorithm::ALL);
        let rendered = OutputWriter::new(false).render(&trail).unwrap();
        let listing = format_adg(&trail);
        assert!(rendered.starts_with(&listing));

        let envelope: Envelope = serde_json::from_str(&rendered[listing.len()..]).unwrap();
        assert_eq!(&envelope, trail.envelope());
    }
}
