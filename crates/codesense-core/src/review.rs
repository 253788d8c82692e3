use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;

/// Extensions the analysis service is known to accept. Only used as a hint:
/// the service has the final say.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["py", "js", "java", "ts", "cpp", "c"];

/// A source file picked by the user, held in memory until it is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub payload: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Read a file from disk, keeping only its file name (not the full path).
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let payload = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, payload })
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|e| e.to_str())
    }

    pub fn is_supported_source(&self) -> bool {
        self.extension()
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Content type sent with the multipart part, inferred from the extension.
    pub fn content_type(&self) -> &'static str {
        match self.extension().map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("py") => "text/x-python",
            Some("js") => "text/javascript",
            Some("ts") => "application/typescript",
            Some("java") => "text/x-java-source",
            Some("c") | Some("h") => "text/x-c",
            Some("cpp") | Some("cc") | Some("hpp") => "text/x-c++",
            Some("txt") | Some("md") => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

/// The structured review returned by the analysis service.
///
/// `score` is nominally 0-10 but is never validated or clamped here; it is a
/// rendering hint. Unknown fields in the response are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub score: f64,
    pub summary: String,
    pub readability: String,
    pub modularity: String,
    pub bugs: String,
    pub suggestions: String,
}

impl ReviewRecord {
    pub fn from_json(body: &str) -> Result<Self, Error> {
        serde_json::from_str(body).map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}

/// Format a score exactly as received. Whole numbers print without a
/// decimal point; nothing is rounded.
pub fn format_score(score: f64) -> String {
    format!("{}", score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ignores_extra_fields() {
        let body = r#"{"score": 7, "summary": "s", "readability": "r", "modularity": "m",
            "bugs": "b", "suggestions": "x", "model": "gemini"}"#;
        let record = ReviewRecord::from_json(body).unwrap();
        assert_eq!(record.score, 7.0);
        assert_eq!(record.suggestions, "x");
    }

    #[test]
    fn test_record_missing_field_is_malformed() {
        let body = r#"{"score": 7, "summary": "s", "readability": "r", "modularity": "m", "bugs": "b"}"#;
        let err = ReviewRecord::from_json(body).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(ref m) if m.contains("suggestions")));
    }

    #[test]
    fn test_record_keeps_out_of_range_score() {
        let body = r#"{"score": 42.5, "summary": "", "readability": "", "modularity": "",
            "bugs": "", "suggestions": ""}"#;
        assert_eq!(ReviewRecord::from_json(body).unwrap().score, 42.5);
    }

    #[test]
    fn test_supported_source_hint() {
        assert!(SelectedFile::new("main.py", "print(1)").is_supported_source());
        assert!(SelectedFile::new("Lib.CPP", "").is_supported_source());
        assert!(!SelectedFile::new("notes.txt", "").is_supported_source());
        assert!(!SelectedFile::new("Makefile", "").is_supported_source());
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(SelectedFile::new("main.py", "").content_type(), "text/x-python");
        assert_eq!(SelectedFile::new("blob", "").content_type(), "application/octet-stream");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(9.0), "9");
        assert_eq!(format_score(7.5), "7.5");
        assert_eq!(format_score(f64::NAN), "NaN");
        assert_eq!(format_score(7.96), "7.96");
        assert_eq!(format_score(8.75), "8.75");
        assert_eq!(format_score(1e20), "100000000000000000000");
    }
}
