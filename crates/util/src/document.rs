//! Reading and writing mapping documents.
//!
//! A document is the persisted form of a [`Mapping`]: a flat string-keyed
//! object whose range keys use the `from~to` grammar. JSON and YAML are
//! supported, chosen by file extension.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;
use valuetable_types::Mapping;

/// Errors surfaced by document operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// `.yaml` and `.yml` files are YAML; everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

pub fn parse_mapping(content: &str, format: DocumentFormat) -> Result<Mapping, DocumentError> {
    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let mapping = match format {
        DocumentFormat::Json => serde_json::from_str(content)?,
        DocumentFormat::Yaml => serde_yaml::from_str(content)?,
    };
    Ok(mapping)
}

/// Loads a mapping document. A missing file is an empty mapping.
pub fn load_mapping(path: &Path) -> Result<Mapping, DocumentError> {
    match fs::read_to_string(path) {
        Ok(content) => parse_mapping(&content, DocumentFormat::from_path(path)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "mapping document not found; starting empty");
            Ok(Mapping::new())
        }
        Err(error) => Err(DocumentError::Io(error)),
    }
}

/// Writes a mapping document, creating parent directories as needed.
pub fn save_mapping(path: &Path, mapping: &Mapping) -> Result<(), DocumentError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let data = match DocumentFormat::from_path(path) {
        DocumentFormat::Json => {
            let mut data = serde_json::to_string_pretty(mapping)?;
            data.push('\n');
            data
        }
        DocumentFormat::Yaml => serde_yaml::to_string(mapping)?,
    };
    fs::write(path, data)?;
    debug!(path = %path.display(), entries = mapping.len(), "saved mapping document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use valuetable_types::CellValue;

    #[test]
    fn missing_document_is_empty() {
        let dir = tempdir().unwrap();
        let mapping = load_mapping(&dir.path().join("absent.json")).unwrap();
        assert_eq!(mapping, Mapping::new());
    }

    #[test]
    fn json_document_keeps_range_keys_and_default_last() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ranges.json");
        let mut mapping = Mapping::new().with_default("none");
        mapping.insert("0~10", "low");
        mapping.insert("10~", "high");

        save_mapping(&path, &mapping).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        let low = written.find("\"0~10\"").unwrap();
        let default = written.find("\"default\"").unwrap();
        assert!(low < default, "default should be written last: {written}");

        assert_eq!(load_mapping(&path).unwrap(), mapping);
    }

    #[test]
    fn yaml_documents_are_detected_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flags.yml");
        fs::write(&path, "visible: true\ndefault: false\n").unwrap();

        let mapping = load_mapping(&path).unwrap();
        assert_eq!(mapping.get("visible"), Some(&CellValue::Flag(true)));
        assert_eq!(mapping.default_value(), Some(&CellValue::Flag(false)));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let error = parse_mapping("[1, 2", DocumentFormat::Json).unwrap_err();
        assert!(matches!(error, DocumentError::Json(_)));
    }
}
