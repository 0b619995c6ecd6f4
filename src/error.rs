use std::path::PathBuf;

use thiserror::Error;

/// Main application error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("File system traversal error: {path} - {reason}")]
    FileSystemTraversal { path: PathBuf, reason: String },

    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },

    #[error("Report serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-specific error types
///
/// Any of these aborts the run before the first comparison starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    #[error("Invalid epsilon '{value}': {reason}")]
    InvalidEpsilon { value: String, reason: String },

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

/// Errors raised while turning a file into an `XmlDocument`.
///
/// These stay local to one file pair.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed XML in {source_id}: {details}")]
    Parse { source_id: String, details: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CompareError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Document result type alias
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_error_display() {
        let io_error = CompareError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "File not found",
        ));
        assert!(io_error.to_string().contains("IO error"));

        let traversal = CompareError::FileSystemTraversal {
            path: PathBuf::from("/data/ControlXML"),
            reason: "not a directory".to_string(),
        };
        assert!(traversal.to_string().contains("ControlXML"));
        assert!(traversal.to_string().contains("not a directory"));
    }

    #[test]
    fn test_config_error_display() {
        let epsilon = ConfigError::InvalidEpsilon {
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        assert!(epsilon.to_string().contains("Invalid epsilon 'abc'"));

        let missing = ConfigError::MissingField {
            field: "epsilon".to_string(),
        };
        assert!(missing.to_string().contains("epsilon"));
    }

    #[test]
    fn test_document_error_display() {
        let parse = DocumentError::Parse {
            source_id: "orders.xml".to_string(),
            details: "unexpected end of stream".to_string(),
        };
        assert!(parse.to_string().contains("Malformed XML in orders.xml"));
    }

    #[test]
    fn test_config_error_conversion() {
        let config_error = ConfigError::Validation("threads".to_string());
        let error: CompareError = config_error.into();

        match error {
            CompareError::Config(_) => (),
            _ => panic!("Expected CompareError::Config"),
        }
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let error = DocumentError::Io {
            path: PathBuf::from("a.xml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
        };

        let source = error.source().unwrap();
        assert_eq!(source.to_string(), "File not found");
    }
}
