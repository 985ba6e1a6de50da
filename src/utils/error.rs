use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("XML error in {part}: {message}")]
    XmlError { part: String, message: String },

    #[error("Template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("Invalid template: {message}")]
    InvalidTemplate { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Document error: {message}")]
    DocumentError { message: String },

    #[error("Unsupported image format: {}", path.display())]
    UnsupportedImage { path: PathBuf },

    #[error("Run cancelled by user")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Lookup,
    Asset,
    Output,
    Interaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DeckError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn document(message: impl Into<String>) -> Self {
        Self::DocumentError {
            message: message.into(),
        }
    }

    pub fn xml(part: impl Into<String>, message: impl ToString) -> Self {
        Self::XmlError {
            part: part.into(),
            message: message.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TemplateNotFound { .. }
            | Self::InvalidTemplate { .. }
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_) => ErrorCategory::Configuration,
            Self::SpreadsheetError(_) | Self::CsvError(_) => ErrorCategory::Lookup,
            Self::ImageError(_) | Self::UnsupportedImage { .. } => ErrorCategory::Asset,
            Self::Cancelled => ErrorCategory::Interaction,
            Self::ZipError(_)
            | Self::IoError(_)
            | Self::XmlError { .. }
            | Self::DocumentError { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Interaction => ErrorSeverity::Low,
            ErrorCategory::Lookup | ErrorCategory::Asset => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::TemplateNotFound { .. } => {
                "Check the --template path or the [paths] template entry in the config file"
            }
            Self::InvalidTemplate { .. } => {
                "Re-save the template from PowerPoint as a .pptx file with at least one slide layout"
            }
            Self::TomlError(_)
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Fix the reported configuration value and run again"
            }
            Self::SpreadsheetError(_) | Self::CsvError(_) => {
                "Check that the order file is a readable .xlsx, .xls, .ods or .csv file"
            }
            Self::ImageError(_) | Self::UnsupportedImage { .. } => {
                "Re-export the image as JPEG or PNG"
            }
            Self::ZipError(_) | Self::XmlError { .. } | Self::DocumentError { .. } => {
                "Check that the template is a valid PowerPoint file"
            }
            Self::IoError(_) => "Check file permissions and free disk space for the output path",
            Self::Cancelled => "Run again and confirm to generate the deck",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Lookup => format!("Could not read the order file: {}", self),
            ErrorCategory::Asset => format!("Could not use an image: {}", self),
            ErrorCategory::Output => format!("Failed to write the presentation: {}", self),
            ErrorCategory::Interaction => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_template_is_a_high_severity_configuration_error() {
        let err = DeckError::TemplateNotFound {
            path: PathBuf::from("template.pptx"),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("template.pptx"));
    }

    #[test]
    fn test_save_failure_is_critical() {
        let err = DeckError::from(std::io::Error::other("disk full"));
        assert_eq!(err.category(), ErrorCategory::Output);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_cancellation_is_low_severity() {
        assert_eq!(DeckError::Cancelled.severity(), ErrorSeverity::Low);
    }
}
