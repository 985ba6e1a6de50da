use crate::domain::model::{inches, TextStyle};
use crate::utils::error::{DeckError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Order files the resolver knows how to read.
pub const ORDER_FILE_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods", "csv"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub paths: PathsConfig,
    pub naming: NamingConfig,
    pub order: OrderConfig,
    pub layout: LayoutConfig,
    pub text: TextConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub template: PathBuf,
    pub image_root: PathBuf,
    pub order_file: Option<PathBuf>,
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            template: PathBuf::from("template.pptx"),
            image_root: PathBuf::from("images"),
            order_file: None,
            output: PathBuf::from("report.pptx"),
        }
    }
}

/// File naming inside each business's asset folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub asset_dir: String,
    pub venue_capture: String,
    pub price_prefix: String,
    /// Tried in order; the first extension with any match wins.
    pub price_extensions: Vec<String>,
    pub interior_prefix: String,
    pub interior_extension: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            asset_dir: "업체".to_string(),
            venue_capture: "캡처.png".to_string(),
            price_prefix: "가격표_".to_string(),
            price_extensions: vec!["jpg".to_string(), "png".to_string()],
            interior_prefix: "업체_".to_string(),
            interior_extension: "jpg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// 1-based column holding the business name.
    pub name_column: usize,
    pub header_rows: usize,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            name_column: 3,
            header_rows: 1,
        }
    }
}

/// Slide geometry, in inches unless noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub margin_left: f64,
    pub margin_right: f64,
    pub content_top: f64,
    pub margin_bottom: f64,
    pub title_top: f64,
    pub title_height: f64,
    pub gap: f64,
    /// Width/height ratio above which an interior image gets its own slide.
    pub wide_threshold: f64,
    pub max_group: usize,
    /// 0-based slide layout used for generated slides.
    pub slide_layout_index: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_left: 0.5,
            margin_right: 0.5,
            content_top: 1.5,
            margin_bottom: 0.5,
            title_top: 0.5,
            title_height: 1.0,
            gap: 0.2,
            wide_threshold: 1.3,
            max_group: 3,
            slide_layout_index: 5,
        }
    }
}

impl LayoutConfig {
    pub fn margins(&self) -> Margins {
        Margins {
            left: inches(self.margin_left),
            right: inches(self.margin_right),
            top: inches(self.content_top),
            bottom: inches(self.margin_bottom),
        }
    }

    pub fn gap_emu(&self) -> f64 {
        inches(self.gap)
    }
}

/// Content-box margins in EMU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub font_family: String,
    pub size_pt: f64,
    /// Language tag on text runs, e.g. `ko-KR`; empty omits it.
    pub language: String,
    pub deck_title: String,
    /// Heading on price slides; empty disables it.
    pub price_heading: String,
    /// Heading on image-group slides; empty disables it.
    pub interior_heading: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_family: "Malgun Gothic".to_string(),
            size_pt: 28.0,
            language: "ko-KR".to_string(),
            deck_title: "업체 정보".to_string(),
            price_heading: "가격표".to_string(),
            interior_heading: "인테리어".to_string(),
        }
    }
}

impl TextConfig {
    pub fn style(&self) -> TextStyle {
        TextStyle {
            font_family: self.font_family.clone(),
            size_pt: self.size_pt,
            bold: true,
            language: self.language.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of businesses in a sample run.
    pub sample_size: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { sample_size: 10 }
    }
}

impl DeckConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeckError::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DeckError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("paths.template", &self.paths.template)?;
        validation::validate_path("paths.image_root", &self.paths.image_root)?;
        validation::validate_path("paths.output", &self.paths.output)?;
        if let Some(order_file) = &self.paths.order_file {
            validation::validate_file_extension(
                "paths.order_file",
                order_file,
                ORDER_FILE_EXTENSIONS,
            )?;
        }

        validation::validate_non_empty_string("naming.asset_dir", &self.naming.asset_dir)?;
        validation::validate_non_empty_string("naming.price_prefix", &self.naming.price_prefix)?;
        validation::validate_non_empty_string(
            "naming.interior_prefix",
            &self.naming.interior_prefix,
        )?;
        validation::validate_non_empty_string(
            "naming.interior_extension",
            &self.naming.interior_extension,
        )?;
        validation::validate_positive_number(
            "naming.price_extensions",
            self.naming.price_extensions.len(),
            1,
        )?;

        validation::validate_positive_number("order.name_column", self.order.name_column, 1)?;

        validation::validate_range("layout.gap", self.layout.gap, 0.0, 5.0)?;
        validation::validate_range("layout.max_group", self.layout.max_group, 1, 3)?;
        if self.layout.wide_threshold <= 0.0 {
            return Err(DeckError::InvalidConfigValueError {
                field: "layout.wide_threshold".to_string(),
                value: self.layout.wide_threshold.to_string(),
                reason: "Threshold must be positive".to_string(),
            });
        }
        for (field, value) in [
            ("layout.margin_left", self.layout.margin_left),
            ("layout.margin_right", self.layout.margin_right),
            ("layout.content_top", self.layout.content_top),
            ("layout.margin_bottom", self.layout.margin_bottom),
            ("layout.title_top", self.layout.title_top),
            ("layout.title_height", self.layout.title_height),
        ] {
            validation::validate_range(field, value, 0.0, 20.0)?;
        }

        validation::validate_non_empty_string("text.font_family", &self.text.font_family)?;
        validation::validate_range("text.size_pt", self.text.size_pt, 1.0, 400.0)?;
        validation::validate_positive_number("run.sample_size", self.run.sample_size, 1)?;

        Ok(())
    }
}

impl Validate for DeckConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_config_file_is_configuration_error() {
        let err = DeckConfig::from_file("/no/such/shop-deck.toml").unwrap_err();
        assert!(matches!(err, DeckError::ConfigError { .. }));
        assert_eq!(err.category(), crate::utils::error::ErrorCategory::Configuration);
        assert_eq!(err.severity(), crate::utils::error::ErrorSeverity::High);
        assert!(err.to_string().contains("/no/such/shop-deck.toml"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = DeckConfig::from_toml_str("").unwrap();
        assert_eq!(config.naming.asset_dir, "업체");
        assert_eq!(config.order.name_column, 3);
        assert_eq!(config.layout.max_group, 3);
        assert!((config.layout.wide_threshold - 1.3).abs() < f64::EPSILON);
        assert_eq!(config.run.sample_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sections() {
        let toml_content = r#"
[paths]
template = "deck/template.pptx"
image_root = "photos"
order_file = "order.xlsx"
output = "out/report.pptx"

[naming]
price_extensions = ["png"]

[layout]
gap = 0.25
wide_threshold = 1.5

[text]
font_family = "Noto Sans KR"
size_pt = 24
language = "en-US"
"#;

        let config = DeckConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.paths.template, PathBuf::from("deck/template.pptx"));
        assert_eq!(config.paths.order_file, Some(PathBuf::from("order.xlsx")));
        assert_eq!(config.naming.price_extensions, vec!["png".to_string()]);
        assert_eq!(config.naming.interior_prefix, "업체_");
        assert!((config.layout.gap - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.text.style().font_family, "Noto Sans KR");
        assert!(config.text.style().bold);
        assert_eq!(config.text.style().language, "en-US");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SHOP_DECK_TEST_ROOT", "/data/photos");

        let config = DeckConfig::from_toml_str(
            r#"
[paths]
image_root = "${SHOP_DECK_TEST_ROOT}/seoul"
"#,
        )
        .unwrap();
        assert_eq!(config.paths.image_root, PathBuf::from("/data/photos/seoul"));

        std::env::remove_var("SHOP_DECK_TEST_ROOT");
    }

    #[test]
    fn test_config_validation() {
        let mut config = DeckConfig::default();
        config.layout.max_group = 4;
        assert!(config.validate().is_err());

        let mut config = DeckConfig::default();
        config.paths.order_file = Some(PathBuf::from("order.txt"));
        assert!(config.validate().is_err());

        let mut config = DeckConfig::default();
        config.order.name_column = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_a_configuration_error() {
        let err = DeckConfig::from_toml_str("[layout]\ngap = \"wide\"").unwrap_err();
        assert_eq!(err.category(), crate::utils::error::ErrorCategory::Configuration);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[run]\nsample_size = 5\n")
            .unwrap();

        let config = DeckConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.run.sample_size, 5);
    }
}
