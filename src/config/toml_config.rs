use crate::adapters::{FileRecordRepository, LocalStorage};
use crate::config::validate_date_window;
use crate::core::ConfigProvider;
use crate::domain::model::{AnalysisFilters, AnalysisThresholds, Granularity, OutputFormat};
use crate::utils::error::{FarmError, Result};
use crate::utils::validation::{validate_path, validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportSection,
    pub input: InputSection,
    #[serde(default)]
    pub filters: FilterSection,
    pub thresholds: Option<ThresholdSection>,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub period: Granularity,
    pub compare_with_previous: Option<bool>,
    pub strict_validation: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSection {
    pub data_dir: String,
    pub work_file: Option<String>,
    pub cost_file: Option<String>,
    pub sales_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub crops: Vec<String>,
    pub work_types: Vec<String>,
    pub cost_categories: Vec<String>,
    pub channels: Vec<String>,
}

/// 未指定的項目沿用預設門檻
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSection {
    pub trend_min_data_points: Option<usize>,
    pub significant_change: Option<f64>,
    pub outlier_std_devs: Option<f64>,
    pub outlier_min_data_points: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub output_path: String,
    pub formats: Vec<OutputFormat>,
    pub compress: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FarmError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FARM_DATA_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| FarmError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_path("input.data_dir", &self.input.data_dir)?;
        validate_path("output.output_path", &self.output.output_path)?;

        if self.input.work_file.is_none()
            && self.input.cost_file.is_none()
            && self.input.sales_file.is_none()
        {
            return Err(FarmError::MissingConfigError {
                field: "input.work_file, input.cost_file or input.sales_file".to_string(),
            });
        }

        validate_date_window(
            "filters.",
            self.filters.start_date.as_deref(),
            self.filters.end_date.as_deref(),
        )?;

        if self.output.formats.is_empty() {
            return Err(FarmError::MissingConfigError {
                field: "output.formats".to_string(),
            });
        }

        let thresholds = self.thresholds();
        validate_positive_number(
            "thresholds.trend_min_data_points",
            thresholds.trend_min_data_points,
            2,
        )?;
        validate_positive_number(
            "thresholds.outlier_min_data_points",
            thresholds.outlier_min_data_points,
            2,
        )?;
        validate_range(
            "thresholds.significant_change",
            thresholds.significant_change,
            0.0,
            10.0,
        )?;
        validate_range(
            "thresholds.outlier_std_devs",
            thresholds.outlier_std_devs,
            0.1,
            10.0,
        )?;

        Ok(())
    }

    pub fn report_name(&self) -> &str {
        &self.report.name
    }

    pub fn record_repository(&self) -> FileRecordRepository<LocalStorage> {
        let mut repository =
            FileRecordRepository::new(LocalStorage::new(self.input.data_dir.clone()));
        if let Some(path) = &self.input.work_file {
            repository = repository.with_work_file(path.as_str());
        }
        if let Some(path) = &self.input.cost_file {
            repository = repository.with_cost_file(path.as_str());
        }
        if let Some(path) = &self.input.sales_file {
            repository = repository.with_sales_file(path.as_str());
        }
        repository
    }
}

impl ConfigProvider for TomlConfig {
    fn output_path(&self) -> &str {
        &self.output.output_path
    }

    fn granularity(&self) -> Granularity {
        self.report.period
    }

    fn filters(&self) -> AnalysisFilters {
        AnalysisFilters {
            start_date: self.filters.start_date.clone(),
            end_date: self.filters.end_date.clone(),
            crops: self.filters.crops.clone(),
            work_types: self.filters.work_types.clone(),
            cost_categories: self.filters.cost_categories.clone(),
            channels: self.filters.channels.clone(),
        }
    }

    fn thresholds(&self) -> AnalysisThresholds {
        let defaults = AnalysisThresholds::default();
        match &self.thresholds {
            None => defaults,
            Some(section) => AnalysisThresholds {
                trend_min_data_points: section
                    .trend_min_data_points
                    .unwrap_or(defaults.trend_min_data_points),
                significant_change: section
                    .significant_change
                    .unwrap_or(defaults.significant_change),
                outlier_std_devs: section.outlier_std_devs.unwrap_or(defaults.outlier_std_devs),
                outlier_min_data_points: section
                    .outlier_min_data_points
                    .unwrap_or(defaults.outlier_min_data_points),
            },
        }
    }

    fn compare_with_previous(&self) -> bool {
        self.report.compare_with_previous.unwrap_or(false)
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.output.formats
    }

    fn compress_output(&self) -> bool {
        self.output.compress.unwrap_or(false)
    }

    fn strict_validation(&self) -> bool {
        self.report.strict_validation.unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[report]
name = "autumn-report"
period = "quarterly"
compare_with_previous = true

[input]
data_dir = "./data"
work_file = "work.json"
sales_file = "sales.csv"

[filters]
start_date = "2024-01-01"
end_date = "2024-12-31"
crops = ["grape"]

[thresholds]
significant_change = 0.2

[output]
output_path = "./test-output"
formats = ["json", "csv"]
compress = true
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.report_name(), "autumn-report");
        assert_eq!(config.granularity(), Granularity::Quarterly);
        assert!(config.compare_with_previous());
        assert!(config.compress_output());
        assert!(!config.strict_validation());
        assert_eq!(config.filters().crops, vec!["grape"]);
        assert_eq!(config.thresholds().significant_change, 0.2);
        assert_eq!(config.thresholds().trend_min_data_points, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml_content = r#"
[report]
name = "minimal"

[input]
data_dir = "."
cost_file = "cost.csv"

[output]
output_path = "./output"
formats = ["json"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.granularity(), Granularity::Monthly);
        assert!(config.filters().is_unrestricted());
        assert_eq!(config.thresholds(), AnalysisThresholds::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FARM_TEST_DATA_DIR", "/srv/farm");

        let toml_content = r#"
[report]
name = "env"

[input]
data_dir = "${FARM_TEST_DATA_DIR}"
work_file = "work.json"

[output]
output_path = "${FARM_TEST_UNSET_VAR}"
formats = ["csv"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input.data_dir, "/srv/farm");
        assert_eq!(config.output_path(), "${FARM_TEST_UNSET_VAR}");

        std::env::remove_var("FARM_TEST_DATA_DIR");
    }

    #[test]
    fn test_config_validation() {
        let inverted = BASIC.replace("2024-01-01", "2025-06-01");
        let config = TomlConfig::from_toml_str(&inverted).unwrap();
        assert!(config.validate().is_err());

        let bad_threshold = BASIC.replace("significant_change = 0.2", "outlier_min_data_points = 1");
        let config = TomlConfig::from_toml_str(&bad_threshold).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_format_fails_to_parse() {
        let config = TomlConfig::from_toml_str(&BASIC.replace("\"csv\"]", "\"xlsx\"]"));
        assert!(matches!(
            config,
            Err(FarmError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.report_name(), "autumn-report");
    }
}
