pub mod toml_config;

use crate::adapters::{FileRecordRepository, LocalStorage};
use crate::core::ConfigProvider;
use crate::domain::model::{
    AnalysisFilters, AnalysisThresholds, Granularity, OutputFormat,
};
use crate::utils::error::{FarmError, Result};
use crate::utils::validation::{validate_date, validate_path, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "farm-analytics")]
#[command(about = "Aggregate farm work, cost and sales records into a period report")]
pub struct CliConfig {
    #[arg(long, default_value = ".", help = "Directory the record files are read from")]
    pub data_dir: String,

    #[arg(long)]
    pub work_file: Option<String>,

    #[arg(long)]
    pub cost_file: Option<String>,

    #[arg(long)]
    pub sales_file: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "monthly", help = "weekly, monthly, quarterly or yearly")]
    pub period: Granularity,

    #[arg(long, help = "Inclusive start date (YYYY-MM-DD)")]
    pub start_date: Option<String>,

    #[arg(long, help = "Inclusive end date (YYYY-MM-DD)")]
    pub end_date: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub crops: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub work_types: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub cost_categories: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub channels: Vec<String>,

    #[arg(long, help = "Compare every period with the same period one year earlier")]
    pub compare_previous: bool,

    #[arg(long, value_delimiter = ',', default_value = "json,csv")]
    pub formats: Vec<OutputFormat>,

    #[arg(long, help = "Bundle the report files into a single zip archive")]
    pub zip: bool,

    #[arg(long, help = "Fail on the first invalid record instead of skipping it")]
    pub strict: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn record_repository(&self) -> FileRecordRepository<LocalStorage> {
        let mut repository = FileRecordRepository::new(LocalStorage::new(self.data_dir.clone()));
        if let Some(path) = &self.work_file {
            repository = repository.with_work_file(path.as_str());
        }
        if let Some(path) = &self.cost_file {
            repository = repository.with_cost_file(path.as_str());
        }
        if let Some(path) = &self.sales_file {
            repository = repository.with_sales_file(path.as_str());
        }
        repository
    }
}

impl ConfigProvider for CliConfig {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn granularity(&self) -> Granularity {
        self.period
    }

    fn filters(&self) -> AnalysisFilters {
        AnalysisFilters {
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            crops: self.crops.clone(),
            work_types: self.work_types.clone(),
            cost_categories: self.cost_categories.clone(),
            channels: self.channels.clone(),
        }
    }

    fn thresholds(&self) -> AnalysisThresholds {
        AnalysisThresholds::default()
    }

    fn compare_with_previous(&self) -> bool {
        self.compare_previous
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    fn compress_output(&self) -> bool {
        self.zip
    }

    fn strict_validation(&self) -> bool {
        self.strict
    }
}

/// 日期區間的共用檢查：格式正確且起日不晚於迄日
pub(crate) fn validate_date_window(
    field_prefix: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<()> {
    if let Some(start) = start_date {
        validate_date(&format!("{}start_date", field_prefix), start)?;
    }
    if let Some(end) = end_date {
        validate_date(&format!("{}end_date", field_prefix), end)?;
    }
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(FarmError::ConfigValidationError {
                field: format!("{}start_date", field_prefix),
                message: format!("start date {} is after end date {}", start, end),
            });
        }
    }
    Ok(())
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("data_dir", &self.data_dir)?;
        validate_path("output_path", &self.output_path)?;
        validate_date_window("", self.start_date.as_deref(), self.end_date.as_deref())?;

        if self.formats.is_empty() {
            return Err(FarmError::MissingConfigError {
                field: "formats".to_string(),
            });
        }

        if self.work_file.is_none() && self.cost_file.is_none() && self.sales_file.is_none() {
            return Err(FarmError::MissingConfigError {
                field: "work_file, cost_file or sales_file".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_arguments() {
        let config = CliConfig::try_parse_from([
            "farm-analytics",
            "--work-file",
            "work.json",
            "--period",
            "quarterly",
            "--crops",
            "grape,potato",
            "--formats",
            "json",
            "--start-date",
            "2024-01-01",
        ])
        .unwrap();

        assert_eq!(config.granularity(), Granularity::Quarterly);
        assert_eq!(config.filters().crops, vec!["grape", "potato"]);
        assert_eq!(config.output_formats(), &[OutputFormat::Json]);
        assert_eq!(config.filters().start_date.as_deref(), Some("2024-01-01"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_cli_values() {
        let config = CliConfig::try_parse_from(["farm-analytics", "--sales-file", "s.csv"]).unwrap();
        assert_eq!(config.granularity(), Granularity::Monthly);
        assert_eq!(config.output_formats(), &[OutputFormat::Json, OutputFormat::Csv]);
        assert!(config.filters().is_unrestricted());
        assert!(!config.compress_output());
    }

    #[test]
    fn test_rejects_unknown_period() {
        assert!(CliConfig::try_parse_from(["farm-analytics", "--period", "daily"]).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let config = CliConfig::try_parse_from(["farm-analytics"]).unwrap();
        assert!(matches!(
            config.validate(),
            Err(FarmError::MissingConfigError { .. })
        ));

        let config = CliConfig::try_parse_from([
            "farm-analytics",
            "--work-file",
            "work.json",
            "--start-date",
            "2024-12-01",
            "--end-date",
            "2024-01-01",
        ])
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(FarmError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_timestamp_filter_bounds_are_rejected() {
        let config = CliConfig::try_parse_from([
            "farm-analytics",
            "--work-file",
            "work.json",
            "--start-date",
            "2024-01-01T00:00:00Z",
        ])
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(FarmError::InvalidConfigValueError { ref field, .. }) if field == "start_date"
        ));
    }
}
