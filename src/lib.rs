pub mod adapters;
#[cfg(feature = "cli")]
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{FileRecordRepository, LocalStorage};
#[cfg(feature = "cli")]
pub use config::{toml_config::TomlConfig, CliConfig};

pub use core::aggregate::{
    aggregate_cost_data, aggregate_work_data, aggregate_work_with_sales, compare_with_previous,
};
pub use core::consistency::validate_data_consistency;
pub use core::efficiency::calculate_efficiency;
pub use core::engine::AnalysisEngine;
pub use core::filter::{filter_cost_records, filter_sales_records, filter_work_records};
pub use core::period::{period_key, period_range};
pub use core::pipeline::{build_report, AnalysisPipeline, ReportOptions};
pub use core::stats::{calculate_statistics, detect_outliers};
pub use core::trend::analyze_trend;
pub use domain::model::*;
pub use utils::error::{FarmError, Result};
