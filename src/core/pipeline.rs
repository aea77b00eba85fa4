use crate::core::aggregate::{
    aggregate_cost_data, aggregate_work_with_sales, compare_with_previous_with,
};
use crate::core::consistency::validate_data_consistency;
use crate::core::efficiency::calculate_efficiency;
use crate::core::filter::{
    available_channels, available_cost_categories, available_crops, available_work_types,
    filter_cost_records, filter_sales_records, filter_work_records,
};
use crate::core::period::UNKNOWN_PERIOD;
use crate::core::sales::{aggregate_crop_sales, analyze_channels, crop_composition};
use crate::core::stats::{calculate_statistics, detect_outliers_with};
use crate::core::trend::analyze_trend_with;
use crate::core::{ConfigProvider, Pipeline, RecordRepository, Storage};
use crate::domain::model::{
    AggregatedCostData, AggregatedWorkData, AnalysisFilters, AnalysisReport, AnalysisThresholds,
    AvailableOptions, ConsistencyReport, DataIssue, Granularity, OutputFormat, PeriodComparison,
    RecordCounts, RecordSet, SeriesStatistics, StatisticsSummary, TrendSummary,
};
use crate::utils::error::{FarmError, Result};
use crate::utils::validation::Validate;
use std::collections::BTreeSet;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const REPORT_ARCHIVE: &str = "farm_report.zip";
pub const REPORT_JSON: &str = "report.json";
pub const WORK_SUMMARY_CSV: &str = "work_summary.csv";
pub const COST_SUMMARY_CSV: &str = "cost_summary.csv";

/// transform 階段需要的分析設定
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub granularity: Granularity,
    pub filters: AnalysisFilters,
    pub thresholds: AnalysisThresholds,
    pub compare_with_previous: bool,
}

impl ReportOptions {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            granularity: config.granularity(),
            filters: config.filters(),
            thresholds: config.thresholds(),
            compare_with_previous: config.compare_with_previous(),
        }
    }
}

pub struct AnalysisPipeline<R: RecordRepository, S: Storage, C: ConfigProvider> {
    repository: R,
    storage: S,
    config: C,
}

impl<R: RecordRepository, S: Storage, C: ConfigProvider> AnalysisPipeline<R, S, C> {
    pub fn new(repository: R, storage: S, config: C) -> Self {
        Self {
            repository,
            storage,
            config,
        }
    }
}

/// 邊界驗證：無效記錄在 strict 模式下直接報錯，否則略過並記錄警告。回傳有效記錄與略過筆數
fn keep_valid<T: Validate>(records: Vec<T>, kind: &str, strict: bool) -> Result<(Vec<T>, usize)> {
    let total = records.len();
    let mut valid = Vec::with_capacity(total);
    for record in records {
        match record.validate() {
            Ok(()) => valid.push(record),
            Err(e) if strict => return Err(e),
            Err(e) => tracing::warn!("Skipping invalid {} record: {}", kind, e),
        }
    }
    let skipped = total - valid.len();
    if skipped > 0 {
        tracing::warn!("Kept {}/{} {} records", valid.len(), total, kind);
    }
    Ok((valid, skipped))
}

#[async_trait::async_trait]
impl<R: RecordRepository, S: Storage, C: ConfigProvider> Pipeline for AnalysisPipeline<R, S, C> {
    async fn extract(&self) -> Result<RecordSet> {
        let strict = self.config.strict_validation();

        let (work, skipped_work) =
            keep_valid(self.repository.load_work_records().await?, "work", strict)?;
        let (cost, skipped_cost) =
            keep_valid(self.repository.load_cost_records().await?, "cost", strict)?;
        let (sales, skipped_sales) =
            keep_valid(self.repository.load_sales_records().await?, "sales", strict)?;

        tracing::debug!(
            "Loaded {} work, {} cost, {} sales records",
            work.len(),
            cost.len(),
            sales.len()
        );

        Ok(RecordSet {
            work,
            cost,
            sales,
            skipped: RecordCounts {
                work: skipped_work,
                cost: skipped_cost,
                sales: skipped_sales,
            },
        })
    }

    async fn transform(&self, data: RecordSet) -> Result<AnalysisReport> {
        let options = ReportOptions::from_config(&self.config);
        Ok(build_report(&data, &options))
    }

    async fn load(&self, report: AnalysisReport) -> Result<String> {
        let formats = self.config.output_formats();
        let mut files: Vec<(&str, Vec<u8>)> = Vec::new();

        if formats.contains(&OutputFormat::Json) {
            files.push((REPORT_JSON, serde_json::to_vec_pretty(&report)?));
        }
        if formats.contains(&OutputFormat::Csv) {
            files.push((WORK_SUMMARY_CSV, work_summary_csv(&report.work)?));
            files.push((COST_SUMMARY_CSV, cost_summary_csv(&report.cost)?));
        }

        if files.is_empty() {
            return Err(FarmError::ConfigError {
                message: "No output format selected".to_string(),
            });
        }

        let output_path = self.config.output_path();

        if self.config.compress_output() {
            tracing::debug!("Creating ZIP file with {} files", files.len());

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for (name, data) in &files {
                    zip.start_file(*name, SimpleFileOptions::default())?;
                    zip.write_all(data)?;
                }
                zip.finish()?.into_inner()
            };

            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(REPORT_ARCHIVE, &zip_data).await?;
            return Ok(format!("{}/{}", output_path, REPORT_ARCHIVE));
        }

        for (name, data) in &files {
            tracing::debug!("Writing {} ({} bytes)", name, data.len());
            self.storage.write_file(name, data).await?;
        }
        Ok(output_path.to_string())
    }
}

/// 對記錄套用篩選、彙總、效率、趨勢與統計，組成完整報告
pub fn build_report(data: &RecordSet, options: &ReportOptions) -> AnalysisReport {
    let granularity = options.granularity;
    let thresholds = &options.thresholds;

    let work = filter_work_records(&data.work, &options.filters);
    let cost = filter_cost_records(&data.cost, &options.filters);
    let sales = filter_sales_records(&data.sales, &options.filters);

    tracing::debug!(
        "Filtered to {} work, {} cost, {} sales records",
        work.len(),
        cost.len(),
        sales.len()
    );

    let work_groups = aggregate_work_with_sales(&work, &sales, granularity);
    let cost_groups = aggregate_cost_data(&cost, &sales, granularity);

    // 無法解析日期的群組不放進跨期間序列
    let dated_work: Vec<&AggregatedWorkData> = work_groups
        .iter()
        .filter(|g| g.period != UNKNOWN_PERIOD)
        .collect();
    let dated_cost: Vec<&AggregatedCostData> = cost_groups
        .iter()
        .filter(|g| g.period != UNKNOWN_PERIOD)
        .collect();

    let hours_series: Vec<f64> = dated_work.iter().map(|g| g.total_hours).collect();
    let cost_series: Vec<f64> = dated_cost.iter().map(|g| g.total_cost as f64).collect();
    let revenue_series: Vec<f64> = dated_cost.iter().map(|g| g.revenue as f64).collect();
    let profit_series: Vec<f64> = dated_cost.iter().map(|g| g.profit as f64).collect();

    let trends = TrendSummary {
        hours: analyze_trend_with(&hours_series, thresholds),
        cost: analyze_trend_with(&cost_series, thresholds),
        revenue: analyze_trend_with(&revenue_series, thresholds),
        profit: analyze_trend_with(&profit_series, thresholds),
    };

    let statistics = StatisticsSummary {
        hours: series_statistics(&hours_series, thresholds),
        cost: series_statistics(&cost_series, thresholds),
        revenue: series_statistics(&revenue_series, thresholds),
    };

    let comparison = if options.compare_with_previous {
        previous_year_comparison(data, options, &work_groups, &cost_groups)
    } else {
        None
    };

    AnalysisReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        granularity,
        filters: options.filters.clone(),
        record_counts: RecordCounts {
            work: work.len(),
            cost: cost.len(),
            sales: sales.len(),
        },
        efficiency: calculate_efficiency(&work, &sales),
        crop_sales: aggregate_crop_sales(&sales, granularity),
        channels: analyze_channels(&sales),
        crop_composition: crop_composition(&sales),
        consistency: consistency_with_skipped(
            validate_data_consistency(&work, &cost, &sales),
            &data.skipped,
        ),
        skipped_records: data.skipped,
        available: AvailableOptions {
            crops: available_crops(&data.work, &data.cost, &data.sales),
            work_types: available_work_types(&data.work),
            cost_categories: available_cost_categories(&data.cost),
            channels: available_channels(&data.sales),
        },
        work: work_groups,
        cost: cost_groups,
        trends,
        statistics,
        comparison,
    }
}

/// 讀取時略過的記錄也列為一致性問題，讓報告本身看得到被丟棄的資料
fn consistency_with_skipped(
    mut report: ConsistencyReport,
    skipped: &RecordCounts,
) -> ConsistencyReport {
    for (dataset, count) in [
        ("work", skipped.work),
        ("cost", skipped.cost),
        ("sales", skipped.sales),
    ] {
        if count > 0 {
            report.issues.push(DataIssue::SkippedRecords {
                dataset: dataset.to_string(),
                count,
            });
        }
    }
    report.is_valid = report.issues.is_empty();
    report
}

fn series_statistics(series: &[f64], thresholds: &AnalysisThresholds) -> SeriesStatistics {
    SeriesStatistics {
        summary: calculate_statistics(series),
        outliers: detect_outliers_with(series, thresholds),
    }
}

fn previous_year_comparison(
    data: &RecordSet,
    options: &ReportOptions,
    work_groups: &[AggregatedWorkData],
    cost_groups: &[AggregatedCostData],
) -> Option<PeriodComparison> {
    if options.filters.start_date.is_none() || options.filters.end_date.is_none() {
        tracing::warn!("Previous-period comparison needs both start and end dates, skipping");
        return None;
    }

    let previous_filters = options.filters.previous_year();
    let previous_work = filter_work_records(&data.work, &previous_filters);
    let previous_cost = filter_cost_records(&data.cost, &previous_filters);
    let previous_sales = filter_sales_records(&data.sales, &previous_filters);

    let previous_work_groups =
        aggregate_work_with_sales(&previous_work, &previous_sales, options.granularity);
    let previous_cost_groups =
        aggregate_cost_data(&previous_cost, &previous_sales, options.granularity);

    Some(PeriodComparison {
        work: compare_with_previous_with(work_groups, &previous_work_groups, &options.thresholds),
        cost: compare_with_previous_with(cost_groups, &previous_cost_groups, &options.thresholds),
    })
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| FarmError::IoError(e.into_error()))
}

/// 作業彙總 CSV：固定欄位後接各作業種類的時數
pub fn work_summary_csv(groups: &[AggregatedWorkData]) -> Result<Vec<u8>> {
    let work_types: BTreeSet<&str> = groups
        .iter()
        .flat_map(|g| g.work_breakdown.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec![
        "period",
        "totalHours",
        "recordCount",
        "efficiencyScore",
        "revenuePerHour",
    ];
    header.extend(work_types.iter().copied());
    writer.write_record(&header)?;

    for group in groups {
        let mut row = vec![
            group.period.clone(),
            group.total_hours.to_string(),
            group.record_count.to_string(),
            group.efficiency.efficiency_score.to_string(),
            group.efficiency.revenue_per_hour.to_string(),
        ];
        row.extend(work_types.iter().map(|work_type| {
            group
                .work_breakdown
                .get(*work_type)
                .copied()
                .unwrap_or(0.0)
                .to_string()
        }));
        writer.write_record(&row)?;
    }

    finish_csv(writer)
}

/// 成本彙總 CSV：固定欄位後接各成本類別的金額
pub fn cost_summary_csv(groups: &[AggregatedCostData]) -> Result<Vec<u8>> {
    let categories: BTreeSet<&str> = groups
        .iter()
        .flat_map(|g| g.cost_breakdown.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec![
        "period",
        "totalCost",
        "revenue",
        "profit",
        "profitMargin",
        "recordCount",
    ];
    header.extend(categories.iter().copied());
    writer.write_record(&header)?;

    for group in groups {
        let mut row = vec![
            group.period.clone(),
            group.total_cost.to_string(),
            group.revenue.to_string(),
            group.profit.to_string(),
            group.profit_margin.to_string(),
            group.record_count.to_string(),
        ];
        row.extend(categories.iter().map(|category| {
            group
                .cost_breakdown
                .get(*category)
                .copied()
                .unwrap_or(0)
                .to_string()
        }));
        writer.write_record(&row)?;
    }

    finish_csv(writer)
}
