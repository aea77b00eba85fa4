use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 作業記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRecord {
    pub id: u64,
    pub date: String,
    pub work_type: String,
    #[serde(alias = "duration")]
    pub duration_minutes: f64,
    pub crop: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labor_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// 成本記錄，作物為選填
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRecord {
    pub id: u64,
    pub date: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
}

/// 銷售記錄。`total` 應等於 `quantity * unit_price`（誤差 0.01 以內）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    pub id: u64,
    pub date: String,
    pub crop: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total: f64,
    #[serde(alias = "buyer")]
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// 表單輸入的銷售資料，數值欄位仍為字串
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecordForm {
    pub date: String,
    pub crop: String,
    pub quantity: String,
    pub unit: String,
    pub unit_price: String,
    pub channel: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    pub work: Vec<WorkRecord>,
    pub cost: Vec<CostRecord>,
    pub sales: Vec<SalesRecord>,
    /// 讀取時因驗證失敗而略過的筆數
    #[serde(default)]
    pub skipped: RecordCounts,
}

impl RecordSet {
    pub fn total_records(&self) -> usize {
        self.work.len() + self.cost.len() + self.sales.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
            Granularity::Quarterly => "quarterly",
            Granularity::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            "quarterly" => Ok(Granularity::Quarterly),
            "yearly" => Ok(Granularity::Yearly),
            other => Err(format!(
                "unknown period '{}', expected one of: weekly, monthly, quarterly, yearly",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

/// 效率指標
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyMetrics {
    pub time_per_output: f64,
    pub labor_cost_ratio: f64,
    pub revenue_per_hour: f64,
    pub work_productivity: f64,
    pub efficiency_score: f64,
}

impl EfficiencyMetrics {
    pub const NEUTRAL_SCORE: f64 = 50.0;

    /// 資料不足時的結果：比率全為 0，分數為中性值 50
    pub fn neutral() -> Self {
        Self {
            time_per_output: 0.0,
            labor_cost_ratio: 0.0,
            revenue_per_hour: 0.0,
            work_productivity: 0.0,
            efficiency_score: Self::NEUTRAL_SCORE,
        }
    }
}

impl Default for EfficiencyMetrics {
    fn default() -> Self {
        Self::neutral()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedWorkData {
    pub period: String,
    pub total_hours: f64,
    pub work_breakdown: BTreeMap<String, f64>,
    pub efficiency: EfficiencyMetrics,
    pub record_count: usize,
}

/// 金額欄位以整數日圓表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedCostData {
    pub period: String,
    pub total_cost: i64,
    pub cost_breakdown: BTreeMap<String, i64>,
    pub revenue: i64,
    pub profit: i64,
    pub profit_margin: f64,
    pub record_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    pub change_rate: f64,
    pub confidence: f64,
    pub data_points: usize,
    pub slope: f64,
    pub intercept: f64,
    /// 資料點不足，未做迴歸
    pub insufficient_data: bool,
}

impl TrendAnalysis {
    pub fn insufficient(data_points: usize) -> Self {
        Self {
            direction: TrendDirection::Stable,
            change_rate: 0.0,
            confidence: 0.0,
            data_points,
            slope: 0.0,
            intercept: 0.0,
            insufficient_data: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalSummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub period: String,
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_percent: f64,
    pub trend: TrendAnalysis,
}

/// 篩選條件。空集合代表不限制
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisFilters {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub crops: Vec<String>,
    pub work_types: Vec<String>,
    pub cost_categories: Vec<String>,
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisThresholds {
    pub trend_min_data_points: usize,
    pub significant_change: f64,
    pub outlier_std_devs: f64,
    pub outlier_min_data_points: usize,
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            trend_min_data_points: 10,
            significant_change: 0.15,
            outlier_std_devs: 2.0,
            outlier_min_data_points: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropSalesPoint {
    pub period: String,
    /// 作物別銷售額（日圓）
    pub crops: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAnalysis {
    pub channel: String,
    pub revenue: i64,
    pub volume: f64,
    pub average_price: i64,
    pub percentage: f64,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropShare {
    pub crop: String,
    pub revenue: i64,
    pub percentage: f64,
}

/// 資料一致性問題，只作為警告，不會中斷分析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DataIssue {
    NoPeriodOverlap { left: String, right: String },
    EmptyDataset { dataset: String },
    CropsWithoutWork { crops: Vec<String> },
    TotalMismatch { id: u64, expected: f64, actual: f64 },
    NegativeValue { dataset: String, id: u64, field: String, value: f64 },
    SkippedRecords { dataset: String, count: usize },
}

impl fmt::Display for DataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIssue::NoPeriodOverlap { left, right } => {
                write!(f, "{} and {} records cover non-overlapping periods", left, right)
            }
            DataIssue::EmptyDataset { dataset } => write!(f, "no {} records", dataset),
            DataIssue::CropsWithoutWork { crops } => {
                write!(f, "crops sold without work records: {}", crops.join(", "))
            }
            DataIssue::TotalMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "sales record {} total {} does not match quantity x unit price {}",
                id, actual, expected
            ),
            DataIssue::NegativeValue {
                dataset,
                id,
                field,
                value,
            } => write!(f, "{} record {} has negative {}: {}", dataset, id, field, value),
            DataIssue::SkippedRecords { dataset, count } => {
                write!(f, "{} invalid {} record(s) were skipped", count, dataset)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    pub is_valid: bool,
    pub issues: Vec<DataIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableOptions {
    pub crops: Vec<String>,
    pub work_types: Vec<String>,
    pub cost_categories: Vec<String>,
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub hours: TrendAnalysis,
    pub cost: TrendAnalysis,
    pub revenue: TrendAnalysis,
    pub profit: TrendAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStatistics {
    pub summary: StatisticalSummary,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub hours: SeriesStatistics,
    pub cost: SeriesStatistics,
    pub revenue: SeriesStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison {
    pub work: Vec<ComparisonResult>,
    pub cost: Vec<ComparisonResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounts {
    pub work: usize,
    pub cost: usize,
    pub sales: usize,
}

/// transform 階段的完整輸出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub generated_at: String,
    pub granularity: Granularity,
    pub filters: AnalysisFilters,
    pub record_counts: RecordCounts,
    #[serde(default)]
    pub skipped_records: RecordCounts,
    pub work: Vec<AggregatedWorkData>,
    pub cost: Vec<AggregatedCostData>,
    pub efficiency: EfficiencyMetrics,
    pub crop_sales: Vec<CropSalesPoint>,
    pub channels: Vec<ChannelAnalysis>,
    pub crop_composition: Vec<CropShare>,
    pub trends: TrendSummary,
    pub statistics: StatisticsSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<PeriodComparison>,
    pub consistency: ConsistencyReport,
    pub available: AvailableOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unsupported output format '{}', expected json or csv", other)),
        }
    }
}
