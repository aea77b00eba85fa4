use crate::core::efficiency::calculate_efficiency;
use crate::core::period::period_key;
use crate::core::trend::analyze_trend_with;
use crate::core::{round2, round_yen};
use crate::domain::model::{
    AggregatedCostData, AggregatedWorkData, AnalysisThresholds, ComparisonResult, CostRecord,
    Granularity, SalesRecord, WorkRecord,
};
use std::collections::BTreeMap;

#[derive(Default)]
struct WorkGroup {
    total_hours: f64,
    breakdown: BTreeMap<String, f64>,
    records: Vec<WorkRecord>,
}

#[derive(Default)]
struct CostGroup {
    total_cost: f64,
    breakdown: BTreeMap<String, f64>,
    record_count: usize,
}

/// 依期間彙總作業時間（分鐘換算為小時），並附上作業種類別的細項
///
/// 輸出依期間鍵字串遞增排序；每組的效率指標只依該組作業記錄計算。
pub fn aggregate_work_data(work: &[WorkRecord], granularity: Granularity) -> Vec<AggregatedWorkData> {
    aggregate_work(work, None, granularity)
}

/// 同 [`aggregate_work_data`]，但每組的效率指標會併入同期間的銷售記錄
pub fn aggregate_work_with_sales(
    work: &[WorkRecord],
    sales: &[SalesRecord],
    granularity: Granularity,
) -> Vec<AggregatedWorkData> {
    let mut sales_by_period: BTreeMap<String, Vec<SalesRecord>> = BTreeMap::new();
    for record in sales {
        sales_by_period
            .entry(period_key(&record.date, granularity))
            .or_default()
            .push(record.clone());
    }
    aggregate_work(work, Some(&sales_by_period), granularity)
}

fn aggregate_work(
    work: &[WorkRecord],
    sales_by_period: Option<&BTreeMap<String, Vec<SalesRecord>>>,
    granularity: Granularity,
) -> Vec<AggregatedWorkData> {
    // BTreeMap 的迭代順序即為鍵值字串順序
    let mut groups: BTreeMap<String, WorkGroup> = BTreeMap::new();

    for record in work {
        let group = groups
            .entry(period_key(&record.date, granularity))
            .or_default();
        let hours = record.duration_minutes / 60.0;
        group.total_hours += hours;
        *group
            .breakdown
            .entry(record.work_type.clone())
            .or_insert(0.0) += hours;
        group.records.push(record.clone());
    }

    groups
        .into_iter()
        .map(|(period, group)| {
            let sales = sales_by_period
                .and_then(|by_period| by_period.get(&period))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            AggregatedWorkData {
                total_hours: round2(group.total_hours),
                work_breakdown: group
                    .breakdown
                    .into_iter()
                    .map(|(work_type, hours)| (work_type, round2(hours)))
                    .collect(),
                efficiency: calculate_efficiency(&group.records, sales),
                record_count: group.records.len(),
                period,
            }
        })
        .collect()
}

/// 依期間彙總成本，並與同期間的銷售額合併計算利潤
///
/// 期間以成本記錄為準：只有銷售沒有成本的期間不會出現在輸出中，
/// 有成本但沒有銷售的期間營收為 0。營收為 0 時利潤率定義為 0。
pub fn aggregate_cost_data(
    cost: &[CostRecord],
    sales: &[SalesRecord],
    granularity: Granularity,
) -> Vec<AggregatedCostData> {
    if cost.is_empty() {
        return Vec::new();
    }

    let mut groups: BTreeMap<String, CostGroup> = BTreeMap::new();
    for record in cost {
        let group = groups
            .entry(period_key(&record.date, granularity))
            .or_default();
        group.total_cost += record.amount;
        *group
            .breakdown
            .entry(record.category.clone())
            .or_insert(0.0) += record.amount;
        group.record_count += 1;
    }

    let mut revenue_by_period: BTreeMap<String, f64> = BTreeMap::new();
    for record in sales {
        *revenue_by_period
            .entry(period_key(&record.date, granularity))
            .or_insert(0.0) += record.total;
    }

    groups
        .into_iter()
        .map(|(period, group)| {
            let revenue = revenue_by_period.get(&period).copied().unwrap_or(0.0);
            let profit = revenue - group.total_cost;
            let profit_margin = if revenue > 0.0 {
                profit / revenue * 100.0
            } else {
                0.0
            };

            AggregatedCostData {
                total_cost: round_yen(group.total_cost),
                cost_breakdown: group
                    .breakdown
                    .into_iter()
                    .map(|(category, amount)| (category, round_yen(amount)))
                    .collect(),
                revenue: round_yen(revenue),
                profit: round_yen(profit),
                profit_margin: round2(profit_margin),
                record_count: group.record_count,
                period,
            }
        })
        .collect()
}

/// 可做前期比較的彙總結果
pub trait PeriodTotal {
    fn period(&self) -> &str;
    /// 比較時使用的主要數值
    fn headline_total(&self) -> f64;
}

impl PeriodTotal for AggregatedWorkData {
    fn period(&self) -> &str {
        &self.period
    }

    fn headline_total(&self) -> f64 {
        self.total_hours
    }
}

impl PeriodTotal for AggregatedCostData {
    fn period(&self) -> &str {
        &self.period
    }

    fn headline_total(&self) -> f64 {
        self.total_cost as f64
    }
}

/// 去掉期間鍵開頭的年份：`2024-11` -> `11`、`2024-Q3` -> `Q3`、`2024` -> ``
pub fn period_without_year(period: &str) -> &str {
    let bytes = period.as_bytes();
    if bytes.len() >= 4 && bytes[..4].iter().all(u8::is_ascii_digit) {
        period[4..].trim_start_matches('-')
    } else {
        period
    }
}

/// 前一年同期的期間鍵：`2024-11` -> `2023-11`、`2024` -> `2023`。鍵不以年份開頭時為 `None`
pub fn previous_year_period(period: &str) -> Option<String> {
    let year: i32 = period
        .get(..4)
        .filter(|y| y.bytes().all(|b| b.is_ascii_digit()))?
        .parse()
        .ok()?;
    let rest = period_without_year(period);
    if rest.is_empty() {
        Some(format!("{:04}", year - 1))
    } else {
        Some(format!("{:04}-{}", year - 1, rest))
    }
}

/// 將本期各期間與前一年的同一期間配對比較
pub fn compare_with_previous<T: PeriodTotal>(current: &[T], previous: &[T]) -> Vec<ComparisonResult> {
    compare_with_previous_with(current, previous, &AnalysisThresholds::default())
}

pub fn compare_with_previous_with<T: PeriodTotal>(
    current: &[T],
    previous: &[T],
    thresholds: &AnalysisThresholds,
) -> Vec<ComparisonResult> {
    current
        .iter()
        .filter_map(|cur| {
            let previous_key = previous_year_period(cur.period())?;
            let prev = previous.iter().find(|p| p.period() == previous_key)?;

            let current_value = cur.headline_total();
            let previous_value = prev.headline_total();
            let change = current_value - previous_value;
            let change_percent = if previous_value != 0.0 {
                change / previous_value * 100.0
            } else {
                0.0
            };

            Some(ComparisonResult {
                period: cur.period().to_string(),
                current: current_value,
                previous: previous_value,
                change: round2(change),
                change_percent: round2(change_percent),
                trend: analyze_trend_with(&[previous_value, current_value], thresholds),
            })
        })
        .collect()
}
