use crate::core::{round2, round_whole};
use crate::domain::model::{EfficiencyMetrics, SalesRecord, WorkRecord};

/// 時間分數：每單位出貨耗時越少越高
const TIME_SCORE_WEIGHT: f64 = 20.0;
/// 成本分數：人事費率越低越高
const COST_SCORE_WEIGHT: f64 = 2.0;
/// 每小時營收達到此值即為滿分（日圓/小時）
const REVENUE_PER_HOUR_TARGET: f64 = 1500.0;
const PRODUCTIVITY_SCORE_WEIGHT: f64 = 10.0;

/// 由作業記錄與（選填的）銷售記錄計算效率指標
///
/// 任一比率的分母為 0 時該比率為 0；沒有任何可計算的分項時，
/// 綜合分數為 [`EfficiencyMetrics::NEUTRAL_SCORE`]。
pub fn calculate_efficiency(work: &[WorkRecord], sales: &[SalesRecord]) -> EfficiencyMetrics {
    if work.is_empty() {
        return EfficiencyMetrics::neutral();
    }

    let total_hours: f64 = work.iter().map(|r| r.duration_minutes / 60.0).sum();
    let total_labor_cost: f64 = work.iter().filter_map(|r| r.labor_cost).sum();
    let revenue: f64 = sales.iter().map(|r| r.total).sum();
    let output: f64 = sales.iter().map(|r| r.quantity).sum();

    let time_per_output = ratio(total_hours, output);
    let labor_cost_ratio = ratio(total_labor_cost, revenue) * 100.0;
    let revenue_per_hour = ratio(revenue, total_hours);
    let work_productivity = ratio(output, total_hours);

    let mut scores = Vec::with_capacity(4);
    if output != 0.0 {
        scores.push((100.0 - time_per_output * TIME_SCORE_WEIGHT).max(0.0));
    }
    if revenue != 0.0 {
        scores.push((100.0 - labor_cost_ratio * COST_SCORE_WEIGHT).max(0.0));
    }
    if total_hours != 0.0 {
        scores.push((revenue_per_hour / REVENUE_PER_HOUR_TARGET * 100.0).min(100.0));
        scores.push((work_productivity * PRODUCTIVITY_SCORE_WEIGHT).min(100.0));
    }

    let efficiency_score = if scores.is_empty() {
        EfficiencyMetrics::NEUTRAL_SCORE
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    tracing::trace!(
        total_hours,
        revenue,
        output,
        components = scores.len(),
        "efficiency computed"
    );

    EfficiencyMetrics {
        time_per_output: round2(time_per_output),
        labor_cost_ratio: round2(labor_cost_ratio),
        revenue_per_hour: round_whole(revenue_per_hour),
        work_productivity: round2(work_productivity),
        efficiency_score: round_whole(efficiency_score),
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
