use crate::core::{round3, round_whole};
use crate::domain::model::{AnalysisThresholds, TrendAnalysis, TrendDirection};

/// 以預設門檻分析趨勢
pub fn analyze_trend(series: &[f64]) -> TrendAnalysis {
    analyze_trend_with(series, &AnalysisThresholds::default())
}

/// 最小平方法擬合 (x = 0..n-1)。
///
/// 資料點少於 `trend_min_data_points` 時回傳 stable / 0 / 0，並標記 `insufficient_data`。
/// 方向由首尾變化率決定，信心值為 R² × 100。
pub fn analyze_trend_with(series: &[f64], thresholds: &AnalysisThresholds) -> TrendAnalysis {
    let n = series.len();
    if n < thresholds.trend_min_data_points || n < 2 {
        return TrendAnalysis::insufficient(n);
    }

    let count = n as f64;
    let sum_x = count * (count - 1.0) / 2.0;
    let sum_x2 = count * (count - 1.0) * (2.0 * count - 1.0) / 6.0;
    let sum_y: f64 = series.iter().sum();
    let sum_xy: f64 = series
        .iter()
        .enumerate()
        .map(|(i, y)| i as f64 * y)
        .sum();

    let slope = (count * sum_xy - sum_x * sum_y) / (count * sum_x2 - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / count;

    let first = series[0];
    let last = series[n - 1];
    let change_rate = if first != 0.0 {
        (last - first) / first
    } else {
        0.0
    };

    let direction = if change_rate.abs() > thresholds.significant_change {
        if change_rate > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        }
    } else {
        TrendDirection::Stable
    };

    let mean = sum_y / count;
    let total_ss: f64 = series.iter().map(|y| (y - mean).powi(2)).sum();
    let residual_ss: f64 = series
        .iter()
        .enumerate()
        .map(|(i, y)| (y - (slope * i as f64 + intercept)).powi(2))
        .sum();
    let r_squared = if total_ss > 0.0 {
        1.0 - residual_ss / total_ss
    } else {
        0.0
    };
    let confidence = (r_squared * 100.0).clamp(0.0, 100.0);

    TrendAnalysis {
        direction,
        change_rate: round3(change_rate),
        confidence: round_whole(confidence),
        data_points: n,
        slope,
        intercept,
        insufficient_data: false,
    }
}
