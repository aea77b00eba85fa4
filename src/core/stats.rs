use crate::core::round2;
use crate::domain::model::{AnalysisThresholds, StatisticalSummary};

/// 平均、中位數、極值與母體標準差；空輸入回傳全 0
pub fn calculate_statistics(values: &[f64]) -> StatisticalSummary {
    if values.is_empty() {
        return StatisticalSummary::default();
    }

    let count = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = values.iter().sum::<f64>() / count as f64;
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

    StatisticalSummary {
        mean: round2(mean),
        median: round2(median),
        min: sorted[0],
        max: sorted[count - 1],
        std_dev: round2(variance.sqrt()),
        count,
    }
}

pub fn detect_outliers(values: &[f64]) -> Vec<f64> {
    detect_outliers_with(values, &AnalysisThresholds::default())
}

/// 與平均值差距超過 `outlier_std_devs` 倍標準差的值，保留原順序
pub fn detect_outliers_with(values: &[f64], thresholds: &AnalysisThresholds) -> Vec<f64> {
    outlier_indices(values, thresholds)
        .into_iter()
        .map(|i| values[i])
        .collect()
}

pub fn outlier_indices(values: &[f64], thresholds: &AnalysisThresholds) -> Vec<usize> {
    if values.len() < thresholds.outlier_min_data_points {
        return Vec::new();
    }

    let stats = calculate_statistics(values);
    let limit = stats.std_dev * thresholds.outlier_std_devs;

    values
        .iter()
        .enumerate()
        .filter(|(_, v)| (*v - stats.mean).abs() > limit)
        .map(|(i, _)| i)
        .collect()
}
