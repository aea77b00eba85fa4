pub mod aggregate;
pub mod consistency;
pub mod efficiency;
pub mod engine;
pub mod filter;
pub mod period;
pub mod pipeline;
pub mod sales;
pub mod stats;
pub mod trend;

pub use crate::domain::model::{AnalysisReport, RecordSet};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RecordRepository, Storage};
pub use crate::utils::error::Result;

// 只在輸出時四捨五入一次，避免累積誤差

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub(crate) fn round_whole(value: f64) -> f64 {
    value.round()
}

/// 金額取整數日圓
pub(crate) fn round_yen(value: f64) -> i64 {
    value.round() as i64
}
