use crate::core::period::parse_date;
use crate::domain::model::{AnalysisFilters, CostRecord, SalesRecord, WorkRecord};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// 可被 [`AnalysisFilters`] 篩選的記錄
pub trait Filterable {
    fn date(&self) -> &str;
    fn crop(&self) -> Option<&str>;
    /// 該記錄類型特有的維度（作業種類、成本類別、銷售通路）
    fn matches_kind(&self, filters: &AnalysisFilters) -> bool;
}

impl Filterable for WorkRecord {
    fn date(&self) -> &str {
        &self.date
    }

    fn crop(&self) -> Option<&str> {
        Some(self.crop.as_str())
    }

    fn matches_kind(&self, filters: &AnalysisFilters) -> bool {
        allows(&filters.work_types, Some(self.work_type.as_str()))
    }
}

impl Filterable for CostRecord {
    fn date(&self) -> &str {
        &self.date
    }

    fn crop(&self) -> Option<&str> {
        self.crop.as_deref()
    }

    fn matches_kind(&self, filters: &AnalysisFilters) -> bool {
        allows(&filters.cost_categories, Some(self.category.as_str()))
    }
}

impl Filterable for SalesRecord {
    fn date(&self) -> &str {
        &self.date
    }

    fn crop(&self) -> Option<&str> {
        Some(self.crop.as_str())
    }

    fn matches_kind(&self, filters: &AnalysisFilters) -> bool {
        allows(&filters.channels, Some(self.channel.as_str()))
    }
}

/// 空集合不做限制；缺少該欄位的記錄只有在集合為空時才通過
fn allows(set: &[String], value: Option<&str>) -> bool {
    if set.is_empty() {
        return true;
    }
    match value {
        Some(v) => set.iter().any(|s| s == v),
        None => false,
    }
}

impl AnalysisFilters {
    /// 日期以字串比較，前提是格式為 `YYYY-MM-DD`
    pub fn in_date_range(&self, date: &str) -> bool {
        if let Some(start) = &self.start_date {
            if date < start.as_str() {
                return false;
            }
        }
        if let Some(end) = &self.end_date {
            if date > end.as_str() {
                return false;
            }
        }
        true
    }

    pub fn matches<T: Filterable>(&self, record: &T) -> bool {
        self.in_date_range(record.date())
            && allows(&self.crops, record.crop())
            && record.matches_kind(self)
    }

    /// 前一年同期的篩選條件，用於前期比較
    pub fn previous_year(&self) -> Self {
        Self {
            start_date: self.start_date.as_deref().map(shift_back_one_year),
            end_date: self.end_date.as_deref().map(shift_back_one_year),
            ..self.clone()
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.crops.is_empty()
            && self.work_types.is_empty()
            && self.cost_categories.is_empty()
            && self.channels.is_empty()
    }
}

fn shift_back_one_year(date: &str) -> String {
    match parse_date(date) {
        Some(parsed) => {
            let year = parsed.year() - 1;
            let shifted = parsed
                .with_year(year)
                // 2/29 在非閏年不存在
                .or_else(|| NaiveDate::from_ymd_opt(year, parsed.month(), 28))
                .unwrap_or(parsed);
            shifted.format("%Y-%m-%d").to_string()
        }
        None => date.to_string(),
    }
}

pub fn filter_records<T: Filterable + Clone>(records: &[T], filters: &AnalysisFilters) -> Vec<T> {
    records
        .iter()
        .filter(|record| filters.matches(*record))
        .cloned()
        .collect()
}

pub fn filter_work_records(records: &[WorkRecord], filters: &AnalysisFilters) -> Vec<WorkRecord> {
    filter_records(records, filters)
}

pub fn filter_cost_records(records: &[CostRecord], filters: &AnalysisFilters) -> Vec<CostRecord> {
    filter_records(records, filters)
}

pub fn filter_sales_records(
    records: &[SalesRecord],
    filters: &AnalysisFilters,
) -> Vec<SalesRecord> {
    filter_records(records, filters)
}

pub fn available_crops(
    work: &[WorkRecord],
    cost: &[CostRecord],
    sales: &[SalesRecord],
) -> Vec<String> {
    let mut crops: BTreeSet<&str> = BTreeSet::new();
    crops.extend(work.iter().map(|r| r.crop.as_str()));
    crops.extend(cost.iter().filter_map(|r| r.crop.as_deref()));
    crops.extend(sales.iter().map(|r| r.crop.as_str()));
    crops.into_iter().map(str::to_string).collect()
}

pub fn available_work_types(work: &[WorkRecord]) -> Vec<String> {
    distinct_sorted(work.iter().map(|r| r.work_type.as_str()))
}

pub fn available_cost_categories(cost: &[CostRecord]) -> Vec<String> {
    distinct_sorted(cost.iter().map(|r| r.category.as_str()))
}

pub fn available_channels(sales: &[SalesRecord]) -> Vec<String> {
    distinct_sorted(sales.iter().map(|r| r.channel.as_str()))
}

fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
