use crate::domain::model::{ConsistencyReport, CostRecord, DataIssue, SalesRecord, WorkRecord};
use std::collections::BTreeSet;

/// `total` 與 `quantity * unit_price` 允許的誤差
pub const TOTAL_TOLERANCE: f64 = 0.01;

/// 檢查三種記錄之間的一致性。結果僅供警告，不會阻止後續計算
pub fn validate_data_consistency(
    work: &[WorkRecord],
    cost: &[CostRecord],
    sales: &[SalesRecord],
) -> ConsistencyReport {
    let mut issues = Vec::new();

    let work_range = date_range(work.iter().map(|r| r.date.as_str()));
    let cost_range = date_range(cost.iter().map(|r| r.date.as_str()));
    let sales_range = date_range(sales.iter().map(|r| r.date.as_str()));

    if !ranges_overlap(work_range, cost_range) {
        issues.push(DataIssue::NoPeriodOverlap {
            left: "work".to_string(),
            right: "cost".to_string(),
        });
    }
    if !ranges_overlap(work_range, sales_range) {
        issues.push(DataIssue::NoPeriodOverlap {
            left: "work".to_string(),
            right: "sales".to_string(),
        });
    }

    for (dataset, len) in [("work", work.len()), ("cost", cost.len()), ("sales", sales.len())] {
        if len == 0 {
            issues.push(DataIssue::EmptyDataset {
                dataset: dataset.to_string(),
            });
        }
    }

    let work_crops: BTreeSet<&str> = work.iter().map(|r| r.crop.as_str()).collect();
    let missing: Vec<String> = sales
        .iter()
        .map(|r| r.crop.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|crop| !work_crops.contains(crop))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        issues.push(DataIssue::CropsWithoutWork { crops: missing });
    }

    for record in work {
        push_if_negative(&mut issues, "work", record.id, "durationMinutes", record.duration_minutes);
        if let Some(labor_cost) = record.labor_cost {
            push_if_negative(&mut issues, "work", record.id, "laborCost", labor_cost);
        }
    }
    for record in cost {
        push_if_negative(&mut issues, "cost", record.id, "amount", record.amount);
    }
    for record in sales {
        issues.extend(check_sales_record(record));
    }

    for issue in &issues {
        tracing::warn!("⚠️ Data consistency: {}", issue);
    }

    ConsistencyReport {
        is_valid: issues.is_empty(),
        issues,
    }
}

/// 單筆銷售記錄的檢查：合計金額與負值
pub fn check_sales_record(record: &SalesRecord) -> Vec<DataIssue> {
    let mut issues = Vec::new();

    let expected = record.quantity * record.unit_price;
    if (record.total - expected).abs() > TOTAL_TOLERANCE {
        issues.push(DataIssue::TotalMismatch {
            id: record.id,
            expected,
            actual: record.total,
        });
    }

    push_if_negative(&mut issues, "sales", record.id, "quantity", record.quantity);
    push_if_negative(&mut issues, "sales", record.id, "unitPrice", record.unit_price);
    issues
}

fn push_if_negative(issues: &mut Vec<DataIssue>, dataset: &str, id: u64, field: &str, value: f64) {
    if value < 0.0 {
        issues.push(DataIssue::NegativeValue {
            dataset: dataset.to_string(),
            id,
            field: field.to_string(),
            value,
        });
    }
}

fn date_range<'a>(dates: impl Iterator<Item = &'a str>) -> Option<(&'a str, &'a str)> {
    dates.fold(None, |range, date| match range {
        None => Some((date, date)),
        Some((start, end)) => Some((start.min(date), end.max(date))),
    })
}

fn ranges_overlap(a: Option<(&str, &str)>, b: Option<(&str, &str)>) -> bool {
    match (a, b) {
        (Some((a_start, a_end)), Some((b_start, b_end))) => a_start <= b_end && b_start <= a_end,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(date: &str, crop: &str) -> WorkRecord {
        WorkRecord {
            id: 1,
            date: date.to_string(),
            work_type: "harvest".to_string(),
            duration_minutes: 60.0,
            crop: crop.to_string(),
            labor_cost: None,
            notes: None,
        }
    }

    fn cost(date: &str, amount: f64) -> CostRecord {
        CostRecord {
            id: 2,
            date: date.to_string(),
            category: "fertilizer".to_string(),
            subcategory: None,
            amount,
            description: "compost".to_string(),
            crop: None,
            supplier: None,
        }
    }

    fn sale(id: u64, date: &str, crop: &str, total: f64) -> SalesRecord {
        SalesRecord {
            id,
            date: date.to_string(),
            crop: crop.to_string(),
            quantity: 10.0,
            unit_price: 100.0,
            total,
            channel: "ja".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_consistent_data_is_valid() {
        let report = validate_data_consistency(
            &[work("2024-10-01", "grape"), work("2024-11-30", "grape")],
            &[cost("2024-10-20", 5000.0)],
            &[sale(1, "2024-11-01", "grape", 1000.0)],
        );
        assert!(report.is_valid, "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn test_detects_issues_without_failing() {
        let report = validate_data_consistency(
            &[work("2024-01-01", "grape")],
            &[cost("2024-06-01", -50.0)],
            &[sale(9, "2024-01-01", "potato", 999.0)],
        );
        assert!(!report.is_valid);
        assert!(report.issues.contains(&DataIssue::NoPeriodOverlap {
            left: "work".to_string(),
            right: "cost".to_string(),
        }));
        assert!(report.issues.contains(&DataIssue::CropsWithoutWork {
            crops: vec!["potato".to_string()],
        }));
        assert!(report.issues.contains(&DataIssue::TotalMismatch {
            id: 9,
            expected: 1000.0,
            actual: 999.0,
        }));
        assert!(report.issues.iter().any(|issue| matches!(
            issue,
            DataIssue::NegativeValue { dataset, .. } if dataset == "cost"
        )));
    }

    #[test]
    fn test_empty_datasets_are_reported() {
        let report = validate_data_consistency(&[], &[], &[]);
        let empty: Vec<&DataIssue> = report
            .issues
            .iter()
            .filter(|issue| matches!(issue, DataIssue::EmptyDataset { .. }))
            .collect();
        assert_eq!(empty.len(), 3);
    }

    #[test]
    fn test_total_within_tolerance() {
        assert!(check_sales_record(&sale(1, "2024-01-01", "grape", 1000.005)).is_empty());
    }
}
