use crate::core::period::parse_date;
use crate::domain::model::{CostRecord, SalesRecord, SalesRecordForm, WorkRecord};
use crate::utils::error::{FarmError, Result};
use chrono::NaiveDate;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(FarmError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(FarmError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(FarmError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

/// 日期必須嚴格為 `YYYY-MM-DD`。篩選區間以字串比較，含時間的值會讓當天的記錄被排除
pub fn validate_date(field_name: &str, value: &str) -> Result<()> {
    let is_plain_date =
        value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();
    if !is_plain_date {
        return Err(FarmError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected a date in YYYY-MM-DD format".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FarmError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(FarmError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

fn record_error(kind: &str, id: u64, reason: impl Into<String>) -> FarmError {
    FarmError::RecordValidationError {
        kind: kind.to_string(),
        id: id.to_string(),
        reason: reason.into(),
    }
}

fn check_record_date(kind: &str, id: u64, date: &str) -> Result<()> {
    if parse_date(date).is_none() {
        return Err(record_error(kind, id, format!("invalid date '{}'", date)));
    }
    Ok(())
}

fn check_text(kind: &str, id: u64, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(record_error(kind, id, format!("{} is empty", field)));
    }
    Ok(())
}

fn check_finite(kind: &str, id: u64, field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(record_error(kind, id, format!("{} is not a finite number", field)));
    }
    Ok(())
}

// 只檢查結構是否完整；負值等業務問題交給一致性檢查回報
impl Validate for WorkRecord {
    fn validate(&self) -> Result<()> {
        check_record_date("work", self.id, &self.date)?;
        check_text("work", self.id, "workType", &self.work_type)?;
        check_text("work", self.id, "crop", &self.crop)?;
        check_finite("work", self.id, "durationMinutes", self.duration_minutes)?;
        if let Some(labor_cost) = self.labor_cost {
            check_finite("work", self.id, "laborCost", labor_cost)?;
        }
        Ok(())
    }
}

impl Validate for CostRecord {
    fn validate(&self) -> Result<()> {
        check_record_date("cost", self.id, &self.date)?;
        check_text("cost", self.id, "category", &self.category)?;
        check_finite("cost", self.id, "amount", self.amount)?;
        Ok(())
    }
}

impl Validate for SalesRecord {
    fn validate(&self) -> Result<()> {
        check_record_date("sales", self.id, &self.date)?;
        check_text("sales", self.id, "crop", &self.crop)?;
        check_text("sales", self.id, "channel", &self.channel)?;
        check_finite("sales", self.id, "quantity", self.quantity)?;
        check_finite("sales", self.id, "unitPrice", self.unit_price)?;
        check_finite("sales", self.id, "total", self.total)?;
        Ok(())
    }
}

const MAX_SALES_QUANTITY: f64 = 100_000.0;
const MAX_UNIT_PRICE: f64 = 1_000_000.0;

impl SalesRecordForm {
    /// 將表單輸入轉為銷售記錄，合計金額由數量與單價計算
    pub fn into_sales_record(self, id: u64) -> Result<SalesRecord> {
        let field_error = |field: &str, value: &str, reason: &str| FarmError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        validate_date("date", &self.date)?;
        validate_non_empty_string("crop", &self.crop)?;
        validate_non_empty_string("unit", &self.unit)?;
        validate_non_empty_string("channel", &self.channel)?;

        let quantity: f64 = self
            .quantity
            .trim()
            .parse()
            .map_err(|_| field_error("quantity", &self.quantity, "Quantity must be a number"))?;
        if !(quantity > 0.0 && quantity <= MAX_SALES_QUANTITY) {
            return Err(field_error(
                "quantity",
                &self.quantity,
                "Quantity must be greater than 0 and at most 100,000",
            ));
        }

        let unit_price: f64 = self
            .unit_price
            .trim()
            .parse()
            .map_err(|_| field_error("unitPrice", &self.unit_price, "Unit price must be a number"))?;
        if !(unit_price > 0.0 && unit_price <= MAX_UNIT_PRICE) {
            return Err(field_error(
                "unitPrice",
                &self.unit_price,
                "Unit price must be greater than 0 and at most 1,000,000",
            ));
        }

        Ok(SalesRecord {
            id,
            date: self.date.trim().to_string(),
            crop: self.crop.trim().to_string(),
            quantity,
            unit_price,
            total: quantity * unit_price,
            channel: self.channel.trim().to_string(),
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}
