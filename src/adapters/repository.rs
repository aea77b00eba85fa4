use crate::core::{RecordRepository, Storage};
use crate::domain::model::{CostRecord, SalesRecord, WorkRecord};
use crate::utils::error::{FarmError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// 從檔案讀取記錄。副檔名決定格式：`.json` 為陣列、`.csv` 為含標題列的表格
pub struct FileRecordRepository<S: Storage> {
    storage: S,
    work_file: Option<String>,
    cost_file: Option<String>,
    sales_file: Option<String>,
}

impl<S: Storage> FileRecordRepository<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            work_file: None,
            cost_file: None,
            sales_file: None,
        }
    }

    pub fn with_work_file(mut self, path: impl Into<String>) -> Self {
        self.work_file = Some(path.into());
        self
    }

    pub fn with_cost_file(mut self, path: impl Into<String>) -> Self {
        self.cost_file = Some(path.into());
        self
    }

    pub fn with_sales_file(mut self, path: impl Into<String>) -> Self {
        self.sales_file = Some(path.into());
        self
    }

    async fn load<T: DeserializeOwned>(&self, kind: &str, path: Option<&str>) -> Result<Vec<T>> {
        let Some(path) = path else {
            tracing::debug!("No {} file configured, using an empty dataset", kind);
            return Ok(Vec::new());
        };

        let data = self.storage.read_file(path).await?;
        let records: Vec<T> = parse_records(path, &data)?;
        tracing::info!("📄 Read {} {} records from {}", records.len(), kind, path);
        Ok(records)
    }
}

/// 依副檔名解析記錄
pub fn parse_records<T: DeserializeOwned>(path: &str, data: &[u8]) -> Result<Vec<T>> {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => Ok(serde_json::from_slice(data)?),
        Some("csv") => {
            let mut reader = csv::Reader::from_reader(data);
            let records = reader
                .deserialize()
                .collect::<std::result::Result<Vec<T>, csv::Error>>()?;
            Ok(records)
        }
        _ => Err(FarmError::UnsupportedFormatError {
            path: path.to_string(),
        }),
    }
}

#[async_trait::async_trait]
impl<S: Storage> RecordRepository for FileRecordRepository<S> {
    async fn load_work_records(&self) -> Result<Vec<WorkRecord>> {
        self.load("work", self.work_file.as_deref()).await
    }

    async fn load_cost_records(&self) -> Result<Vec<CostRecord>> {
        self.load("cost", self.cost_file.as_deref()).await
    }

    async fn load_sales_records(&self) -> Result<Vec<SalesRecord>> {
        self.load("sales", self.sales_file.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use std::fs;
    use tempfile::TempDir;

    fn repository(temp_dir: &TempDir) -> FileRecordRepository<LocalStorage> {
        FileRecordRepository::new(LocalStorage::new(
            temp_dir.path().to_string_lossy().to_string(),
        ))
    }

    #[tokio::test]
    async fn test_load_json_work_records() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("work.json"),
            r#"[{"id": 1, "date": "2024-11-01", "workType": "harvest", "duration": 120, "crop": "grape", "laborCost": 3000}]"#,
        )
        .unwrap();

        let repo = repository(&temp_dir).with_work_file("work.json");
        let records = repo.load_work_records().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duration_minutes, 120.0);
        assert_eq!(records[0].labor_cost, Some(3000.0));
    }

    #[tokio::test]
    async fn test_load_csv_records() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("cost.csv"),
            "id,date,category,amount,description,crop\n\
             1,2024-11-10,fertilizer,5000,compost,grape\n\
             2,2024-11-12,fuel,1200,diesel,\n",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("sales.csv"),
            "id,date,crop,quantity,unitPrice,total,buyer\n\
             1,2024-11-15,grape,50,300,15000,wholesale_market\n",
        )
        .unwrap();

        let repo = repository(&temp_dir)
            .with_cost_file("cost.csv")
            .with_sales_file("sales.csv");

        let cost = repo.load_cost_records().await.unwrap();
        assert_eq!(cost.len(), 2);
        assert_eq!(cost[0].crop.as_deref(), Some("grape"));
        assert_eq!(cost[1].crop, None);

        let sales = repo.load_sales_records().await.unwrap();
        assert_eq!(sales[0].channel, "wholesale_market");
        assert_eq!(sales[0].total, 15000.0);
    }

    #[tokio::test]
    async fn test_unconfigured_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repository(&temp_dir);
        assert!(repo.load_sales_records().await.unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let result: Result<Vec<WorkRecord>> = parse_records("work.xlsx", b"");
        assert!(matches!(
            result,
            Err(FarmError::UnsupportedFormatError { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let result: Result<Vec<WorkRecord>> = parse_records("work.json", b"{not json");
        assert!(matches!(result, Err(FarmError::SerializationError(_))));
    }
}
