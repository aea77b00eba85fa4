use crate::domain::model::{
    AnalysisFilters, AnalysisReport, AnalysisThresholds, CostRecord, Granularity, OutputFormat,
    RecordSet, SalesRecord, WorkRecord,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 記錄來源。分析核心不知道資料存放在哪裡
#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn load_work_records(&self) -> Result<Vec<WorkRecord>>;
    async fn load_cost_records(&self) -> Result<Vec<CostRecord>>;
    async fn load_sales_records(&self) -> Result<Vec<SalesRecord>>;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn granularity(&self) -> Granularity;
    fn filters(&self) -> AnalysisFilters;
    fn thresholds(&self) -> AnalysisThresholds;
    fn compare_with_previous(&self) -> bool;
    fn output_formats(&self) -> &[OutputFormat];
    fn compress_output(&self) -> bool;
    fn strict_validation(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RecordSet>;
    async fn transform(&self, data: RecordSet) -> Result<AnalysisReport>;
    async fn load(&self, report: AnalysisReport) -> Result<String>;
}
