use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct AnalysisEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> AnalysisEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("🚀 Starting farm analysis...");

        // Extract
        tracing::info!("📥 Loading records...");
        let records = self.pipeline.extract().await?;
        tracing::info!(
            "Loaded {} records ({} work, {} cost, {} sales)",
            records.total_records(),
            records.work.len(),
            records.cost.len(),
            records.sales.len()
        );

        // Transform
        tracing::info!("🔄 Analysing records...");
        let report = self.pipeline.transform(records).await?;
        tracing::info!(
            "Built report with {} work periods and {} cost periods",
            report.work.len(),
            report.cost.len()
        );
        if !report.consistency.is_valid {
            tracing::warn!(
                "⚠️ Report contains {} data consistency issue(s)",
                report.consistency.issues.len()
            );
        }

        // Load
        tracing::info!("💾 Writing report...");
        let output_path = self.pipeline.load(report).await?;
        tracing::info!(
            "Output saved to: {} ({} ms)",
            output_path,
            started.elapsed().as_millis()
        );

        Ok(output_path)
    }
}
