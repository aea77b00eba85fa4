use farm_analytics::{
    AnalysisEngine, AnalysisPipeline, AnalysisReport, CliConfig, DataIssue, Granularity,
    LocalStorage, OutputFormat, TrendDirection,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_fixtures(dir: &Path) -> anyhow::Result<()> {
    let mut work = Vec::new();
    let mut cost = String::from("id,date,category,amount,description,crop\n");
    let mut sales = String::from("id,date,crop,quantity,unitPrice,total,channel\n");

    for i in 0..12u64 {
        let date = format!("2024-{:02}-05", i + 1);
        work.push(serde_json::json!({
            "id": i,
            "date": date,
            "workType": if i % 2 == 0 { "weeding" } else { "harvest" },
            "duration": 120 + 30 * i,
            "crop": "grape",
            "laborCost": 2000
        }));
        cost.push_str(&format!("{},{},fertilizer,{},compost,grape\n", i, date, 3000 + 100 * i));
        let quantity = 20 + 5 * i;
        sales.push_str(&format!(
            "{},{},grape,{},300,{},wholesale_market\n",
            i,
            date,
            quantity,
            quantity * 300
        ));
    }

    fs::write(dir.join("work.json"), serde_json::to_vec_pretty(&work)?)?;
    fs::write(dir.join("cost.csv"), cost)?;
    fs::write(dir.join("sales.csv"), sales)?;
    Ok(())
}

fn config(data_dir: &Path, output_dir: &Path) -> CliConfig {
    CliConfig {
        data_dir: data_dir.to_string_lossy().to_string(),
        work_file: Some("work.json".to_string()),
        cost_file: Some("cost.csv".to_string()),
        sales_file: Some("sales.csv".to_string()),
        output_path: output_dir.to_string_lossy().to_string(),
        period: Granularity::Monthly,
        start_date: None,
        end_date: None,
        crops: vec![],
        work_types: vec![],
        cost_categories: vec![],
        channels: vec![],
        compare_previous: false,
        formats: vec![OutputFormat::Json, OutputFormat::Csv],
        zip: false,
        strict: false,
        verbose: false,
        log_json: false,
    }
}

async fn run(config: CliConfig) -> anyhow::Result<String> {
    let repository = config.record_repository();
    let storage = LocalStorage::new(config.output_path.clone());
    let engine = AnalysisEngine::new(AnalysisPipeline::new(repository, storage, config));
    Ok(engine.run().await?)
}

#[tokio::test]
async fn test_end_to_end_report_files() -> anyhow::Result<()> {
    let data_dir = TempDir::new()?;
    let output_dir = TempDir::new()?;
    write_fixtures(data_dir.path())?;

    let output = run(config(data_dir.path(), output_dir.path())).await?;
    assert_eq!(output, output_dir.path().to_string_lossy());

    let report: AnalysisReport =
        serde_json::from_slice(&fs::read(output_dir.path().join("report.json"))?)?;

    assert_eq!(report.record_counts.work, 12);
    assert_eq!(report.work.len(), 12);
    assert_eq!(report.work[0].period, "2024-01");
    assert_eq!(report.work[0].total_hours, 2.0);
    assert_eq!(report.cost[0].revenue, 6000);
    assert_eq!(report.cost[0].total_cost, 3000);
    assert_eq!(report.cost[0].profit, 3000);
    assert_eq!(report.trends.hours.direction, TrendDirection::Increasing);
    assert!(!report.trends.hours.insufficient_data);
    assert!(report.consistency.is_valid);
    assert_eq!(report.channels.len(), 1);
    assert_eq!(report.channels[0].percentage, 100.0);

    let work_csv = fs::read_to_string(output_dir.path().join("work_summary.csv"))?;
    assert_eq!(work_csv.lines().count(), 13);
    assert!(work_csv.starts_with("period,totalHours,recordCount,efficiencyScore,revenuePerHour,harvest,weeding"));
    assert!(output_dir.path().join("cost_summary.csv").exists());

    Ok(())
}

#[tokio::test]
async fn test_end_to_end_zip_with_filters() -> anyhow::Result<()> {
    let data_dir = TempDir::new()?;
    let output_dir = TempDir::new()?;
    write_fixtures(data_dir.path())?;

    let mut config = config(data_dir.path(), output_dir.path());
    config.zip = true;
    config.period = Granularity::Quarterly;
    config.start_date = Some("2024-04-01".to_string());
    config.end_date = Some("2024-09-30".to_string());
    config.work_types = vec!["harvest".to_string()];

    let output = run(config).await?;
    assert!(output.ends_with("farm_report.zip"));

    let zip_data = fs::read(output_dir.path().join("farm_report.zip"))?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data))?;
    assert_eq!(archive.len(), 3);

    let report: AnalysisReport = serde_json::from_reader(archive.by_name("report.json")?)?;
    let periods: Vec<&str> = report.work.iter().map(|g| g.period.as_str()).collect();
    assert_eq!(periods, vec!["2024-Q2", "2024-Q3"]);
    // 4、6、8 月為 harvest
    assert_eq!(report.record_counts.work, 3);
    assert!(report.work.iter().all(|g| g.work_breakdown.len() == 1));
    assert!(report.trends.cost.insufficient_data);
    assert_eq!(report.available.work_types, vec!["harvest", "weeding"]);

    Ok(())
}

#[tokio::test]
async fn test_strict_mode_rejects_bad_records() -> anyhow::Result<()> {
    let data_dir = TempDir::new()?;
    let output_dir = TempDir::new()?;
    write_fixtures(data_dir.path())?;
    fs::write(
        data_dir.path().join("work.json"),
        r#"[{"id": 1, "date": "someday", "workType": "weeding", "duration": 60, "crop": "grape"}]"#,
    )?;

    let mut strict = config(data_dir.path(), output_dir.path());
    strict.strict = true;
    assert!(run(strict).await.is_err());

    // 非 strict 模式會略過無效記錄並繼續
    let lenient = config(data_dir.path(), output_dir.path());
    run(lenient).await?;
    let report: AnalysisReport =
        serde_json::from_slice(&fs::read(output_dir.path().join("report.json"))?)?;
    assert_eq!(report.record_counts.work, 0);
    assert_eq!(report.skipped_records.work, 1);
    assert!(!report.consistency.is_valid);
    assert!(report.consistency.issues.contains(&DataIssue::SkippedRecords {
        dataset: "work".to_string(),
        count: 1,
    }));

    Ok(())
}

#[tokio::test]
async fn test_missing_record_file_fails() -> anyhow::Result<()> {
    let data_dir = TempDir::new()?;
    let output_dir = TempDir::new()?;

    let result = run(config(data_dir.path(), output_dir.path())).await;
    assert!(result.is_err());
    assert!(!output_dir.path().join("report.json").exists());

    Ok(())
}
