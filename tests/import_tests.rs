use httpmock::prelude::*;
use serde_json::json;
use stowage::core::ConfigProvider;
use stowage::domain::model::ImportReport;
use stowage::{HttpCargoClient, ImportJob, LocalStorage};
use tempfile::TempDir;

struct TestConfig(String);

impl ConfigProvider for TestConfig {
    fn api_base_url(&self) -> &str {
        &self.0
    }

    fn timeout_secs(&self) -> u64 {
        5
    }

    fn retry_attempts(&self) -> u32 {
        0
    }

    fn retry_delay_ms(&self) -> u64 {
        0
    }
}

const MANIFEST: &str = "\
name,size,priority,expiry_days,hazardous,temperature_sensitive
Water Bags,1.0,50,60,no,no
Broken Row,abc,50,,,
Reactive Reagent,1.0,50,30,yes,yes
";

#[tokio::test]
async fn test_import_remaps_server_failures_to_manifest_rows() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().to_str().unwrap().to_string();
    std::fs::write(temp_dir.path().join("manifest.csv"), MANIFEST).unwrap();

    let server = MockServer::start();
    let import_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/import/items")
            .body_contains("Water Bags")
            .body_contains("Reactive Reagent");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "success_count": 1,
                "imported": ["ITEM-0001"],
                "failed_items": [{
                    "index": 1,
                    "name": "Reactive Reagent",
                    "error": "No feasible placement for 'Reactive Reagent'"
                }]
            }));
    });

    let client = HttpCargoClient::new(TestConfig(server.url("/api"))).unwrap();
    let job = ImportJob::new(LocalStorage::new(base.clone()), &client, "manifest.csv")
        .with_report_path("reports/import.json");
    let report = job.run().await.unwrap();

    import_mock.assert();
    assert_eq!(report.success_count, 1);

    let failed: Vec<(usize, &str)> = report
        .failed_items
        .iter()
        .map(|f| (f.index, f.name.as_str()))
        .collect();
    assert_eq!(failed, vec![(1, "Broken Row"), (2, "Reactive Reagent")]);
    assert_eq!(report.failed_items[0].error, "invalid size 'abc'");

    // 報告檔寫入 storage
    let saved = std::fs::read(temp_dir.path().join("reports/import.json")).unwrap();
    let saved: ImportReport = serde_json::from_slice(&saved).unwrap();
    assert_eq!(saved, report);
}

#[tokio::test]
async fn test_import_skips_api_when_no_row_parses() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().to_str().unwrap().to_string();
    std::fs::write(
        temp_dir.path().join("manifest.csv"),
        "name,size,priority\n,1.0,50\nCrate,big,50\n",
    )
    .unwrap();

    let server = MockServer::start();
    let import_mock = server.mock(|when, then| {
        when.method(POST).path("/api/import/items");
        then.status(200).json_body(json!({ "success_count": 0, "imported": [], "failed_items": [] }));
    });

    let client = HttpCargoClient::new(TestConfig(server.url("/api"))).unwrap();
    let report = ImportJob::new(LocalStorage::new(base), &client, "manifest.csv")
        .run()
        .await
        .unwrap();

    import_mock.assert_hits(0);
    assert_eq!(report.success_count, 0);
    assert_eq!(report.failed_items.len(), 2);
    assert_eq!(report.failed_items[0].error, "name is empty");
}

#[tokio::test]
async fn test_import_rejects_manifest_without_required_columns() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().to_str().unwrap().to_string();
    std::fs::write(temp_dir.path().join("manifest.csv"), "name,weight\nWater,10\n").unwrap();

    let server = MockServer::start();
    let client = HttpCargoClient::new(TestConfig(server.url("/api"))).unwrap();
    let err = ImportJob::new(LocalStorage::new(base), &client, "manifest.csv")
        .run()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("missing required column(s): size, priority"));
}
