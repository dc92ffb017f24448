use reqwest::multipart::{Form, Part};
use santander::application::prediction::PredictionService;
use santander::domain::ml::feature_registry::{FEATURE_COUNT, SCHEMA_ERROR_MESSAGE, expected_columns};
use santander::domain::ml::{
    ClassifierKind, FittedPipeline, ForestParams, PipelineConfig, TransactionClassifier,
};
use santander::domain::ops::ProbeResult;
use santander::domain::ports::HealthProbe;
use santander::domain::transactions::{PredictionMode, RawFeatures};
use santander::infrastructure::HttpHealthProbe;
use santander::infrastructure::observability::ServiceMetrics;
use santander::interfaces::api::{ServiceContext, build_router};
use std::net::SocketAddr;
use std::sync::Arc;

fn sample_bytes() -> Vec<u8> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample_file.csv");
    std::fs::read(path).expect("sample file")
}

fn small_forest() -> FittedPipeline {
    let rows: Vec<RawFeatures> = (0..30)
        .map(|i| {
            (0..FEATURE_COUNT)
                .map(|j| Some(((i * 7 + j * 3) % 23) as f64 + if i % 3 == 0 { 10.0 } else { 0.0 }))
                .collect()
        })
        .collect();
    let labels: Vec<u8> = (0..30).map(|i| u8::from(i % 3 == 0)).collect();
    let config = PipelineConfig {
        classifier: ClassifierKind::RandomForest,
        forest: ForestParams {
            n_trees: 3,
            max_depth: 3,
            min_samples_split: 2,
            seed: 1,
        },
        ..PipelineConfig::default()
    };
    FittedPipeline::fit(&rows, &labels, &config).expect("fit")
}

async fn spawn_server(mode: PredictionMode, max_upload_bytes: usize) -> SocketAddr {
    let classifier: Arc<dyn TransactionClassifier> = Arc::new(small_forest());
    let ctx = Arc::new(ServiceContext::new(
        PredictionService::new(classifier, mode),
        sample_bytes(),
        ServiceMetrics::new().expect("metrics"),
        max_upload_bytes,
    ));
    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn upload(addr: SocketAddr, bytes: Vec<u8>) -> reqwest::Response {
    let part = Part::bytes(bytes).file_name("upload.csv");
    reqwest::Client::new()
        .post(format!("http://{addr}/upload_file_predict"))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .expect("request")
}

fn parse_csv(body: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::Reader::from_reader(body.as_bytes());
    let headers = rdr.headers().unwrap().iter().map(str::to_string).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

#[tokio::test]
async fn test_ping() {
    let addr = spawn_server(PredictionMode::Probability, 1 << 20).await;
    let response = reqwest::get(format!("http://{addr}/ping")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!("pong!"));
}

#[tokio::test]
async fn test_root_url_is_healthy_for_the_health_poller() {
    let addr = spawn_server(PredictionMode::Probability, 1 << 20).await;
    let probe = HttpHealthProbe::new(std::time::Duration::from_secs(5));
    assert_eq!(probe.probe(&format!("http://{addr}/")).await, ProbeResult::Healthy);
}

#[tokio::test]
async fn test_download_sample_headers() {
    let addr = spawn_server(PredictionMode::Probability, 1 << 20).await;
    let response = reqwest::get(format!("http://{addr}/download_sample"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/csv");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment;filename=sample_file.csv"
    );
    assert_eq!(
        response.headers()["access-control-expose-headers"],
        "Content-Disposition"
    );
    assert_eq!(response.bytes().await.unwrap().to_vec(), sample_bytes());
}

#[tokio::test]
async fn test_sample_round_trip_predicts_every_row() {
    let addr = spawn_server(PredictionMode::Probability, 1 << 20).await;
    let sample = reqwest::get(format!("http://{addr}/download_sample"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap()
        .to_vec();

    let response = upload(addr, sample.clone()).await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment;filename=predictions.csv"
    );

    let body = response.text().await.unwrap();
    let (headers, rows) = parse_csv(&body);
    let (_, sample_rows) = parse_csv(&String::from_utf8(sample).unwrap());

    assert_eq!(headers, vec!["ID_code", "target"]);
    assert_eq!(rows.len(), sample_rows.len());
    for (row, input) in rows.iter().zip(&sample_rows) {
        assert_eq!(row.len(), 2);
        assert_eq!(row[0], input[0]);
        let p: f64 = row[1].parse().unwrap();
        assert!((0.0..=1.0).contains(&p));
        // three decimals exactly
        assert_eq!(row[1].split('.').nth(1).map(str::len), Some(3));
    }
}

#[tokio::test]
async fn test_label_mode_returns_zero_or_one() {
    let addr = spawn_server(PredictionMode::Label, 1 << 20).await;
    let body = upload(addr, sample_bytes()).await.text().await.unwrap();
    let (_, rows) = parse_csv(&body);
    assert!(rows.iter().all(|r| r[1] == "0" || r[1] == "1"));
}

#[tokio::test]
async fn test_missing_columns_are_rejected() {
    let addr = spawn_server(PredictionMode::Probability, 1 << 20).await;
    let mut columns = expected_columns();
    columns.retain(|c| *c != "var_57");
    let mut csv = columns.join(",");
    csv.push('\n');
    csv.push_str(&vec!["1"; columns.len()].join(","));
    csv.push('\n');

    let response = upload(addr, csv.into_bytes()).await;
    assert_eq!(response.status(), 422);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], SCHEMA_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_garbage_upload_is_rejected() {
    let addr = spawn_server(PredictionMode::Probability, 1 << 20).await;
    let response = upload(addr, vec![0xff, 0x00, 0xfe, 0x01]).await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn test_missing_file_field_is_rejected() {
    let addr = spawn_server(PredictionMode::Probability, 1 << 20).await;
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/upload_file_predict"))
        .multipart(Form::new().text("other", "value"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "No file uploaded");
}

#[tokio::test]
async fn test_metrics_count_requests() {
    let addr = spawn_server(PredictionMode::Probability, 1 << 20).await;
    upload(addr, sample_bytes()).await;
    let body = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("santander_rows_predicted_total 5"));
    assert!(body.contains("santander_imputed_cells_total 2"));
}
