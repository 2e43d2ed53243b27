use redshift_core::reconcile;
use redshift_ingest::{load_catalog, read_rows};
use redshift_verify::{LightCurveRenderer, VerifierClient};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("fixtures")
        .join(name)
}

/// One-shot HTTP stub: answers a single request with `status` and `body`,
/// and hands back the request line and request body it received.
async fn serve_once(status: u16, body: String) -> (String, JoinHandle<(String, String)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = sock.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let content_length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map(|v| v.trim().parse::<usize>().unwrap())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let request_line = head.lines().next().unwrap_or_default().to_string();
        let request_body = String::from_utf8_lossy(&buf[header_end..]).to_string();

        let reason = if status == 200 { "OK" } else { "Internal Server Error" };
        let resp = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        sock.write_all(resp.as_bytes()).await.unwrap();
        let _ = sock.shutdown().await;

        (request_line, request_body)
    });

    (format!("http://{addr}"), handle)
}

/// End to end: reconcile the sample upload, send only the new candidates for verification.
#[tokio::test]
async fn test_batch_verify_sends_unmatched_in_order() {
    let cat = load_catalog(fixture("confirmed_sample.csv")).unwrap();
    let rows = read_rows(fixture("upload_sample.csv")).unwrap();
    let report = reconcile(&rows, &cat);
    assert_eq!(report.unmatched.len(), 2);

    let reply = json!({
        "success": true,
        "results": [
            {"Planet_name": "KOI-9999.01", "predicted_class": "CP", "confidence": 0.83,
             "all_probabilities": {"CP": 0.83, "FP": 0.17}},
            {"Planet_name": "Hot-Jupiter-X", "predicted_class": "FP", "confidence": 0.71,
             "all_probabilities": {"CP": 0.29, "FP": 0.71}}
        ]
    });
    let (base, server) = serve_once(200, reply.to_string()).await;

    let client = VerifierClient::new(base, Duration::from_secs(5)).unwrap();
    let verdicts = client.batch_verify(&report.unmatched).await.unwrap();

    let (request_line, request_body) = server.await.unwrap();
    assert!(request_line.starts_with("post /api/batch-verify"));

    let sent: Value = serde_json::from_str(&request_body).unwrap();
    let planets = sent["planets"].as_array().unwrap();
    assert_eq!(planets.len(), 2);
    assert_eq!(planets[0]["Planet_name"], "KOI-9999.01");
    assert_eq!(planets[0]["orbital_period"], 14.2);
    assert_eq!(planets[1]["Planet_name"], "Hot-Jupiter-X");

    assert!(verdicts[0].is_planet(client.planet_labels()));
    assert!(!verdicts[1].is_planet(client.planet_labels()));
    assert_eq!(verdicts[1].is_planet_probability(client.planet_labels()), Some(0.29));
}

#[tokio::test]
async fn test_verify_server_error_is_reported() {
    let (base, server) = serve_once(500, json!({"error": "boom"}).to_string()).await;
    let client = VerifierClient::new(base, Duration::from_secs(5)).unwrap();

    let cat = load_catalog(fixture("confirmed_sample.csv")).unwrap();
    let record = cat.find_by_name("Kepler-10 b").unwrap();
    let err = client.verify(record).await.unwrap_err();
    assert!(err.to_string().contains("500"), "unexpected error: {err}");

    let (request_line, _) = server.await.unwrap();
    assert!(request_line.starts_with("post /api/verify"));
}

#[tokio::test]
async fn test_empty_batch_makes_no_request() {
    // nothing listens here; an actual request would fail
    let client = VerifierClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
    assert!(client.batch_verify(&[]).await.unwrap().is_empty());
}

#[cfg(unix)]
fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("render.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    path
}

#[cfg(unix)]
#[tokio::test]
async fn test_render_returns_image_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    // args: dataset, planet, output
    let script = write_script(dir.path(), r#"printf 'PNG:%s' "$2" > "$3"; echo "plotted $2""#);
    let out_dir = dir.path().join("temp");
    let renderer = LightCurveRenderer::new("sh", script, &out_dir);

    let bytes = renderer
        .render(&fixture("confirmed_sample.csv"), "Kepler-22 b")
        .await
        .unwrap();
    assert_eq!(bytes, b"PNG:Kepler-22 b");
    assert!(!renderer.output_path("Kepler-22 b").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_render_failure_carries_stderr() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), r#"echo "Planet not found: $2" >&2; exit 1"#);
    let renderer = LightCurveRenderer::new("sh", script, dir.path().join("temp"));

    let err = renderer
        .render(&fixture("confirmed_sample.csv"), "Nope")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Planet not found: Nope"), "unexpected error: {err}");
}

#[cfg(unix)]
#[tokio::test]
async fn test_render_without_image_is_error() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "exit 0");
    let renderer = LightCurveRenderer::new("sh", script, dir.path().join("temp"));

    let err = renderer
        .render(&fixture("confirmed_sample.csv"), "Kepler-22 b")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no image"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_render_times_out() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "sleep 5");
    let renderer = LightCurveRenderer::new("sh", script, dir.path().join("temp"))
        .with_timeout(Duration::from_millis(200));

    let err = renderer
        .render(&fixture("confirmed_sample.csv"), "Kepler-22 b")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timed out"));
}
