use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use log::{error, info, warn};
use serde_json::json;
use std::path::PathBuf;

use crate::analysis::error::ProcessImageError;
use crate::analysis::service::AnalysisService;
use crate::upload::validator::{collect_upload, validate};

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: PathBuf) {
    cfg.service(web::resource("/api/process-image").route(web::post().to(process_image)))
        .service(web::resource("/api/health").route(web::get().to(health)));

    // Registered last: "/" would otherwise shadow the API routes.
    if frontend_dir.is_dir() {
        cfg.service(Files::new("/", frontend_dir).index_file("index.html"));
    } else {
        warn!(
            "Frontend directory {} not found, serving API only",
            frontend_dir.display()
        );
    }
}

async fn process_image(
    service: web::Data<AnalysisService>,
    payload: Multipart,
) -> Result<HttpResponse, ProcessImageError> {
    let policy = service.policy();

    let raw = collect_upload(payload, policy).await.inspect_err(|e| {
        warn!("Rejected upload: {}", e);
    })?;
    let upload = validate(raw, policy).inspect_err(|e| {
        warn!("Rejected upload: {}", e);
    })?;

    match service.process(upload).await {
        Ok(response) => {
            info!("Image processed successfully");
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            error!("Image processing failed: {}", e);
            Err(e)
        }
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::pyprocess::invoker::AnalysisInvoker;
    use crate::staging::store::StagingStore;
    use crate::test_support::{
        analysis_script, multipart_body, multipart_content_type, write_script, Part,
    };
    use crate::upload::models::UploadPolicy;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use serde_json::Value;
    use std::path::Path;
    use std::time::Duration;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot really a png";

    fn service(root: PathBuf, script: PathBuf) -> AnalysisService {
        AnalysisService::new(
            StagingStore::new(root),
            AnalysisInvoker::new("sh", script, Duration::from_secs(10)),
            UploadPolicy {
                max_bytes: 4096,
                allow_default_clusters: true,
            },
        )
    }

    async fn post(service: AnalysisService, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .configure(|cfg| configure_routes(cfg, PathBuf::from("/nonexistent/dist"))),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/process-image")
            .insert_header((header::CONTENT_TYPE, multipart_content_type()))
            .set_payload(multipart_body(parts))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    fn entries(root: &Path) -> usize {
        std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
    }

    #[actix_web::test]
    async fn processes_image_and_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");
        let script = analysis_script(tmp.path(), None);

        let (status, body) = post(
            service(root.clone(), script),
            &[
                Part::file("image", "tile.png", "image/png", PNG),
                Part::text("numClusters", "3"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Image processed successfully");
        assert_eq!(body["results"]["input_seen"], true);
        assert_eq!(body["results"]["clusters_requested"], 3);
        assert!(body["analysisImage"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert_eq!(entries(&root), 0);
    }

    #[actix_web::test]
    async fn cluster_count_defaults_to_four() {
        let tmp = tempfile::tempdir().unwrap();
        let script = analysis_script(tmp.path(), None);

        let (status, body) = post(
            service(tmp.path().join("temp"), script),
            &[Part::file("image", "tile.png", "image/png", PNG)],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"]["clusters_requested"], 4);
    }

    #[actix_web::test]
    async fn crafted_file_name_never_reaches_the_staged_path() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");
        let script = analysis_script(tmp.path(), None);

        let (status, body) = post(
            service(root.clone(), script),
            &[Part::file("image", "../../x; rm -rf ~; $(id).png", "image/png", PNG)],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let input = PathBuf::from(body["results"]["input"].as_str().unwrap());
        assert_eq!(input.parent(), Some(root.as_path()));
        let name = input.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("satellite-"));
        assert!(!name.contains("rm"));
    }

    #[actix_web::test]
    async fn invalid_requests_are_rejected_before_staging() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");
        // Would leave a marker file if it were ever run.
        let tripwire = tmp.path().join("ran");
        let script = write_script(tmp.path(), &format!("touch '{}'\n", tripwire.display()));

        let cases: Vec<Vec<Part<'_>>> = vec![
            vec![Part::text("numClusters", "4")],
            vec![Part::file("image", "notes.txt", "text/plain", b"hello")],
            vec![
                Part::file("image", "tile.png", "image/png", PNG),
                Part::text("numClusters", "11"),
            ],
            vec![
                Part::file("image", "tile.png", "image/png", PNG),
                Part::text("numClusters", "4; rm -rf /"),
            ],
            vec![
                Part::file("image", "tile.png", "image/png", PNG),
                Part::text("numClusters", "abc"),
            ],
        ];

        for parts in &cases {
            let (status, body) = post(service(root.clone(), script.clone()), parts).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].is_string());
            assert!(body.get("success").is_none());
        }

        assert!(!root.exists());
        assert!(!tripwire.exists());
    }

    #[actix_web::test]
    async fn oversize_upload_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");
        let script = analysis_script(tmp.path(), None);
        let big = vec![0u8; 8192];

        let (status, _) = post(
            service(root.clone(), script),
            &[Part::file("image", "big.png", "image/png", &big)],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!root.exists());
    }

    #[actix_web::test]
    async fn script_failure_returns_diagnostics_and_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");
        let script = write_script(
            tmp.path(),
            "echo 'loading'\necho 'ModuleNotFoundError: cv2' >&2\nexit 1\n",
        );

        let (status, body) = post(
            service(root.clone(), script),
            &[Part::file("image", "tile.png", "image/png", PNG)],
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error running the image analysis");
        assert!(body["stderr"].as_str().unwrap().contains("cv2"));
        assert_eq!(body["stdout"], "loading\n");
        assert!(body["details"].as_str().unwrap().contains("exit code 1"));
        assert_eq!(entries(&root), 0);
    }

    #[actix_web::test]
    async fn missing_separator_is_a_server_error() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");
        let script = write_script(tmp.path(), "echo 'JSON_RESULTS:'\necho '{\"a\": 1}'\n");

        let (status, body) = post(
            service(root.clone(), script),
            &[Part::file("image", "tile.png", "image/png", PNG)],
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("No JSON_RESULTS block"));
        assert_eq!(entries(&root), 0);
    }

    #[actix_web::test]
    async fn traversal_in_output_image_yields_null_image() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");
        let outside = tmp.path().join("passwot");
        std::fs::write(&outside, b"do not touch").unwrap();
        let escaped = format!("{}/../passwot", root.display());
        let script = analysis_script(tmp.path(), Some(&escaped));

        let (status, body) = post(
            service(root.clone(), script),
            &[Part::file("image", "tile.png", "image/png", PNG)],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysisImage"], Value::Null);
        assert_eq!(std::fs::read(&outside).unwrap(), b"do not touch");
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service(
                    tmp.path().join("temp"),
                    tmp.path().join("unused.sh"),
                )))
                .configure(|cfg| configure_routes(cfg, PathBuf::from("/nonexistent/dist"))),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
    }
}
