use shared::ProcessImageResponse;
use std::path::PathBuf;

use super::error::ProcessImageError;
use super::response;
use crate::config::ServerConfig;
use crate::pyprocess::extractor::{extract_results, resolve_within};
use crate::pyprocess::invoker::AnalysisInvoker;
use crate::staging::cleanup::CleanupGuard;
use crate::staging::store::StagingStore;
use crate::upload::models::{ClusterCount, UploadPolicy, ValidatedUpload};

/// Stage → invoke → extract → compose, with the staged files removed on every path.
#[derive(Clone)]
pub struct AnalysisService {
    staging: StagingStore,
    invoker: AnalysisInvoker,
    policy: UploadPolicy,
}

impl AnalysisService {
    pub fn new(staging: StagingStore, invoker: AnalysisInvoker, policy: UploadPolicy) -> Self {
        Self {
            staging,
            invoker,
            policy,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            StagingStore::new(config.staging.dir.clone()),
            AnalysisInvoker::from_config(&config.analysis),
            UploadPolicy {
                max_bytes: config.upload.max_bytes,
                allow_default_clusters: !config.upload.require_cluster_count,
            },
        )
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub async fn process(
        &self,
        upload: ValidatedUpload,
    ) -> Result<ProcessImageResponse, ProcessImageError> {
        log::info!(
            "Processing upload ({} bytes, {}, original name {:?}) with {} clusters",
            upload.data.len(),
            upload.content_type,
            upload.file_name,
            upload.clusters
        );

        let mut staged = self.staging.stage(&upload.data).await?;
        let result = self.analyze(&mut staged, upload.clusters).await;
        staged.cleanup();
        result
    }

    async fn analyze(
        &self,
        staged: &mut CleanupGuard,
        clusters: ClusterCount,
    ) -> Result<ProcessImageResponse, ProcessImageError> {
        let outcome = self.invoker.run(staged.input(), clusters).await?;

        let analysis = match extract_results(&outcome.stdout) {
            Ok(analysis) => analysis,
            Err(source) => {
                log::error!("Could not extract analysis results: {}", source);
                return Err(ProcessImageError::Extraction {
                    source,
                    stdout: outcome.stdout,
                    stderr: outcome.stderr,
                });
            }
        };

        let image_path = analysis
            .output_image
            .as_deref()
            .and_then(|raw| self.accept_output_image(raw));

        let analysis_image = match image_path {
            Some(path) => {
                if staged.is_derived_output(&path) {
                    staged.register_output(path.clone());
                } else {
                    log::warn!(
                        "Output image {} is not named after {}; it will not be removed",
                        path.display(),
                        staged.input().display()
                    );
                }
                match response::load_analysis_image(&path).await {
                    Ok(uri) => Some(uri),
                    Err(e) => {
                        log::warn!("{}", e);
                        None
                    }
                }
            }
            None => None,
        };

        log::info!(
            "Analysis finished for {} (image attached: {})",
            staged.input().display(),
            analysis_image.is_some()
        );
        Ok(response::success(analysis.results, analysis_image))
    }

    fn accept_output_image(&self, raw: &str) -> Option<PathBuf> {
        let resolved = resolve_within(self.staging.root(), raw);
        if resolved.is_none() {
            log::warn!(
                "Discarding output image '{}': outside staging root {}",
                raw,
                self.staging.root().display()
            );
        }
        resolved
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{analysis_script, write_script};
    use std::time::Duration;

    fn service(root: PathBuf, script: PathBuf) -> AnalysisService {
        AnalysisService::new(
            StagingStore::new(root),
            AnalysisInvoker::new("sh", script, Duration::from_secs(10)),
            UploadPolicy {
                max_bytes: 1024,
                allow_default_clusters: true,
            },
        )
    }

    fn upload() -> ValidatedUpload {
        ValidatedUpload {
            data: b"\x89PNG\r\n\x1a\nfake".to_vec(),
            content_type: "image/png".into(),
            file_name: Some("tile.png".into()),
            clusters: ClusterCount::new(5).unwrap(),
        }
    }

    fn staged_files(root: &std::path::Path) -> usize {
        std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
    }

    #[actix_web::test]
    async fn success_attaches_image_and_leaves_no_files() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");
        let script = analysis_script(tmp.path(), None);

        let resp = service(root.clone(), script).process(upload()).await.unwrap();

        assert!(resp.success);
        assert_eq!(resp.results["input_seen"], true);
        assert_eq!(resp.results["clusters_requested"], 5);
        assert!(resp
            .analysis_image
            .as_deref()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert_eq!(staged_files(&root), 0);
    }

    #[actix_web::test]
    async fn output_outside_root_is_neither_read_nor_deleted() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");
        let secret = tmp.path().join("secret.png");
        std::fs::write(&secret, b"\x89PNG\r\n\x1a\nsecret").unwrap();
        let traversal = format!("{}/../secret.png", root.display());
        let script = analysis_script(tmp.path(), Some(&traversal));

        let resp = service(root.clone(), script).process(upload()).await.unwrap();

        assert!(resp.success);
        assert!(resp.analysis_image.is_none());
        assert!(secret.exists());
        assert_eq!(staged_files(&root), 0);
    }

    #[actix_web::test]
    async fn foreign_file_inside_root_is_read_but_not_deleted() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");
        std::fs::create_dir_all(&root).unwrap();
        let other_request = root.join("satellite-1-0000000000000000.png");
        std::fs::write(&other_request, b"\x89PNG\r\n\x1a\nin use").unwrap();
        let script = analysis_script(tmp.path(), Some(other_request.to_str().unwrap()));

        let resp = service(root.clone(), script).process(upload()).await.unwrap();

        assert!(resp.success);
        assert!(resp.analysis_image.is_some());
        assert!(other_request.exists());
        assert_eq!(staged_files(&root), 1);
    }

    #[actix_web::test]
    async fn missing_output_file_still_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");
        let never_written = format!("{}/never_written.png", root.display());
        let script = analysis_script(tmp.path(), Some(&never_written));

        let resp = service(root, script).process(upload()).await.unwrap();
        assert!(resp.success);
        assert!(resp.analysis_image.is_none());
    }

    #[actix_web::test]
    async fn failures_still_remove_the_staged_input() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("temp");

        let crashing = write_script(tmp.path(), "echo 'Traceback' >&2\nexit 1\n");
        let err = service(root.clone(), crashing)
            .process(upload())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessImageError::Analysis(_)));
        assert_eq!(staged_files(&root), 0);

        let silent = write_script(tmp.path(), "echo 'all done, no json'\n");
        let err = service(root.clone(), silent)
            .process(upload())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessImageError::Extraction { .. }));
        assert_eq!(staged_files(&root), 0);
    }
}
