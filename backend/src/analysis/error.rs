use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;

use crate::pyprocess::extractor::ExtractionError;
use crate::pyprocess::invoker::AnalysisError;
use crate::staging::store::StagingError;
use crate::upload::validator::ValidationError;

/// Every fatal outcome of `POST /api/process-image`.
#[derive(Debug, thiserror::Error)]
pub enum ProcessImageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("{source}")]
    Extraction {
        source: ExtractionError,
        stdout: String,
        stderr: String,
    },
}

impl ProcessImageError {
    pub fn user_message(&self) -> String {
        match self {
            // Client-caused; the message says what to fix and carries nothing internal.
            ProcessImageError::Validation(e) => e.to_string(),
            ProcessImageError::Staging(_) => "Error processing the image".to_string(),
            ProcessImageError::Analysis(_) => "Error running the image analysis".to_string(),
            ProcessImageError::Extraction { .. } => {
                "The image analysis returned no usable results".to_string()
            }
        }
    }

    /// Failure body. `details`, `stderr` and `stdout` are operator diagnostics and may
    /// echo internal paths.
    pub fn to_error_response(&self) -> ErrorResponse {
        let mut body = ErrorResponse::new(self.user_message());
        match self {
            ProcessImageError::Validation(_) => {}
            ProcessImageError::Staging(e) => body.details = Some(e.to_string()),
            ProcessImageError::Analysis(e) => {
                body.details = Some(e.to_string());
                if let Some((stdout, stderr)) = e.captured_output() {
                    body.stdout = Some(stdout.to_string());
                    body.stderr = Some(stderr.to_string());
                }
            }
            ProcessImageError::Extraction {
                source,
                stdout,
                stderr,
            } => {
                body.details = Some(source.to_string());
                body.stdout = Some(stdout.clone());
                body.stderr = Some(stderr.clone());
            }
        }
        body
    }
}

impl ResponseError for ProcessImageError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProcessImageError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_error_response())
    }
}
