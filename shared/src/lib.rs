use serde::{Deserialize, Serialize};

pub mod geo;

pub use geo::{CoordinateError, Coordinates, TileCoord};

pub const MIN_CLUSTERS: i64 = 2;
pub const MAX_CLUSTERS: i64 = 10;
pub const DEFAULT_CLUSTERS: i64 = 4;

/// Body of a successful `POST /api/process-image`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProcessImageResponse {
    pub success: bool,
    pub message: String,
    pub results: serde_json::Value,
    #[serde(rename = "analysisImage")]
    pub analysis_image: Option<String>,
}

/// Body of every failed request. `details`, `stderr` and `stdout` are meant for operators.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            stderr: None,
            stdout: None,
        }
    }
}

/// One entry of the `clusters` array emitted by the analysis program.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClusterSummary {
    pub cluster_id: u32,
    pub percentage: f64,
    pub color_rgb: [u8; 3],
}

impl ClusterSummary {
    /// Reads the typed cluster list out of an arbitrary results object.
    /// Entries that don't match the expected shape are skipped.
    pub fn from_results(results: &serde_json::Value) -> Vec<ClusterSummary> {
        results
            .get("clusters")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn css_color(&self) -> String {
        let [r, g, b] = self.color_rgb;
        format!("rgb({}, {}, {})", r, g, b)
    }
}
