use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};

pub const RESULT_MARKER: &str = "JSON_RESULTS:";
pub const SEPARATOR: &str = "==================================================";
pub const OUTPUT_IMAGE_KEY: &str = "output_image";

lazy_static! {
    // Marker, shortest `{...}`, then the separator. The first match wins.
    static ref RESULT_BLOCK: Regex = Regex::new(&format!(
        r"{}\s*(\{{[\s\S]*?\}})\s*{}",
        regex::escape(RESULT_MARKER),
        regex::escape(SEPARATOR)
    ))
    .unwrap();
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("No JSON_RESULTS block found in the analysis output")]
    NoResultMarkerFound,
    #[error("The JSON_RESULTS block is not a valid JSON object: {0}")]
    MalformedResultJson(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// The whole object, relayed to the client as-is.
    pub results: Value,
    /// Raw `output_image` as printed by the process; not yet checked against the staging root.
    pub output_image: Option<String>,
}

pub fn extract_results(stdout: &str) -> Result<AnalysisResult, ExtractionError> {
    let block = RESULT_BLOCK
        .captures(stdout)
        .and_then(|caps| caps.get(1))
        .ok_or(ExtractionError::NoResultMarkerFound)?;

    let object: Map<String, Value> = serde_json::from_str(block.as_str())?;
    let output_image = object
        .get(OUTPUT_IMAGE_KEY)
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(AnalysisResult {
        results: Value::Object(object),
        output_image,
    })
}

/// Resolves `candidate` (relative paths against the working directory), collapses `.` and
/// `..` without touching the filesystem, and returns it only if it lies strictly inside `root`.
pub fn resolve_within(root: &Path, candidate: &str) -> Option<PathBuf> {
    if candidate.trim().is_empty() {
        return None;
    }
    let candidate = Path::new(candidate);
    let absolute = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(candidate)
    };

    let resolved = normalize(&absolute);
    let root = normalize(root);
    (resolved != root && resolved.starts_with(&root)).then_some(resolved)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str())
            }
            Component::CurDir => {}
            // `..` at the root stays at the root.
            Component::ParentDir => {
                if out.parent().is_some() {
                    out.pop();
                }
            }
        }
    }
    out
}
