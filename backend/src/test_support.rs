//! Fixtures shared by the unit tests: stand-in analysis scripts run through `sh`,
//! and a hand-rolled multipart body builder.

use std::path::{Path, PathBuf};

pub const BOUNDARY: &str = "----satviewTestBoundary7MA4YWxkTrZu0gW";

/// Writes a uniquely named `sh` script into `dir`.
pub fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join(format!("script-{}.sh", uuid::Uuid::new_v4().simple()));
    std::fs::write(&path, body).unwrap();
    path
}

/// Behaves like the real clustering script: reports whether its input exists, writes
/// `<input stem>_analysis.png` next to it, and prints the JSON block.
/// With `output_override` it writes nothing and reports that path instead.
pub fn analysis_script(dir: &Path, output_override: Option<&str>) -> PathBuf {
    let output = match output_override {
        Some(path) => format!("out='{}'\n", path),
        None => "out=\"${input%.png}_analysis.png\"\nprintf '\\211PNG\\r\\n\\032\\n' > \"$out\"\n"
            .to_string(),
    };
    let body = format!(
        r#"input="$1"
seen=false
[ -f "$input" ] && seen=true
{output}echo "Processing $input"
echo ""
echo "=================================================="
echo "JSON_RESULTS:"
printf '{{\n  "success": true,\n  "input": "%s",\n  "input_seen": %s,\n  "clusters_requested": %s,\n  "output_image": "%s",\n  "clusters": [{{"cluster_id": 0, "percentage": 100.0, "color_rgb": [1, 2, 3]}}]\n}}\n' "$input" "$seen" "$2" "$out"
echo "=================================================="
"#
    );
    write_script(dir, &body)
}

pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }

    pub fn file(name: &'a str, file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content_type: Some(content_type),
            data,
        }
    }
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{}\"", file_name));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
