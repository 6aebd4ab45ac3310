use super::super::{Model, Msg};
use gloo_file::{Blob, File as GlooFile, ObjectUrl};
use gloo_net::http::Request;
use shared::{ErrorResponse, ProcessImageResponse};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

pub fn send_analysis_request(ctx: &Context<Model>, file: GlooFile, num_clusters: String) {
    spawn_local({
        let link = ctx.link().clone();

        async move {
            let form_data = match build_form(&file, &num_clusters) {
                Ok(form) => form,
                Err(e) => {
                    link.send_message(Msg::SetError(Some(e)));
                    return;
                }
            };

            let request = match Request::post("/api/process-image").body(form_data) {
                Ok(request) => request,
                Err(e) => {
                    link.send_message(Msg::SetError(Some(format!("Failed to build request: {}", e))));
                    return;
                }
            };

            match request.send().await {
                Ok(response) => {
                    if response.ok() {
                        match response.json::<ProcessImageResponse>().await {
                            Ok(results) => link.send_message(Msg::AnalysisFinished(results)),
                            Err(e) => link.send_message(Msg::SetError(Some(format!(
                                "Failed to parse response: {}",
                                e
                            )))),
                        }
                    } else {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        link.send_message(Msg::SetError(Some(describe_failure(status, &body))))
                    }
                }
                Err(e) => {
                    link.send_message(Msg::SetError(Some(format!("Network error: {}", e))))
                }
            }
        }
    });
}

fn build_form(file: &GlooFile, num_clusters: &str) -> Result<web_sys::FormData, String> {
    let form_data =
        web_sys::FormData::new().map_err(|_| "Failed to create form data".to_string())?;
    form_data
        .append_with_blob_and_filename("image", file.as_ref(), &file.name())
        .map_err(|_| "Failed to attach image".to_string())?;
    if !num_clusters.is_empty() {
        form_data
            .append_with_str("numClusters", num_clusters)
            .map_err(|_| "Failed to attach cluster count".to_string())?;
    }
    Ok(form_data)
}

fn describe_failure(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => match err.details {
            Some(details) => format!("{}: {}", err.error, details),
            None => err.error,
        },
        Err(_) => format!("Server error: {} - {}", status, body),
    }
}

/// Tiles are fetched into a blob URL: `download` is ignored on cross-origin links.
pub fn fetch_tile(ctx: &Context<Model>, url: String, file_name: String) {
    spawn_local({
        let link = ctx.link().clone();

        async move {
            let response = match Request::get(&url).send().await {
                Ok(response) if response.ok() => response,
                Ok(response) => {
                    link.send_message(Msg::SetError(Some(format!(
                        "Tile download failed: {}",
                        response.status()
                    ))));
                    return;
                }
                Err(e) => {
                    link.send_message(Msg::SetError(Some(format!("Network error: {}", e))));
                    return;
                }
            };

            let content_type = response
                .headers()
                .get("content-type")
                .unwrap_or_else(|| "image/png".to_string());
            match response.binary().await {
                Ok(bytes) => {
                    let blob = Blob::new_with_options(bytes.as_slice(), Some(content_type.as_str()));
                    link.send_message(Msg::TileFetched(ObjectUrl::from(blob), file_name));
                }
                Err(e) => link.send_message(Msg::SetError(Some(format!(
                    "Tile download failed: {}",
                    e
                )))),
            }
        }
    });
}

pub fn save_object_url(url: &ObjectUrl, file_name: &str) {
    let anchor = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.create_element("a").ok())
        .and_then(|el| el.dyn_into::<web_sys::HtmlAnchorElement>().ok());
    match anchor {
        Some(anchor) => {
            anchor.set_href(url);
            anchor.set_download(file_name);
            anchor.click();
        }
        None => log::error!("Could not create a download link for {}", file_name),
    }
}
