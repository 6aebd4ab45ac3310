mod components;

use components::coordinate_input::render_coordinate_input;
use components::handlers::{fetch_tile, save_object_url, send_analysis_request};
use components::header::render_header;
use components::results::render_results;
use components::tile_preview::render_tile_preview;
use components::upload_section::render_upload_section;
use components::utils::render_error_message;
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::geo::DEFAULT_ZOOM;
use shared::{Coordinates, ProcessImageResponse, TileCoord, DEFAULT_CLUSTERS};
use yew::prelude::*;

// Yew msg components
pub enum Msg {
    // Coordinate form
    SetLatitude(String),
    SetLongitude(String),
    SubmitCoordinates,
    SetZoom(u8),
    DownloadTile,
    TileFetched(ObjectUrl, String),

    // Upload & analysis
    FileSelected(GlooFile),
    SetClusters(String),
    Analyze,
    AnalysisFinished(ProcessImageResponse),

    // UI states
    SetError(Option<String>),
}

// Main component
pub struct Model {
    pub latitude_input: String,
    pub longitude_input: String,
    pub coordinates: Coordinates,
    pub zoom: u8,
    pub coordinate_error: Option<String>,
    pub tile_download: Option<ObjectUrl>,

    pub selected_file: Option<GlooFile>,
    pub preview_url: Option<ObjectUrl>,
    pub num_clusters: String,

    pub loading: bool,
    pub error: Option<String>,
    pub result: Option<ProcessImageResponse>,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        let coordinates = Coordinates::default();
        Self {
            latitude_input: coordinates.lat.to_string(),
            longitude_input: coordinates.lng.to_string(),
            coordinates,
            zoom: DEFAULT_ZOOM,
            coordinate_error: None,
            tile_download: None,
            selected_file: None,
            preview_url: None,
            num_clusters: DEFAULT_CLUSTERS.to_string(),
            loading: false,
            error: None,
            result: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::SetLatitude(value) => {
                self.latitude_input = value;
                true
            }
            Msg::SetLongitude(value) => {
                self.longitude_input = value;
                true
            }
            Msg::SubmitCoordinates => self.handle_submit_coordinates(),
            Msg::SetZoom(zoom) => {
                self.zoom = TileCoord::clamp_zoom(zoom);
                true
            }
            Msg::DownloadTile => {
                let tile = TileCoord::containing(&self.coordinates, self.zoom);
                fetch_tile(ctx, tile.world_imagery_url(), self.coordinates.download_file_name());
                false
            }
            Msg::TileFetched(url, file_name) => {
                save_object_url(&url, &file_name);
                // Revoked on drop, so keep it until the next download.
                self.tile_download = Some(url);
                false
            }

            Msg::FileSelected(file) => self.handle_file_selected(file),
            Msg::SetClusters(value) => {
                self.num_clusters = value;
                true
            }
            Msg::Analyze => self.handle_analyze(ctx),
            Msg::AnalysisFinished(response) => {
                self.loading = false;
                self.error = None;
                self.result = Some(response);
                true
            }

            Msg::SetError(error) => {
                self.error = error;
                self.loading = false;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_header() }

                <main class="main-content">
                    { render_coordinate_input(self, ctx) }
                    { render_tile_preview(self, ctx) }
                    { render_upload_section(self, ctx) }
                    { render_error_message(self) }
                    { render_results(self) }
                </main>

                <footer class="app-footer">
                    <p>{ format!("Current coordinates: {}", self.coordinates.label()) }</p>
                </footer>
            </div>
        }
    }
}

// Handler methods
impl Model {
    fn handle_submit_coordinates(&mut self) -> bool {
        match Coordinates::parse(&self.latitude_input, &self.longitude_input) {
            Ok(coordinates) => {
                log::info!("Moving to {}", coordinates.label());
                self.coordinates = coordinates;
                self.coordinate_error = None;
            }
            Err(e) => self.coordinate_error = Some(e.to_string()),
        }
        true
    }

    fn handle_file_selected(&mut self, file: GlooFile) -> bool {
        self.preview_url = Some(ObjectUrl::from(file.clone()));
        self.selected_file = Some(file);
        self.result = None;
        self.error = None;
        true
    }

    fn handle_analyze(&mut self, ctx: &Context<Self>) -> bool {
        let Some(file) = self.selected_file.clone() else {
            self.error = Some("Select an image to analyze first.".into());
            return true;
        };

        self.loading = true;
        self.error = None;
        self.result = None;
        send_analysis_request(ctx, file, self.num_clusters.trim().to_string());
        true
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("App starting...");
    yew::Renderer::<Model>::new().render();
}
