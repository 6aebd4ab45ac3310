use super::super::{Model, Msg};
use shared::geo::{MAX_ZOOM, MIN_ZOOM};
use shared::TileCoord;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// Shows the World Imagery tile containing the current coordinates.
pub fn render_tile_preview(model: &Model, ctx: &Context<Model>) -> Html {
    let tile = TileCoord::containing(&model.coordinates, model.zoom);
    let url = tile.world_imagery_url();

    let current = model.zoom;
    let on_zoom = ctx.link().callback(move |e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        Msg::SetZoom(input.value().parse().unwrap_or(current))
    });

    html! {
        <section class="tile-preview">
            <div class="tile-toolbar">
                <label for="zoom">{"Zoom"}</label>
                <input
                    type="range"
                    id="zoom"
                    min={MIN_ZOOM.to_string()}
                    max={MAX_ZOOM.to_string()}
                    value={model.zoom.to_string()}
                    onchange={on_zoom}
                />
                <span class="zoom-value">{ model.zoom }</span>
                <button
                    class="download-link"
                    title={model.coordinates.download_file_name()}
                    onclick={ctx.link().callback(|_| Msg::DownloadTile)}
                >
                    <i class="fa-solid fa-download"></i> {" Download tile"}
                </button>
            </div>
            <img
                class="tile-image"
                src={url}
                alt={format!("Satellite tile at {}", model.coordinates.label())}
            />
            <p class="tile-caption">
                { format!("{} (tile {}/{}/{})", model.coordinates.label(), tile.z, tile.x, tile.y) }
            </p>
        </section>
    }
}
