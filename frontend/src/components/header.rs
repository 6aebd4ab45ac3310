use yew::prelude::*;

/// Renders the application header
pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1><i class="fa-solid fa-satellite"></i> {" Satellite Imagery Viewer"}</h1>
            <p class="subtitle">{"Enter coordinates to see the satellite image of the place, then analyze a tile"}</p>
        </header>
    }
}
