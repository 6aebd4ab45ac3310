use super::super::{Model, Msg};
use web_sys::HtmlInputElement;
use yew::prelude::*;

pub fn render_coordinate_input(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link();
    let on_lat = link.callback(|e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        Msg::SetLatitude(input.value())
    });
    let on_lng = link.callback(|e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        Msg::SetLongitude(input.value())
    });
    let on_submit = link.callback(|e: SubmitEvent| {
        e.prevent_default();
        Msg::SubmitCoordinates
    });

    html! {
        <form class="coordinate-form" onsubmit={on_submit}>
            <div class="coordinate-field">
                <label for="latitude">{"Latitude"}</label>
                <input
                    type="text"
                    id="latitude"
                    placeholder="-90 to 90"
                    value={model.latitude_input.clone()}
                    oninput={on_lat}
                />
            </div>
            <div class="coordinate-field">
                <label for="longitude">{"Longitude"}</label>
                <input
                    type="text"
                    id="longitude"
                    placeholder="-180 to 180"
                    value={model.longitude_input.clone()}
                    oninput={on_lng}
                />
            </div>
            <button type="submit" class="analyze-btn">
                <i class="fa-solid fa-location-dot"></i> {" Show"}
            </button>
            {
                if let Some(error) = &model.coordinate_error {
                    html! { <p class="field-error">{ error }</p> }
                } else {
                    html! {}
                }
            }
        </form>
    }
}
