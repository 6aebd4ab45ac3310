use super::super::{Model, Msg};
use super::utils::{debounce, first_image_file};
use shared::{MAX_CLUSTERS, MIN_CLUSTERS};
use wasm_bindgen::JsCast;
use web_sys::HtmlInputElement;
use yew::prelude::*;

pub fn render_upload_section(model: &Model, ctx: &Context<Model>) -> Html {
    html! {
        <section class="upload-section">
            <h2>{"Analyze a tile"}</h2>
            { render_file_input_area(model, ctx) }
            { render_cluster_input(model, ctx) }
            { render_preview(model) }
            { render_analyze_button(model, ctx) }
        </section>
    }
}

fn render_file_input_area(model: &Model, ctx: &Context<Model>) -> Html {
    let handle_change = ctx.link().callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let file = input.files().as_ref().and_then(first_image_file);
        input.set_value("");

        match file {
            Some(file) => Msg::FileSelected(file),
            None => Msg::SetError(Some("Please choose an image file.".into())),
        }
    });

    let trigger_file_input = Callback::from(|_| {
        let input = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("file-input"));
        if let Some(input) = input {
            if let Ok(html_input) = input.dyn_into::<web_sys::HtmlElement>() {
                html_input.click();
            }
        }
    });

    let label = model
        .selected_file
        .as_ref()
        .map(|f| f.name())
        .unwrap_or_else(|| "No image selected".to_string());

    html! {
        <div class="file-input-area">
            <input
                type="file"
                id="file-input"
                accept="image/*"
                style="display: none;"
                onchange={handle_change}
            />
            <button
                id="upload-button"
                class="analyze-btn"
                onclick={debounce(300, move || trigger_file_input.emit(()))}
            >
                <i class="fa-solid fa-upload"></i> {" Select Image"}
            </button>
            <span class="selected-file-name">{ label }</span>
        </div>
    }
}

fn render_cluster_input(model: &Model, ctx: &Context<Model>) -> Html {
    let on_input = ctx.link().callback(|e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        Msg::SetClusters(input.value())
    });

    html! {
        <div class="cluster-field">
            <label for="num-clusters">{"Number of clusters"}</label>
            <input
                type="number"
                id="num-clusters"
                min={MIN_CLUSTERS.to_string()}
                max={MAX_CLUSTERS.to_string()}
                step="1"
                value={model.num_clusters.clone()}
                oninput={on_input}
            />
        </div>
    }
}

fn render_preview(model: &Model) -> Html {
    match &model.preview_url {
        Some(url) => html! {
            <img class="upload-preview" src={url.to_string()} alt="Selected image preview" />
        },
        None => html! {},
    }
}

fn render_analyze_button(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link().clone();
    let disabled = model.loading || model.selected_file.is_none();

    html! {
        <button
            class="analyze-btn"
            disabled={disabled}
            onclick={debounce(300, move || link.send_message(Msg::Analyze))}
        >
            {
                if model.loading {
                    html! { <><i class="fa-solid fa-spinner fa-spin"></i>{" Analyzing..."}</> }
                } else {
                    html! { <><i class="fa-solid fa-magnifying-glass-chart"></i>{" Analyze"}</> }
                }
            }
        </button>
    }
}
