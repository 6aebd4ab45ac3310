use super::super::Model;
use shared::ClusterSummary;
use yew::prelude::*;

pub fn render_results(model: &Model) -> Html {
    let Some(response) = &model.result else {
        return html! {};
    };

    let clusters = ClusterSummary::from_results(&response.results);

    html! {
        <div class="results-container">
            <div class="result-header">
                <h2><i class="fa-solid fa-layer-group"></i>{ format!(" {}", response.message) }</h2>
            </div>
            {
                match &response.analysis_image {
                    Some(uri) => html! {
                        <img class="analysis-image" src={uri.clone()} alt="Cluster analysis" />
                    },
                    None => html! {
                        <p class="no-results-message">{"No analysis image was returned."}</p>
                    },
                }
            }
            {
                if clusters.is_empty() {
                    render_raw_results(&response.results)
                } else {
                    render_cluster_table(&clusters)
                }
            }
        </div>
    }
}

fn render_cluster_table(clusters: &[ClusterSummary]) -> Html {
    html! {
        <div class="detailed-results">
            <h3>{"Land cover clusters"}</h3>
            <div class="result-bars">
                { for clusters.iter().map(|cluster| {
                    let color = cluster.css_color();
                    html! {
                        <div class="result-item">
                            <div class="result-label">
                                <span class="cluster-swatch" style={format!("background-color: {}", color)}></span>
                                { format!("Cluster {}", cluster.cluster_id) }
                            </div>
                            <div class="result-bar-container">
                                <div
                                    class="result-bar"
                                    style={format!("width: {}%; background-color: {}", cluster.percentage, color)}
                                ></div>
                            </div>
                            <div class="result-value">{ format!("{:.1}%", cluster.percentage) }</div>
                        </div>
                    }
                })}
            </div>
        </div>
    }
}

fn render_raw_results(results: &serde_json::Value) -> Html {
    let pretty = serde_json::to_string_pretty(results).unwrap_or_else(|_| results.to_string());
    html! {
        <div class="detailed-results">
            <h3>{"Raw results"}</h3>
            <pre class="raw-results">{ pretty }</pre>
        </div>
    }
}
