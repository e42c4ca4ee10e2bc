use leptos::prelude::*;

/// Headline number with a caption, used on the dashboards.
#[component]
pub fn StatCard(
    #[prop(into)]
    title: String,
    #[prop(into)]
    value: String,
    /// Optional secondary line, e.g. month-over-month growth
    #[prop(optional, into)]
    hint: Option<String>,
) -> impl IntoView {
    view! {
        <div class="card stat-card">
            <div class="card-title">{title}</div>
            <div class="stat-value">{value}</div>
            {hint.map(|h| view! { <div class="stat-hint">{h}</div> })}
        </div>
    }
}

pub fn format_amount(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Signed percentage such as `+12.5%`.
pub fn format_growth(percent: f64) -> String {
    format!("{percent:+.1}%")
}
