use care_client::queries;
use care_client::stats::DonorTier;
use care_types::DonorWallEntry;
use leptos::prelude::*;

use crate::components::stat_card::format_amount;
use crate::components::status::{ErrorNote, Loading};
use crate::hooks::use_query;

#[component]
pub fn DonorsPage() -> impl IntoView {
    let wall = use_query::<Vec<DonorWallEntry>, _>(|| Some(queries::donor_wall()));

    view! {
        <div class="dashboard-header">
            <h1>"Donor wall"</h1>
            <p class="subtitle">"Thank you to everyone who keeps PlanetCare going"</p>
        </div>
        {move || {
            let result = wall.get();
            let Some(donors) = result.data else {
                return match result.error {
                    Some(error) => view! { <ErrorNote what="donors" error=Some(error) /> }.into_any(),
                    None => view! { <Loading label="Loading donors..." /> }.into_any(),
                };
            };
            if donors.is_empty() {
                return view! { <p class="empty">"Be the first to donate!"</p> }.into_any();
            }
            view! {
                <div class="donor-grid">
                    {donors.into_iter().map(|donor| view! { <DonorCard donor=donor /> }).collect_view()}
                </div>
            }
                .into_any()
        }}
    }
}

#[component]
fn DonorCard(donor: DonorWallEntry) -> impl IntoView {
    let tier = DonorTier::for_amount(donor.total_amount);
    let tierClass = format!("tier-badge tier-{}", tier.label().to_lowercase());
    let name = if donor.name.is_empty() { donor.email.clone() } else { donor.name.clone() };
    let gifts = match donor.donation_count {
        1 => "1 donation".to_string(),
        n => format!("{n} donations"),
    };

    view! {
        <div class="card donor-card">
            {donor.photo.map(|src| view! { <img class="avatar" src=src alt="" /> })}
            <h3>{name}</h3>
            <span class=tierClass>{tier.label()}</span>
            <div class="donor-total">{format_amount(donor.total_amount)}</div>
            <div class="donor-count">{gifts}</div>
            {donor.message.map(|m| view! { <blockquote>{m}</blockquote> })}
        </div>
    }
}
