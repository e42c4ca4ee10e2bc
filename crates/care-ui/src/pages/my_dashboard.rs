use care_client::queries;
use care_client::stats::{self, DonorTier};
use care_types::{Donation, Event};
use leptos::prelude::*;

use crate::components::stat_card::{format_amount, StatCard};
use crate::components::status::{ErrorNote, Loading};
use crate::components::toast::use_toasts;
use crate::hooks::{spawn, use_email, use_query, use_session, use_session_store};
use crate::pages::events::EventCard;

#[component]
pub fn MyDashboardPage() -> impl IntoView {
    let email = use_email();
    let donations =
        use_query::<Vec<Donation>, _>(move || email.get().map(|e| queries::my_donations(&e)));
    let events = use_query::<Vec<Event>, _>(move || email.get().map(|e| queries::my_events(&e)));

    view! {
        <div class="dashboard-header">
            <h1>"My dashboard"</h1>
            <p class="subtitle">"Your donations and the events you've joined"</p>
        </div>
        <Profile />
        {move || {
            let mine = donations.get().data.unwrap_or_default();
            let joined = events.with(|r| r.data.as_ref().map_or(0, Vec::len));
            let total = stats::total_amount(&mine);
            view! {
                <div class="stat-row">
                    <StatCard title="Total donated" value=format_amount(total) />
                    <StatCard title="Donations" value=mine.len().to_string() />
                    <StatCard title="Donor tier" value=DonorTier::for_amount(total).label() />
                    <StatCard title="Events joined" value=joined.to_string() />
                </div>
            }
        }}
        <section>
            <h2>"My donations"</h2>
            {move || {
                let result = donations.get();
                let Some(list) = result.data else {
                    return match result.error {
                        Some(error) => {
                            view! { <ErrorNote what="your donations" error=Some(error) /> }.into_any()
                        }
                        None => view! { <Loading label="Loading donations..." /> }.into_any(),
                    };
                };
                if list.is_empty() {
                    return view! {
                        <p class="empty">"No donations yet. " <a href="/donate">"Make your first one"</a></p>
                    }
                        .into_any();
                }
                view! {
                    <table class="table">
                        <thead>
                            <tr>
                                <th>"Date"</th>
                                <th>"Amount"</th>
                                <th>"Status"</th>
                                <th>"Message"</th>
                            </tr>
                        </thead>
                        <tbody>
                            {list
                                .into_iter()
                                .map(|d| {
                                    let date = d
                                        .donated_at()
                                        .map(|t| t.format("%b %-d, %Y").to_string())
                                        .unwrap_or_else(|| d.donated_at.clone());
                                    view! {
                                        <tr>
                                            <td>{date}</td>
                                            <td>{format_amount(d.amount)}</td>
                                            <td>{format!("{:?}", d.status)}</td>
                                            <td>{d.message.unwrap_or_default()}</td>
                                        </tr>
                                    }
                                })
                                .collect_view()}
                        </tbody>
                    </table>
                }
                    .into_any()
            }}
        </section>
        <section>
            <h2>"Events I've joined"</h2>
            {move || {
                let result = events.get();
                match result.data {
                    None if result.error.is_some() => {
                        view! { <ErrorNote what="your events" error=result.error /> }.into_any()
                    }
                    None => view! { <Loading label="Loading events..." /> }.into_any(),
                    Some(list) if list.is_empty() => {
                        view! { <p class="empty">"You haven't joined any events yet."</p> }.into_any()
                    }
                    Some(list) => {
                        view! {
                            <div class="event-grid">
                                {list
                                    .into_iter()
                                    .map(|event| view! { <EventCard event=event /> })
                                    .collect_view()}
                            </div>
                        }
                            .into_any()
                    }
                }
            }}
        </section>
    }
}

#[component]
fn Profile() -> impl IntoView {
    let store = use_session_store();
    let session = use_session();
    let toasts = use_toasts();
    let identity = move || session.with(|s| s.identity.clone());

    let (name, setName) = signal(
        session.with_untracked(|s| s.identity.as_ref().map(|i| i.name_or_handle()).unwrap_or_default()),
    );
    let (saving, setSaving) = signal(false);

    let save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let store = store.clone();
        let requested = name.get_untracked();
        setSaving.set(true);
        spawn(async move {
            let result = store.update_display_name(&requested).await;
            toasts.report(&result, "Profile updated");
            let _ = setSaving.try_set(false);
        });
    };

    view! {
        <section class="card profile">
            <div class="profile-summary">
                {move || {
                    identity()
                        .and_then(|i| i.photo_url)
                        .map(|src| view! { <img class="avatar" src=src alt="" /> })
                }}
                <div>
                    <strong>{move || identity().map(|i| i.name_or_handle()).unwrap_or_default()}</strong>
                    <div class="muted">{move || identity().map(|i| i.email).unwrap_or_default()}</div>
                </div>
            </div>
            <form class="profile-form" on:submit=save>
                <label>
                    "Display name"
                    <input
                        prop:value=name
                        on:input=move |ev| setName.set(event_target_value(&ev))
                    />
                </label>
                <button type="submit" class="btn btn-primary btn-sm" disabled=move || saving.get()>
                    {move || if saving.get() { "Saving..." } else { "Save" }}
                </button>
            </form>
        </section>
    }
}
