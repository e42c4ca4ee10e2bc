use care_client::stats::{self, DateFilter, EventFilter};
use care_client::{queries, QueryStatus};
use care_types::Event;
use chrono::Utc;
use leptos::prelude::*;

use crate::components::stat_card::StatCard;
use crate::components::status::{ErrorNote, Loading};
use crate::hooks::use_query;
use crate::pages::events::EventCard;

#[component]
pub fn HomePage() -> impl IntoView {
    let events = use_query::<Vec<Event>, _>(|| Some(queries::events()));

    view! {
        <section class="hero">
            <h1>"Care for the planet, together"</h1>
            <p class="subtitle">
                "Join local cleanups and tree plantings, or support the work with a donation."
            </p>
            <div class="hero-actions">
                <a href="/events" class="btn btn-primary">"Find an event"</a>
                <a href="/donate" class="btn btn-ghost">"Donate"</a>
            </div>
        </section>
        {move || {
            let result = events.get();
            match (result.data, result.status) {
                (Some(list), _) => {
                    let now = Utc::now();
                    let upcoming = EventFilter {
                        when: DateFilter::Upcoming,
                        ..EventFilter::default()
                    };
                    let mut next: Vec<Event> = stats::filter_events(&list, &upcoming, now)
                        .into_iter()
                        .cloned()
                        .collect();
                    next.sort_by_key(|e| e.starts_at());
                    next.truncate(3);
                    view! {
                        <div class="stat-row">
                            <StatCard title="Events" value=list.len().to_string() />
                            <StatCard
                                title="Upcoming"
                                value=stats::upcoming_events(&list, now).to_string()
                            />
                            <StatCard
                                title="Volunteer sign-ups"
                                value=stats::total_volunteer_signups(&list).to_string()
                            />
                        </div>
                        <h2>"Coming up"</h2>
                        <div class="event-grid">
                            {next
                                .into_iter()
                                .map(|event| view! { <EventCard event=event /> })
                                .collect_view()}
                        </div>
                    }
                        .into_any()
                }
                (None, QueryStatus::Error) => {
                    view! { <ErrorNote what="events" error=result.error /> }.into_any()
                }
                (None, _) => view! { <Loading label="Loading events..." /> }.into_any(),
            }
        }}
    }
}
