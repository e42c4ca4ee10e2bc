use care_client::queries;
use care_client::stats::{self, DateFilter, EventFilter};
use care_types::Event;
use chrono::Utc;
use leptos::prelude::*;

use crate::components::status::{ErrorNote, Loading};
use crate::hooks::use_query;

pub fn format_event_date(event: &Event) -> String {
    event
        .starts_at()
        .map(|t| t.format("%a, %b %-d %Y").to_string())
        .unwrap_or_else(|| event.date.clone())
}

#[component]
pub fn EventCard(event: Event) -> impl IntoView {
    let href = format!("/events/{}", event.id);
    let date = format_event_date(&event);
    let volunteers = match event.volunteers.len() {
        1 => "1 volunteer".to_string(),
        n => format!("{n} volunteers"),
    };

    view! {
        <div class="card event-card">
            {event.image.map(|src| view! { <img class="event-image" src=src alt="" /> })}
            <h3 class="event-title">{event.title}</h3>
            <div class="event-meta">
                <span>{date}</span>
                <span>{event.location}</span>
            </div>
            <div class="event-footer">
                <span class="event-volunteers">{volunteers}</span>
                <a href=href class="btn btn-ghost btn-sm">"View details"</a>
            </div>
        </div>
    }
}

fn parse_date_filter(raw: &str) -> DateFilter {
    match raw {
        "upcoming" => DateFilter::Upcoming,
        "past" => DateFilter::Past,
        _ => DateFilter::All,
    }
}

#[component]
pub fn EventsPage() -> impl IntoView {
    let events = use_query::<Vec<Event>, _>(|| Some(queries::events()));

    let (search, setSearch) = signal(String::new());
    let (when, setWhen) = signal(DateFilter::All);
    let (location, setLocation) = signal(None::<String>);

    let locations = move || {
        events.with(|r| {
            r.data
                .as_deref()
                .map(stats::distinct_locations)
                .unwrap_or_default()
        })
    };

    view! {
        <div class="dashboard-header">
            <h1>"Events"</h1>
            <p class="subtitle">"Find a cleanup or planting near you"</p>
        </div>
        <div class="filter-bar">
            <input
                type="search"
                placeholder="Search by title or location"
                prop:value=search
                on:input=move |ev| setSearch.set(event_target_value(&ev))
            />
            <select on:change=move |ev| setWhen.set(parse_date_filter(&event_target_value(&ev)))>
                <option value="all">"All dates"</option>
                <option value="upcoming">"Upcoming"</option>
                <option value="past">"Past"</option>
            </select>
            <select on:change=move |ev| {
                let value = event_target_value(&ev);
                setLocation.set((!value.is_empty()).then_some(value));
            }>
                <option value="">"All locations"</option>
                {move || {
                    locations()
                        .into_iter()
                        .map(|loc| view! { <option value=loc.clone()>{loc.clone()}</option> })
                        .collect_view()
                }}
            </select>
        </div>
        {move || {
            let result = events.get();
            let Some(list) = result.data else {
                return match result.error {
                    Some(error) => view! { <ErrorNote what="events" error=Some(error) /> }.into_any(),
                    None => view! { <Loading label="Loading events..." /> }.into_any(),
                };
            };
            let filter = EventFilter {
                search: search.get(),
                when: when.get(),
                location: location.get(),
            };
            let matching: Vec<Event> = stats::filter_events(&list, &filter, Utc::now())
                .into_iter()
                .cloned()
                .collect();
            if matching.is_empty() {
                return view! { <p class="empty">"No events match your filters."</p> }.into_any();
            }
            view! {
                <div class="event-grid">
                    {matching
                        .into_iter()
                        .map(|event| view! { <EventCard event=event /> })
                        .collect_view()}
                </div>
            }
                .into_any()
        }}
    }
}
