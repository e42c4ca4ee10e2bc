use care_client::queries;
use care_client::stats::{self, DonationFilter, EventFilter, MonthBucket};
use care_types::{Donation, Event, EventDraft, Role, User};
use chrono::{NaiveDate, Utc};
use leptos::prelude::*;

use crate::components::stat_card::{format_amount, format_growth, StatCard};
use crate::components::status::unavailable;
use crate::components::toast::{use_toasts, ToastLevel};
use crate::hooks::{spawn, use_data, use_email, use_query};
use crate::pages::events::format_event_date;

const REPORT_MONTHS: u32 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
    Overview,
    Users,
    Events,
    Donations,
}

#[component]
pub fn AdminDashboardPage() -> impl IntoView {
    let (tab, setTab) = signal(Tab::Overview);

    let tabButton = move |target: Tab, label: &'static str| {
        view! {
            <button
                class=move || if tab.get() == target { "tab active" } else { "tab" }
                on:click=move |_| setTab.set(target)
            >
                {label}
            </button>
        }
    };

    view! {
        <div class="dashboard-header">
            <h1>"Admin dashboard"</h1>
            <p class="subtitle">"Community, events and donations at a glance"</p>
        </div>
        <div class="tab-bar">
            {tabButton(Tab::Overview, "Overview")}
            {tabButton(Tab::Users, "Users")}
            {tabButton(Tab::Events, "Events")}
            {tabButton(Tab::Donations, "Donations")}
        </div>
        {move || match tab.get() {
            Tab::Overview => view! { <Overview /> }.into_any(),
            Tab::Users => view! { <ManageUsers /> }.into_any(),
            Tab::Events => view! { <ManageEvents /> }.into_any(),
            Tab::Donations => view! { <ManageDonations /> }.into_any(),
        }}
    }
}

#[component]
fn Overview() -> impl IntoView {
    let users = use_query::<Vec<User>, _>(|| Some(queries::users()));
    let events = use_query::<Vec<Event>, _>(|| Some(queries::events()));
    let donations = use_query::<Vec<Donation>, _>(|| Some(queries::donations()));

    move || {
        let (usersResult, eventsResult, donationsResult) = (users.get(), events.get(), donations.get());
        let (Some(users), Some(events), Some(donations)) =
            (usersResult.data, eventsResult.data, donationsResult.data)
        else {
            let error = usersResult.error.or(eventsResult.error).or(donationsResult.error);
            return unavailable("the dashboard", error);
        };
        let now = Utc::now();
        let roles = stats::role_counts(&users);
        let monthly = stats::monthly_totals(&donations, now, REPORT_MONTHS);
        let activity = stats::activity_by_month(&users, &events, &donations, now, REPORT_MONTHS);
        let topDonations: Vec<Donation> = stats::top_donations(&donations, 5).into_iter().cloned().collect();
        let topEvents: Vec<Event> = stats::top_events_by_volunteers(&events, 5)
            .into_iter()
            .cloned()
            .collect();

        view! {
            <div class="stat-row">
                <StatCard
                    title="Users"
                    value=roles.total.to_string()
                    hint=format!(
                        "{} joined this month ({})",
                        stats::new_users_in_month(&users, now, 0),
                        format_growth(stats::user_growth(&users, now)),
                    )
                />
                <StatCard
                    title="Events"
                    value=events.len().to_string()
                    hint=format!("{} upcoming", stats::upcoming_events(&events, now))
                />
                <StatCard
                    title="Donations"
                    value=format_amount(stats::total_amount(&donations))
                    hint=format!(
                        "{} vs last month",
                        format_growth(stats::donation_growth(&donations, now)),
                    )
                />
                <StatCard
                    title="Average gift"
                    value=format_amount(stats::average_amount(&donations))
                />
                <StatCard
                    title="Volunteer sign-ups"
                    value=stats::total_volunteer_signups(&events).to_string()
                />
            </div>

            <div class="card">
                <div class="card-title">"Donations by month"</div>
                <MonthlyBars buckets=monthly />
            </div>

            <div class="card">
                <div class="card-title">"Members by role"</div>
                <ul class="role-breakdown">
                    {Role::ALL
                        .into_iter()
                        .map(|role| {
                            view! {
                                <li>
                                    <span>{role.label()}</span>
                                    <span>{format!("{:.0}%", roles.share(role))}</span>
                                </li>
                            }
                        })
                        .collect_view()}
                </ul>
            </div>

            <div class="split">
                <div class="card">
                    <div class="card-title">"Largest donations"</div>
                    <ol>
                        {topDonations
                            .into_iter()
                            .map(|d| {
                                let who = d.donor_name.clone().unwrap_or(d.donor_email.clone());
                                view! { <li>{who} ": " {format_amount(d.amount)}</li> }
                            })
                            .collect_view()}
                    </ol>
                </div>
                <div class="card">
                    <div class="card-title">"Most popular events"</div>
                    <ol>
                        {topEvents
                            .into_iter()
                            .map(|e| {
                                view! { <li>{e.title} ": " {e.volunteers.len()} " volunteers"</li> }
                            })
                            .collect_view()}
                    </ol>
                </div>
            </div>

            <div class="card">
                <div class="card-title">"Monthly activity"</div>
                <table class="table">
                    <thead>
                        <tr>
                            <th>"Month"</th>
                            <th>"New users"</th>
                            <th>"Events held"</th>
                            <th>"Donated"</th>
                        </tr>
                    </thead>
                    <tbody>
                        {activity
                            .into_iter()
                            .map(|row| {
                                view! {
                                    <tr>
                                        <td>{row.label}</td>
                                        <td>{row.new_users}</td>
                                        <td>{row.events}</td>
                                        <td>{format_amount(row.donations)}</td>
                                    </tr>
                                }
                            })
                            .collect_view()}
                    </tbody>
                </table>
            </div>
        }
            .into_any()
    }
}

#[component]
fn MonthlyBars(buckets: Vec<MonthBucket>) -> impl IntoView {
    let peak = buckets.iter().map(|b| b.total).fold(0.0_f64, f64::max);

    view! {
        <div class="bar-chart">
            {buckets
                .into_iter()
                .map(|bucket| {
                    let height = if peak > 0.0 { bucket.total / peak * 100.0 } else { 0.0 };
                    view! {
                        <div class="bar-column" title=format!("{} donations", bucket.count)>
                            <div class="bar" style=format!("height: {height:.1}%")></div>
                            <span class="bar-value">{format_amount(bucket.total)}</span>
                            <span class="bar-label">{bucket.label}</span>
                        </div>
                    }
                })
                .collect_view()}
        </div>
    }
}

#[component]
fn ManageUsers() -> impl IntoView {
    let data = use_data();
    let toasts = use_toasts();
    let me = use_email();
    let users = use_query::<Vec<User>, _>(|| Some(queries::users()));
    let (search, setSearch) = signal(String::new());
    let (roleFilter, setRoleFilter) = signal(None::<Role>);

    let changeRole = {
        let data = data.clone();
        move |user: User, role: Role| {
            let data = data.clone();
            spawn(async move {
                let result = data.update_user_role(&user.id, role).await;
                toasts.report(&result, &format!("{} is now {}", user.email, role.label()));
            });
        }
    };

    let remove = move |user: User| {
        let data = data.clone();
        spawn(async move {
            let result = data.delete_user(&user.id).await;
            toasts.report(&result, &format!("Removed {}", user.email));
        });
    };

    let table = move || {
        let result = users.get();
        let Some(all) = result.data else {
            return unavailable("users", result.error);
        };
        let list: Vec<User> = search.with(|needle| {
            stats::filter_users(&all, needle, roleFilter.get())
                .into_iter()
                .cloned()
                .collect()
        });
        if list.is_empty() {
            return view! { <p class="empty">"No users match."</p> }.into_any();
        }
        let myEmail = me.get();
        view! {
            <table class="table">
                <thead>
                    <tr>
                        <th>"Name"</th>
                        <th>"Email"</th>
                        <th>"Role"</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    {list
                        .into_iter()
                        .map(|user| {
                            let isSelf = myEmail
                                .as_deref()
                                .is_some_and(|e| e.eq_ignore_ascii_case(&user.email));
                            let current = user.role;
                            let forRole = user.clone();
                            let forDelete = user.clone();
                            let changeRole = changeRole.clone();
                            let remove = remove.clone();
                            view! {
                                <tr>
                                    <td>{user.name}</td>
                                    <td>{user.email}</td>
                                    <td>
                                        <select
                                            disabled=isSelf
                                            on:change=move |ev| {
                                                if let Ok(role) = event_target_value(&ev).parse::<Role>() {
                                                    changeRole(forRole.clone(), role);
                                                }
                                            }
                                        >
                                            {current
                                                .is_none()
                                                .then(|| view! { <option value="" selected>"(none)"</option> })}
                                            {Role::ALL
                                                .into_iter()
                                                .map(|role| {
                                                    view! {
                                                        <option value=role.as_str() selected={current == Some(role)}>
                                                            {role.label()}
                                                        </option>
                                                    }
                                                })
                                                .collect_view()}
                                        </select>
                                    </td>
                                    <td>
                                        <button
                                            class="btn btn-ghost btn-sm"
                                            disabled=isSelf
                                            on:click=move |_| remove(forDelete.clone())
                                        >
                                            "Delete"
                                        </button>
                                    </td>
                                </tr>
                            }
                        })
                        .collect_view()}
                </tbody>
            </table>
        }
            .into_any()
    };

    view! {
        <div class="filter-bar">
            <input
                type="search"
                placeholder="Search by name or email"
                prop:value=search
                on:input=move |ev| setSearch.set(event_target_value(&ev))
            />
            <select on:change=move |ev| setRoleFilter.set(event_target_value(&ev).parse::<Role>().ok())>
                <option value="">"All roles"</option>
                {Role::ALL
                    .into_iter()
                    .map(|role| view! { <option value=role.as_str()>{role.label()}</option> })
                    .collect_view()}
            </select>
        </div>
        {table}
    }
}

#[component]
fn ManageEvents() -> impl IntoView {
    let data = use_data();
    let toasts = use_toasts();
    let me = use_email();
    let events = use_query::<Vec<Event>, _>(|| Some(queries::events()));

    let (draft, setDraft) = signal(EventDraft::default());
    // Id of the event being edited; `None` while creating.
    let (editing, setEditing) = signal(None::<String>);
    let (search, setSearch) = signal(String::new());

    let reset = move || {
        let _ = setDraft.try_set(EventDraft::default());
        let _ = setEditing.try_set(None);
    };

    let submit = {
        let data = data.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            let mut event = draft.get_untracked();
            if event.title.trim().is_empty() || event.date.trim().is_empty() {
                toasts.push("Title and date are required", ToastLevel::Error);
                return;
            }
            let data = data.clone();
            match editing.get_untracked() {
                Some(id) => spawn(async move {
                    let result = data.update_event(&id, &event).await;
                    if result.is_ok() {
                        reset();
                    }
                    toasts.report(&result, "Event updated");
                }),
                None => {
                    event.created_by = me.get_untracked();
                    event.volunteers = Some(Vec::new());
                    spawn(async move {
                        let result = data.create_event(&event).await;
                        if result.is_ok() {
                            reset();
                        }
                        toasts.report(&result, "Event created");
                    });
                }
            }
        }
    };

    let edit = move |event: Event| {
        setDraft.set(EventDraft::from_event(&event));
        setEditing.set(Some(event.id));
    };

    let remove = move |id: String, title: String| {
        let data = data.clone();
        spawn(async move {
            let result = data.delete_event(&id).await;
            toasts.report(&result, &format!("Deleted \"{title}\""));
        });
    };

    view! {
        <form class="card event-form" on:submit=submit>
            <div class="card-title">
                {move || if editing.with(Option::is_some) { "Edit event" } else { "New event" }}
            </div>
            <input
                placeholder="Title"
                prop:value=move || draft.with(|d| d.title.clone())
                on:input=move |ev| setDraft.update(|d| d.title = event_target_value(&ev))
            />
            <input
                placeholder="Location"
                prop:value=move || draft.with(|d| d.location.clone())
                on:input=move |ev| setDraft.update(|d| d.location = event_target_value(&ev))
            />
            <input
                type="date"
                prop:value=move || draft.with(|d| d.date.clone())
                on:input=move |ev| setDraft.update(|d| d.date = event_target_value(&ev))
            />
            <input
                placeholder="Image URL"
                prop:value=move || draft.with(|d| d.image.clone().unwrap_or_default())
                on:input=move |ev| {
                    let url = event_target_value(&ev);
                    setDraft.update(|d| d.image = (!url.is_empty()).then_some(url));
                }
            />
            <textarea
                placeholder="Description"
                prop:value=move || draft.with(|d| d.description.clone())
                on:input=move |ev| setDraft.update(|d| d.description = event_target_value(&ev))
            ></textarea>
            <button type="submit" class="btn btn-primary">
                {move || if editing.with(Option::is_some) { "Save changes" } else { "Create event" }}
            </button>
            <Show when=move || editing.with(Option::is_some)>
                <button type="button" class="btn btn-ghost" on:click=move |_| reset()>
                    "Cancel"
                </button>
            </Show>
        </form>
        <div class="filter-bar">
            <input
                type="search"
                placeholder="Search by title or location"
                prop:value=search
                on:input=move |ev| setSearch.set(event_target_value(&ev))
            />
        </div>
        {move || {
            let result = events.get();
            let Some(all) = result.data else {
                return unavailable("events", result.error);
            };
            let filter = EventFilter {
                search: search.get(),
                ..EventFilter::default()
            };
            let list: Vec<Event> = stats::filter_events(&all, &filter, Utc::now())
                .into_iter()
                .cloned()
                .collect();
            view! {
                <table class="table">
                    <thead>
                        <tr>
                            <th>"Title"</th>
                            <th>"Date"</th>
                            <th>"Location"</th>
                            <th>"Volunteers"</th>
                            <th></th>
                        </tr>
                    </thead>
                    <tbody>
                        {list
                            .into_iter()
                            .map(|event| {
                                let date = format_event_date(&event);
                                let remove = remove.clone();
                                let (id, title) = (event.id.clone(), event.title.clone());
                                let forEdit = event.clone();
                                view! {
                                    <tr>
                                        <td>
                                            <a href=format!("/events/{}", event.id)>{event.title}</a>
                                        </td>
                                        <td>{date}</td>
                                        <td>{event.location}</td>
                                        <td>{event.volunteers.len()}</td>
                                        <td>
                                            <button
                                                class="btn btn-ghost btn-sm"
                                                on:click=move |_| edit(forEdit.clone())
                                            >
                                                "Edit"
                                            </button>
                                            <button
                                                class="btn btn-ghost btn-sm"
                                                on:click=move |_| remove(id.clone(), title.clone())
                                            >
                                                "Delete"
                                            </button>
                                        </td>
                                    </tr>
                                }
                            })
                            .collect_view()}
                    </tbody>
                </table>
            }
                .into_any()
        }}
    }
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[component]
fn ManageDonations() -> impl IntoView {
    let donations = use_query::<Vec<Donation>, _>(|| Some(queries::donations()));
    let (filter, setFilter) = signal(DonationFilter::default());

    view! {
        <div class="filter-bar">
            <input
                type="search"
                placeholder="Search by donor"
                prop:value=move || filter.with(|f| f.search.clone())
                on:input=move |ev| setFilter.update(|f| f.search = event_target_value(&ev))
            />
            <label>
                "From "
                <input
                    type="date"
                    on:input=move |ev| {
                        let day = parse_day(&event_target_value(&ev));
                        setFilter.update(|f| f.from = day);
                    }
                />
            </label>
            <label>
                "To "
                <input
                    type="date"
                    on:input=move |ev| {
                        let day = parse_day(&event_target_value(&ev));
                        setFilter.update(|f| f.to = day);
                    }
                />
            </label>
        </div>
        {move || {
            let result = donations.get();
            let Some(all) = result.data else {
                return unavailable("donations", result.error);
            };
            let now = Utc::now();
            let shown: Vec<Donation> = filter.with(|f| {
                stats::filter_donations(&all, f).into_iter().cloned().collect()
            });
            view! {
                <div class="stat-row">
                    <StatCard title="Total donations" value=format_amount(stats::total_amount(&all)) />
                    <StatCard title="This month" value=format_amount(stats::month_total(&all, now, 0)) />
                    <StatCard title="Donation count" value=all.len().to_string() />
                    <StatCard title="Average donation" value=format_amount(stats::average_amount(&all)) />
                </div>
                <div class="card">
                    <div class="card-title">{format!("Showing {} of {}", shown.len(), all.len())}</div>
                    <table class="table">
                        <thead>
                            <tr>
                                <th>"Donor"</th>
                                <th>"Amount"</th>
                                <th>"Message"</th>
                                <th>"Date"</th>
                                <th>"Status"</th>
                            </tr>
                        </thead>
                        <tbody>
                            {shown
                                .into_iter()
                                .map(|d| {
                                    let date = d
                                        .donated_at()
                                        .map(|t| t.format("%b %-d, %Y, %-I:%M %p").to_string())
                                        .unwrap_or_else(|| "N/A".to_string());
                                    let donor = if d.donor_email.is_empty() {
                                        "Anonymous".to_string()
                                    } else {
                                        d.donor_email.clone()
                                    };
                                    view! {
                                        <tr>
                                            <td>{donor}</td>
                                            <td>{format_amount(d.amount)}</td>
                                            <td>{d.message.unwrap_or_else(|| "-".to_string())}</td>
                                            <td>{date}</td>
                                            <td>{d.status.label()}</td>
                                        </tr>
                                    }
                                })
                                .collect_view()}
                        </tbody>
                    </table>
                </div>
            }
                .into_any()
        }}
    }
}
