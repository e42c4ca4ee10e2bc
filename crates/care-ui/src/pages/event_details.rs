use care_client::queries;
use care_types::{Comment, Event, NewComment};
use leptos::prelude::*;
use leptos_router::hooks::use_params_map;

use crate::components::status::{unavailable, ErrorNote, Loading};
use crate::components::toast::use_toasts;
use crate::hooks::{spawn, use_data, use_email, use_query, use_session};
use crate::pages::events::format_event_date;

#[component]
pub fn EventDetailsPage() -> impl IntoView {
    let params = use_params_map();
    let eventId = move || params.with(|p| p.get("id"));

    let event = use_query::<Event, _>(move || eventId().map(|id| queries::event(&id)));

    view! {
        {move || {
            let result = event.get();
            match (result.data, result.error) {
                (Some(event), _) => view! { <EventDetails event=event /> }.into_any(),
                (None, Some(error)) => {
                    view! { <ErrorNote what="this event" error=Some(error) /> }.into_any()
                }
                (None, None) => view! { <Loading label="Loading event..." /> }.into_any(),
            }
        }}
    }
}

#[component]
fn EventDetails(event: Event) -> impl IntoView {
    let data = use_data();
    let toasts = use_toasts();
    let email = use_email();
    let (busy, setBusy) = signal(false);

    let date = format_event_date(&event);
    let eventId = event.id.clone();
    let volunteers = event.volunteers.clone();
    let isVolunteer = move || {
        email
            .get()
            .is_some_and(|e| volunteers.iter().any(|v| v.eq_ignore_ascii_case(&e)))
    };

    let toggle = {
        let eventId = eventId.clone();
        let isVolunteer = isVolunteer.clone();
        move |_: leptos::ev::MouseEvent| {
            let Some(address) = email.get_untracked() else {
                return;
            };
            let joining = !isVolunteer();
            let data = data.clone();
            let eventId = eventId.clone();
            setBusy.set(true);
            spawn(async move {
                if joining {
                    let result = data.volunteer(&eventId, &address).await;
                    toasts.report(&result, "You're signed up. See you there!");
                } else {
                    let result = data.withdraw(&eventId, &address).await;
                    toasts.report(&result, "You've withdrawn from this event");
                }
                let _ = setBusy.try_set(false);
            });
        }
    };

    let loginHref = format!("/login?from=/events/{eventId}");

    view! {
        <article class="event-details">
            {event.image.map(|src| view! { <img class="event-hero" src=src alt="" /> })}
            <h1>{event.title}</h1>
            <div class="event-meta">
                <span>{date}</span>
                <span>{event.location}</span>
                <span>{format!("{} volunteers", event.volunteers.len())}</span>
            </div>
            <p class="event-description">{event.description}</p>
            <Show
                when=move || email.with(Option::is_some)
                fallback=move || {
                    view! {
                        <a href=loginHref.clone() class="btn btn-primary">"Log in to volunteer"</a>
                    }
                }
            >
                <button
                    class="btn btn-primary"
                    disabled=move || busy.get()
                    on:click=toggle.clone()
                >
                    {
                        let isVolunteer = isVolunteer.clone();
                        move || if isVolunteer() { "Withdraw" } else { "Volunteer" }
                    }
                </button>
            </Show>
        </article>
        <Comments event_id=eventId />
    }
}

#[component]
fn Comments(event_id: String) -> impl IntoView {
    let data = use_data();
    let toasts = use_toasts();
    let session = use_session();
    let email = use_email();

    let commentsKey = event_id.clone();
    let comments =
        use_query::<Vec<Comment>, _>(move || Some(queries::comments(&commentsKey)));
    let (draft, setDraft) = signal(String::new());

    let submit = {
        let data = data.clone();
        let eventId = event_id.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            let content = draft.get_untracked().trim().to_string();
            let Some(identity) = session.with_untracked(|s| s.identity.clone()) else {
                return;
            };
            if content.is_empty() {
                return;
            }
            let comment = NewComment {
                event_id: eventId.clone(),
                user_email: identity.email.clone(),
                user_name: identity.name_or_handle(),
                user_photo: identity.photo_url.clone(),
                content,
            };
            let data = data.clone();
            spawn(async move {
                let result = data.add_comment(&comment).await;
                if result.is_ok() {
                    let _ = setDraft.try_set(String::new());
                }
                toasts.report(&result, "Comment posted");
            });
        }
    };

    let remove = move |comment: Comment| {
        let Some(address) = email.get_untracked() else {
            return;
        };
        let data = data.clone();
        spawn(async move {
            let result = data
                .delete_comment(&comment.id, &comment.event_id, &address)
                .await;
            toasts.report(&result, "Comment deleted");
        });
    };

    view! {
        <section class="comments">
            <h2>"Comments"</h2>
            <Show when=move || email.with(Option::is_some)>
                <form class="comment-form" on:submit=submit.clone()>
                    <textarea
                        placeholder="Share your thoughts"
                        prop:value=draft
                        on:input=move |ev| setDraft.set(event_target_value(&ev))
                    ></textarea>
                    <button type="submit" class="btn btn-primary btn-sm">"Post"</button>
                </form>
            </Show>
            {move || {
                let result = comments.get();
                let Some(list) = result.data else {
                    return unavailable("comments", result.error);
                };
                if list.is_empty() {
                    return view! { <p class="empty">"No comments yet."</p> }.into_any();
                }
                let me = email.get();
                list.into_iter()
                    .map(|comment| {
                        let mine = me
                            .as_deref()
                            .is_some_and(|m| m.eq_ignore_ascii_case(&comment.user_email));
                        let remove = remove.clone();
                        let target = comment.clone();
                        view! {
                            <div class="comment">
                                <div class="comment-author">
                                    <strong>{comment.user_name}</strong>
                                    <span class="comment-date">{comment.created_at}</span>
                                </div>
                                <p>{comment.content}</p>
                                {mine.then(|| view! {
                                    <button
                                        class="btn btn-ghost btn-sm"
                                        on:click=move |_| remove(target.clone())
                                    >
                                        "Delete"
                                    </button>
                                })}
                            </div>
                        }
                    })
                    .collect_view()
                    .into_any()
            }}
        </section>
    }
}
