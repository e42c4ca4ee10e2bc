use care_client::queries;
use care_types::LeaderboardEntry;
use leptos::prelude::*;

use crate::components::status::{ErrorNote, Loading};
use crate::hooks::use_query;

fn medal(rank: usize) -> &'static str {
    match rank {
        1 => "\u{1F947}",
        2 => "\u{1F948}",
        3 => "\u{1F949}",
        _ => "",
    }
}

#[component]
pub fn LeaderboardPage() -> impl IntoView {
    let board = use_query::<Vec<LeaderboardEntry>, _>(|| Some(queries::leaderboard()));

    view! {
        <div class="dashboard-header">
            <h1>"Top volunteers"</h1>
            <p class="subtitle">"Ranked by events joined"</p>
        </div>
        {move || {
            let result = board.get();
            let Some(entries) = result.data else {
                return match result.error {
                    Some(error) => {
                        view! { <ErrorNote what="the leaderboard" error=Some(error) /> }.into_any()
                    }
                    None => view! { <Loading label="Loading leaderboard..." /> }.into_any(),
                };
            };
            view! {
                <table class="table leaderboard">
                    <thead>
                        <tr>
                            <th>"#"</th>
                            <th>"Volunteer"</th>
                            <th>"Events"</th>
                        </tr>
                    </thead>
                    <tbody>
                        {entries
                            .into_iter()
                            .enumerate()
                            .map(|(i, entry)| {
                                let rank = i + 1;
                                let name = if entry.name.is_empty() { entry.email } else { entry.name };
                                view! {
                                    <tr>
                                        <td>{format!("{rank} {}", medal(rank))}</td>
                                        <td class="person">
                                            {entry.photo.map(|src| view! { <img class="avatar" src=src alt="" /> })}
                                            {name}
                                        </td>
                                        <td>{entry.event_count}</td>
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
