use care_types::NewDonation;
use leptos::prelude::*;

use crate::components::toast::use_toasts;
use crate::hooks::{spawn, use_data, use_session};

const PRESETS: [u32; 4] = [10, 25, 50, 100];

fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a > 0.0)
}

#[component]
pub fn DonatePage() -> impl IntoView {
    let data = use_data();
    let toasts = use_toasts();
    let session = use_session();

    let (amount, setAmount) = signal(String::from("25"));
    let (message, setMessage) = signal(String::new());
    let (invalid, setInvalid) = signal(false);
    let (pending, setPending) = signal(false);

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Some(identity) = session.with_untracked(|s| s.identity.clone()) else {
            return;
        };
        let Some(value) = parse_amount(&amount.get_untracked()) else {
            setInvalid.set(true);
            return;
        };
        setInvalid.set(false);
        setPending.set(true);

        let note = message.get_untracked().trim().to_string();
        let donation = NewDonation {
            donor_email: identity.email.clone(),
            donor_name: Some(identity.name_or_handle()),
            amount: value,
            message: (!note.is_empty()).then_some(note),
        };
        let data = data.clone();
        spawn(async move {
            let result = data.donate(&donation).await;
            if result.is_ok() {
                let _ = setMessage.try_set(String::new());
            }
            toasts.report(&result, "Thank you for your donation!");
            let _ = setPending.try_set(false);
        });
    };

    view! {
        <div class="dashboard-header">
            <h1>"Support PlanetCare"</h1>
            <p class="subtitle">"Every gift funds tools, saplings and cleanup supplies"</p>
        </div>
        <form class="card donate-form" on:submit=submit>
            <div class="preset-row">
                {PRESETS
                    .into_iter()
                    .map(|preset| {
                        view! {
                            <button
                                type="button"
                                class="btn btn-ghost btn-sm"
                                on:click=move |_| setAmount.set(preset.to_string())
                            >
                                {format!("${preset}")}
                            </button>
                        }
                    })
                    .collect_view()}
            </div>
            <div class="form-group">
                <label for="amount">"Amount (USD)"</label>
                <input
                    id="amount"
                    type="number"
                    min="1"
                    step="0.01"
                    prop:value=amount
                    on:input=move |ev| setAmount.set(event_target_value(&ev))
                />
                <Show when=move || invalid.get()>
                    <span class="field-error">"Enter an amount greater than zero"</span>
                </Show>
            </div>
            <div class="form-group">
                <label for="message">"Message (optional)"</label>
                <textarea
                    id="message"
                    prop:value=message
                    on:input=move |ev| setMessage.set(event_target_value(&ev))
                ></textarea>
            </div>
            <button type="submit" class="btn btn-primary" disabled=move || pending.get()>
                "Donate"
            </button>
        </form>
    }
}
