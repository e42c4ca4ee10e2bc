use care_client::{ApiError, ApiResult};
use leptos::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

impl ToastLevel {
    fn class(&self) -> &'static str {
        match self {
            ToastLevel::Success => "toast toast-success",
            ToastLevel::Error => "toast toast-error",
            ToastLevel::Info => "toast toast-info",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub level: ToastLevel,
}

/// Handle for raising toasts from anywhere under [`ToastProvider`].
#[derive(Clone, Copy)]
pub struct Toasts {
    items: RwSignal<Vec<Toast>>,
    next_id: StoredValue<u64>,
}

impl Toasts {
    pub fn push(&self, message: impl Into<String>, level: ToastLevel) {
        let id = self.next_id.get_value();
        self.next_id.set_value(id + 1);
        self.items.update(|items| {
            items.push(Toast {
                id,
                message: message.into(),
                level,
            })
        });

        let items = self.items;
        set_timeout(
            move || {
                let _ = items.try_update(|items| items.retain(|t| t.id != id));
            },
            std::time::Duration::from_secs(4),
        );
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(message, ToastLevel::Success);
    }

    pub fn error(&self, error: &ApiError) {
        self.push(error.user_message(), ToastLevel::Error);
    }

    /// Reports a mutation outcome; failures show the backend's message.
    pub fn report<T>(&self, result: &ApiResult<T>, success: &str) {
        match result {
            Ok(_) => self.success(success),
            Err(error) => self.error(error),
        }
    }

    fn dismiss(&self, id: u64) {
        self.items.update(|items| items.retain(|t| t.id != id));
    }
}

pub fn use_toasts() -> Toasts {
    expect_context::<Toasts>()
}

#[component]
pub fn ToastProvider(children: Children) -> impl IntoView {
    let toasts = Toasts {
        items: RwSignal::new(Vec::new()),
        next_id: StoredValue::new(0),
    };
    provide_context(toasts);

    view! {
        {children()}
        <div class="toast-container">
            <For each=move || toasts.items.get() key=|toast| toast.id let:toast>
                <div class=toast.level.class() on:click=move |_| toasts.dismiss(toast.id)>
                    {toast.message.clone()}
                </div>
            </For>
        </div>
    }
}
