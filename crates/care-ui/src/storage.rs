use care_client::session::TokenStore;
use care_types::AuthToken;

const TOKEN_KEY: &str = "planetcare.session_token";

/// Session token kept in the browser's `localStorage`, so a reload or a
/// direct visit to a protected page stays signed in. Server rendering has
/// no storage and sees no token.
pub struct BrowserTokens;

#[cfg(feature = "hydrate")]
mod local_storage {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(catch, js_namespace = localStorage, js_name = getItem)]
        pub fn get_item(key: &str) -> Result<Option<String>, JsValue>;

        #[wasm_bindgen(catch, js_namespace = localStorage, js_name = setItem)]
        pub fn set_item(key: &str, value: &str) -> Result<(), JsValue>;

        #[wasm_bindgen(catch, js_namespace = localStorage, js_name = removeItem)]
        pub fn remove_item(key: &str) -> Result<(), JsValue>;
    }
}

#[cfg(feature = "hydrate")]
impl TokenStore for BrowserTokens {
    fn load(&self) -> Option<AuthToken> {
        match local_storage::get_item(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(AuthToken),
            Err(e) => {
                leptos::logging::warn!("session token unavailable: {e:?}");
                None
            }
        }
    }

    fn save(&self, token: &AuthToken) {
        if let Err(e) = local_storage::set_item(TOKEN_KEY, &token.0) {
            leptos::logging::warn!("could not persist session token: {e:?}");
        }
    }

    fn clear(&self) {
        if let Err(e) = local_storage::remove_item(TOKEN_KEY) {
            leptos::logging::warn!("could not forget session token: {e:?}");
        }
    }
}

#[cfg(not(feature = "hydrate"))]
impl TokenStore for BrowserTokens {
    fn load(&self) -> Option<AuthToken> {
        None
    }

    fn save(&self, _token: &AuthToken) {}

    fn clear(&self) {}
}
