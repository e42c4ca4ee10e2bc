use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.into(),
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Backend address baked in at build time through `CARE_API_URL`.
    pub fn from_build_env() -> Self {
        Self::new(option_env!("CARE_API_URL").unwrap_or(DEFAULT_API_URL))
    }
}
