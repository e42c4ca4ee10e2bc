#![allow(non_snake_case)]

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod session;
pub mod stats;

pub use api::{keys, queries, DataClient, Query};
pub use cache::{QueryClient, QueryResult, QueryState, QueryStatus, ReadOptions, Subscription};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use gate::{evaluate, GateDecision, RouteAccess};
pub use http::{Access, ApiClient};
pub use session::{
    Authenticator, MemoryTokens, Provider, RestAuthenticator, SessionState, SessionStore, SignedIn,
    TokenStore,
};
