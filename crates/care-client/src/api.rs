//! Typed PlanetCare endpoints on top of [`ApiClient`] and [`QueryClient`].
//!
//! Reads are described by [`Query`] values so the UI can subscribe to the
//! key and trigger the fetch separately. Every mutation declares the keys
//! it invalidates.

use care_types::{
    Comment, Donation, DonorWallEntry, Event, EventDraft, LeaderboardEntry, NewComment,
    NewDonation, NewUser, QueryKey, Role, RoleResponse, User,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::cache::{QueryClient, QueryResult, QueryState, ReadOptions};
use crate::error::ApiResult;
use crate::http::{Access, ApiClient};

pub mod keys {
    use care_types::QueryKey;

    pub fn events() -> QueryKey {
        QueryKey::new("events")
    }

    pub fn event(id: &str) -> QueryKey {
        events().with(id)
    }

    pub fn leaderboard() -> QueryKey {
        QueryKey::new("leaderboard")
    }

    pub fn my_events(email: &str) -> QueryKey {
        QueryKey::new("myEvents").with(email)
    }

    pub fn comments(event_id: &str) -> QueryKey {
        QueryKey::new("comments").with(event_id)
    }

    pub fn donations() -> QueryKey {
        QueryKey::new("donations")
    }

    pub fn my_donations(email: &str) -> QueryKey {
        QueryKey::new("myDonations").with(email)
    }

    pub fn donor_wall() -> QueryKey {
        QueryKey::new("donorWall")
    }

    pub fn users() -> QueryKey {
        QueryKey::new("users")
    }

    pub fn user_role(email: &str) -> QueryKey {
        QueryKey::new("userRole").with(email)
    }
}

/// A cacheable GET: where it lives in the cache and where it lives on the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub key: QueryKey,
    pub path: Vec<String>,
    pub access: Access,
}

impl Query {
    fn new(key: QueryKey, path: &[&str], access: Access) -> Self {
        Self {
            key,
            path: path.iter().map(|s| s.to_string()).collect(),
            access,
        }
    }
}

pub mod queries {
    use super::{keys, Query};
    use crate::http::Access;

    pub fn events() -> Query {
        Query::new(keys::events(), &["events"], Access::Public)
    }

    pub fn event(id: &str) -> Query {
        Query::new(keys::event(id), &["events", id], Access::Public)
    }

    pub fn leaderboard() -> Query {
        Query::new(keys::leaderboard(), &["events", "leaderboard", "top"], Access::Public)
    }

    pub fn my_events(email: &str) -> Query {
        Query::new(keys::my_events(email), &["events", "volunteered", email], Access::Secure)
    }

    pub fn comments(event_id: &str) -> Query {
        Query::new(keys::comments(event_id), &["comments", event_id], Access::Public)
    }

    pub fn donations() -> Query {
        Query::new(keys::donations(), &["donations"], Access::Secure)
    }

    pub fn my_donations(email: &str) -> Query {
        Query::new(keys::my_donations(email), &["donations", "my", email], Access::Secure)
    }

    pub fn donor_wall() -> Query {
        Query::new(keys::donor_wall(), &["donations", "public", "wall"], Access::Public)
    }

    pub fn users() -> Query {
        Query::new(keys::users(), &["users"], Access::Secure)
    }

    pub fn user_role(email: &str) -> Query {
        Query::new(keys::user_role(email), &["users", "role", email], Access::Secure)
    }
}

/// The remote data client handed to views: one HTTP client, one cache.
#[derive(Clone)]
pub struct DataClient {
    api: ApiClient,
    cache: QueryClient,
}

impl DataClient {
    pub fn new(api: ApiClient, cache: QueryClient) -> Self {
        Self { api, cache }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryClient {
        &self.cache
    }

    pub async fn read(&self, query: &Query, options: ReadOptions) -> QueryState {
        let api = self.api.clone();
        let path = query.path.clone();
        let access = query.access;
        self.cache
            .read(&query.key, move || async move { api.get(path.as_slice(), access).await }, options)
            .await
    }

    pub async fn refetch(&self, query: &Query) -> QueryState {
        let options = ReadOptions {
            enabled: true,
            force: true,
        };
        self.read(query, options).await
    }

    /// Typed read. `None` keeps the query disabled, e.g. while the user's email is unknown.
    pub async fn fetch<T: DeserializeOwned>(&self, query: Option<Query>) -> QueryResult<T> {
        match query {
            Some(query) => self.read(&query, ReadOptions::default()).await.decode(),
            None => QueryResult::idle(),
        }
    }

    pub async fn events(&self) -> QueryResult<Vec<Event>> {
        self.fetch(Some(queries::events())).await
    }

    pub async fn event(&self, id: &str) -> QueryResult<Event> {
        self.fetch(Some(queries::event(id))).await
    }

    pub async fn comments(&self, event_id: &str) -> QueryResult<Vec<Comment>> {
        self.fetch(Some(queries::comments(event_id))).await
    }

    pub async fn leaderboard(&self) -> QueryResult<Vec<LeaderboardEntry>> {
        self.fetch(Some(queries::leaderboard())).await
    }

    pub async fn donor_wall(&self) -> QueryResult<Vec<DonorWallEntry>> {
        self.fetch(Some(queries::donor_wall())).await
    }

    pub async fn donations(&self) -> QueryResult<Vec<Donation>> {
        self.fetch(Some(queries::donations())).await
    }

    pub async fn users(&self) -> QueryResult<Vec<User>> {
        self.fetch(Some(queries::users())).await
    }

    pub async fn my_donations(&self, email: Option<&str>) -> QueryResult<Vec<Donation>> {
        self.fetch(email.map(queries::my_donations)).await
    }

    pub async fn my_events(&self, email: Option<&str>) -> QueryResult<Vec<Event>> {
        self.fetch(email.map(queries::my_events)).await
    }

    pub async fn user_role(&self, email: Option<&str>) -> QueryResult<RoleResponse> {
        self.fetch(email.map(queries::user_role)).await
    }

    pub async fn volunteer(&self, event_id: &str, email: &str) -> ApiResult<Value> {
        let body = json!({ "email": email });
        self.cache
            .write(
                self.api
                    .patch(&["events", "volunteer", event_id], &body, Access::Public),
                &volunteer_invalidations(email),
            )
            .await
    }

    pub async fn withdraw(&self, event_id: &str, email: &str) -> ApiResult<Value> {
        let body = json!({ "email": email });
        self.cache
            .write(
                self.api
                    .patch(&["events", "unvolunteer", event_id], &body, Access::Public),
                &volunteer_invalidations(email),
            )
            .await
    }

    pub async fn add_comment(&self, comment: &NewComment) -> ApiResult<Value> {
        self.cache
            .write(
                self.api.post(&["comments"], comment, Access::Public),
                &[keys::comments(&comment.event_id)],
            )
            .await
    }

    pub async fn delete_comment(
        &self,
        comment_id: &str,
        event_id: &str,
        user_email: &str,
    ) -> ApiResult<()> {
        let body = json!({ "userEmail": user_email });
        self.cache
            .write(
                self.api.delete(&["comments", comment_id], Some(body), Access::Public),
                &[keys::comments(event_id)],
            )
            .await?;
        Ok(())
    }

    pub async fn create_event(&self, draft: &EventDraft) -> ApiResult<Value> {
        self.cache
            .write(
                self.api.post(&["events"], draft, Access::Secure),
                &[keys::events(), keys::leaderboard()],
            )
            .await
    }

    pub async fn update_event(&self, id: &str, draft: &EventDraft) -> ApiResult<Value> {
        self.cache
            .write(
                self.api.patch(&["events", id], draft, Access::Secure),
                &[keys::events()],
            )
            .await
    }

    pub async fn delete_event(&self, id: &str) -> ApiResult<()> {
        self.cache
            .write(
                self.api.delete(&["events", id], None, Access::Secure),
                &[keys::events(), keys::leaderboard(), QueryKey::new("myEvents")],
            )
            .await?;
        Ok(())
    }

    pub async fn donate(&self, donation: &NewDonation) -> ApiResult<Value> {
        self.cache
            .write(
                self.api.post(&["donations"], donation, Access::Secure),
                &[
                    keys::donations(),
                    keys::my_donations(&donation.donor_email),
                    keys::donor_wall(),
                ],
            )
            .await
    }

    pub async fn register_user(&self, user: &NewUser) -> ApiResult<Value> {
        self.cache
            .write(self.api.post(&["users"], user, Access::Public), &[keys::users()])
            .await
    }

    pub async fn update_user_role(&self, user_id: &str, role: Role) -> ApiResult<Value> {
        let body = json!({ "role": role });
        self.cache
            .write(
                self.api.patch(&["users", user_id], &body, Access::Secure),
                &[keys::users(), QueryKey::new("userRole")],
            )
            .await
    }

    pub async fn delete_user(&self, user_id: &str) -> ApiResult<()> {
        self.cache
            .write(
                self.api.delete(&["users", user_id], None, Access::Secure),
                &[keys::users(), QueryKey::new("userRole")],
            )
            .await?;
        Ok(())
    }
}

fn volunteer_invalidations(email: &str) -> [QueryKey; 3] {
    [keys::events(), keys::leaderboard(), keys::my_events(email)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_details_live_under_the_events_prefix() {
        assert!(keys::event("e1").starts_with(&keys::events()));
        assert!(!keys::my_events("a@x.org").starts_with(&keys::events()));
    }

    #[test]
    fn personal_queries_are_secure() {
        assert_eq!(queries::my_donations("a@x.org").access, Access::Secure);
        assert_eq!(queries::user_role("a@x.org").access, Access::Secure);
        assert_eq!(queries::donor_wall().access, Access::Public);
        assert_eq!(
            queries::leaderboard().path,
            vec!["events".to_string(), "leaderboard".into(), "top".into()]
        );
    }
}
