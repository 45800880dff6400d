//! HTTP API client.
//!
//! One `ApiClient` instance is built per call site from the session
//! store; bearer-token attachment happens in [`ApiClient::apply_auth`]
//! and nowhere else. Verb helpers return `ApiError` with the raw
//! response body preserved so callers can run message extraction on it.

use motorbay_shared::{
    AddWorkerRequest, ApiError, AuthResponse, CarListing, CarSearchQuery, ChatMessage, Comment,
    ConversationSummary, CreateCarRequest, CreateCommentRequest, CreateDealershipRequest,
    Dealership, DealershipStats, DealershipWorker, Favourite, Friend, FriendRequest,
    GeocodeResult, LoginRequest, PagedResponse, RefreshRequest, RegisterRequest,
    SendFriendRequestRequest, UpdateCarRequest, UpdateDealershipRequest, UserProfile,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// JSON-over-HTTPS client for the motorbay API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    bearer: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            bearer: None,
        }
    }

    /// Attach (or detach) the bearer token used for every request.
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    fn url(&self, path: &str) -> String {
        crate::config::join_url(&self.base_url, path)
    }

    fn apply_auth(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.bearer {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    /// Send a request, returning the body text of a 2xx response.
    async fn execute(&self, rb: RequestBuilder) -> Result<String, ApiError> {
        let resp = self
            .apply_auth(rb)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let is_success = resp.status().is_success();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        if !is_success {
            return Err(ApiError::Http { status, body: text });
        }
        Ok(text)
    }

    fn parse<TRes: DeserializeOwned>(text: &str) -> Result<TRes, ApiError> {
        // Mutating endpoints may answer 204 with no body.
        let text = if text.is_empty() { "null" } else { text };
        serde_json::from_str(text).map_err(|e| ApiError::Deserialize(e.to_string()))
    }

    /// GET a JSON resource.
    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        let text = self.execute(self.client.get(self.url(path))).await?;
        Self::parse(&text)
    }

    /// POST a JSON body, expecting a JSON response.
    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let text = self
            .execute(self.client.post(self.url(path)).json(body))
            .await?;
        Self::parse(&text)
    }

    /// PUT a JSON body, expecting a JSON response.
    pub async fn put_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let text = self
            .execute(self.client.put(self.url(path)).json(body))
            .await?;
        Self::parse(&text)
    }

    /// PATCH a JSON body, expecting a JSON response.
    pub async fn patch_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        let text = self
            .execute(self.client.patch(self.url(path)).json(body))
            .await?;
        Self::parse(&text)
    }

    /// DELETE a resource.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.client.delete(self.url(path))).await?;
        Ok(())
    }

    // --- Auth ---

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post_json("/api/auth/login", req).await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.post_json("/api/auth/register", req).await
    }

    pub async fn refresh(&self, req: &RefreshRequest) -> Result<AuthResponse, ApiError> {
        self.post_json("/api/auth/refresh", req).await
    }

    // --- Cars ---

    pub async fn search_cars(
        &self,
        query: &CarSearchQuery,
    ) -> Result<PagedResponse<CarListing>, ApiError> {
        self.post_json("/api/cars/search", query).await
    }

    pub async fn get_car(&self, id: &str) -> Result<CarListing, ApiError> {
        self.get_json(&format!("/api/cars/{id}")).await
    }

    pub async fn create_car(&self, req: &CreateCarRequest) -> Result<CarListing, ApiError> {
        self.post_json("/api/cars", req).await
    }

    pub async fn update_car(
        &self,
        id: &str,
        req: &UpdateCarRequest,
    ) -> Result<CarListing, ApiError> {
        self.patch_json(&format!("/api/cars/{id}"), req).await
    }

    pub async fn delete_car(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/cars/{id}")).await
    }

    // --- Comments ---

    pub async fn list_comments(&self, car_id: &str) -> Result<Vec<Comment>, ApiError> {
        self.get_json(&format!("/api/cars/{car_id}/comments")).await
    }

    pub async fn add_comment(
        &self,
        car_id: &str,
        req: &CreateCommentRequest,
    ) -> Result<Comment, ApiError> {
        self.post_json(&format!("/api/cars/{car_id}/comments"), req)
            .await
    }

    pub async fn delete_comment(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/comments/{id}")).await
    }

    // --- Favourites ---

    pub async fn list_favourites(&self) -> Result<Vec<CarListing>, ApiError> {
        self.get_json("/api/favourites").await
    }

    pub async fn add_favourite(&self, car_id: &str) -> Result<Favourite, ApiError> {
        self.post_json(&format!("/api/favourites/{car_id}"), &()).await
    }

    pub async fn remove_favourite(&self, car_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/favourites/{car_id}")).await
    }

    // --- Friends ---

    pub async fn list_friends(&self) -> Result<Vec<Friend>, ApiError> {
        self.get_json("/api/friends").await
    }

    /// Every pending request where the caller is requester or addressee.
    pub async fn list_friend_requests(&self) -> Result<Vec<FriendRequest>, ApiError> {
        self.get_json("/api/friends/requests").await
    }

    pub async fn send_friend_request(
        &self,
        req: &SendFriendRequestRequest,
    ) -> Result<FriendRequest, ApiError> {
        self.post_json("/api/friends/requests", req).await
    }

    pub async fn accept_friend_request(&self, id: &str) -> Result<FriendRequest, ApiError> {
        self.post_json(&format!("/api/friends/requests/{id}/accept"), &())
            .await
    }

    pub async fn reject_friend_request(&self, id: &str) -> Result<FriendRequest, ApiError> {
        self.post_json(&format!("/api/friends/requests/{id}/reject"), &())
            .await
    }

    /// Cancellation deletes a pending request outright.
    pub async fn cancel_friend_request(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/friends/requests/{id}")).await
    }

    pub async fn remove_friend(&self, user_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/friends/{user_id}")).await
    }

    // --- Chat ---

    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        self.get_json("/api/chat/conversations").await
    }

    pub async fn chat_history(&self, user_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        self.get_json(&format!("/api/chat/history/{user_id}")).await
    }

    // --- Dealerships ---

    pub async fn get_dealership(&self, id: &str) -> Result<Dealership, ApiError> {
        self.get_json(&format!("/api/dealerships/{id}")).await
    }

    pub async fn my_dealership(&self) -> Result<Dealership, ApiError> {
        self.get_json("/api/dealerships/mine").await
    }

    pub async fn create_dealership(
        &self,
        req: &CreateDealershipRequest,
    ) -> Result<Dealership, ApiError> {
        self.post_json("/api/dealerships", req).await
    }

    pub async fn update_dealership(
        &self,
        id: &str,
        req: &UpdateDealershipRequest,
    ) -> Result<Dealership, ApiError> {
        self.patch_json(&format!("/api/dealerships/{id}"), req).await
    }

    pub async fn list_workers(&self, id: &str) -> Result<Vec<DealershipWorker>, ApiError> {
        self.get_json(&format!("/api/dealerships/{id}/workers")).await
    }

    pub async fn add_worker(
        &self,
        id: &str,
        req: &AddWorkerRequest,
    ) -> Result<DealershipWorker, ApiError> {
        self.post_json(&format!("/api/dealerships/{id}/workers"), req)
            .await
    }

    pub async fn remove_worker(&self, id: &str, user_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/dealerships/{id}/workers/{user_id}"))
            .await
    }

    pub async fn dealership_stats(&self, id: &str) -> Result<DealershipStats, ApiError> {
        self.get_json(&format!("/api/dealerships/{id}/stats")).await
    }

    // --- Admin ---

    pub async fn admin_list_users(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResponse<UserProfile>, ApiError> {
        self.get_json(&format!("/api/admin/users?page={page}&pageSize={page_size}"))
            .await
    }

    /// Exchange an admin session for a token bundle acting as `user_id`.
    pub async fn admin_impersonate(&self, user_id: &str) -> Result<AuthResponse, ApiError> {
        self.post_json(&format!("/api/admin/users/{user_id}/impersonate"), &())
            .await
    }

    // --- Geocoding ---

    pub async fn geocode(&self, query: &str) -> Result<Vec<GeocodeResult>, ApiError> {
        self.get_json(&format!("/api/geocode?q={}", urlencoding::encode(query)))
            .await
    }
}
