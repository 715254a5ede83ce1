//! Typed operations over the booking backend.
//!
//! Cache policy is decided per endpoint here: static catalog reads (cities,
//! articles, packages, experiences, hotel tiers) go through the response
//! cache; search and pricing must never be stale, and mutations bypass the
//! cache by construction.

use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::client::{ApiClient, RequestOptions};
use crate::errors::ApiError;
use crate::types::{
    Article, BookingRequest, BookingResponse, City, Experience, HotelTier, Package,
    PriceBreakdown, PriceSelection, SearchOptions, SearchResponse,
};

impl ApiClient {
    pub async fn cities(&self) -> Result<Vec<City>, ApiError> {
        self.get_list("/cities/").await
    }

    pub async fn city(&self, id: u64) -> Result<City, ApiError> {
        self.get(&format!("/cities/{id}/")).await
    }

    pub async fn articles(&self) -> Result<Vec<Article>, ApiError> {
        self.get_list("/articles/").await
    }

    pub async fn articles_by_city(&self, city_id: u64) -> Result<Vec<Article>, ApiError> {
        self.get_list(&format!("/articles/?city={city_id}")).await
    }

    pub async fn packages(&self) -> Result<Vec<Package>, ApiError> {
        self.get_list("/packages/packages/").await
    }

    pub async fn packages_by_city(&self, city_id: u64) -> Result<Vec<Package>, ApiError> {
        self.get_list(&format!("/packages/packages/?city={city_id}"))
            .await
    }

    pub async fn package(&self, slug: &str) -> Result<Package, ApiError> {
        self.get(&format!(
            "/packages/packages/{}/",
            urlencoding::encode(slug)
        ))
        .await
    }

    pub async fn experiences(&self) -> Result<Vec<Experience>, ApiError> {
        self.get_list("/packages/experiences/").await
    }

    pub async fn experiences_by_city(&self, city_id: u64) -> Result<Vec<Experience>, ApiError> {
        self.get_list(&format!("/packages/experiences/?city={city_id}"))
            .await
    }

    pub async fn hotel_tiers(&self) -> Result<Vec<HotelTier>, ApiError> {
        self.get_list("/packages/hotel-tiers/").await
    }

    pub async fn hotel_tiers_by_city(&self, city_id: u64) -> Result<Vec<HotelTier>, ApiError> {
        self.get_list(&format!("/packages/hotel-tiers/?city={city_id}"))
            .await
    }

    /// Universal search. Always fresh: suggestions racing a stale cache are
    /// worse than the extra round trip.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, ApiError> {
        let mut endpoint = format!("/search/?q={}", urlencoding::encode(query));
        if !options.categories.is_empty() {
            let categories: Vec<&str> = options.categories.iter().map(|c| c.as_str()).collect();
            endpoint.push_str(&format!("&categories={}", categories.join(",")));
        }
        if let Some(limit) = options.limit {
            endpoint.push_str(&format!("&limit={limit}"));
        }
        self.get_fresh(&endpoint).await
    }

    /// Server-side price breakdown for a package configuration. Never
    /// cached; prices must reflect the backend's current rules.
    pub async fn calculate_price(
        &self,
        selection: &PriceSelection,
    ) -> Result<PriceBreakdown, ApiError> {
        self.post("/packages/calculate-price/", json!(selection))
            .await
    }

    /// Create a booking. Sends an `Idempotency-Key` header so a retried or
    /// double-submitted request cannot double-book; pass `None` to have one
    /// generated.
    pub async fn create_booking(
        &self,
        booking: &BookingRequest,
        idempotency_key: Option<String>,
    ) -> Result<BookingResponse, ApiError> {
        let key = idempotency_key.unwrap_or_else(|| Uuid::new_v4().to_string());
        self.request(
            "/bookings/",
            RequestOptions::post(json!(booking)).with_idempotency_key(key),
        )
        .await
    }

    pub async fn booking(&self, reference: &str) -> Result<BookingResponse, ApiError> {
        // Booking state changes server-side (payment, confirmation); always
        // read it fresh.
        self.get_fresh(&format!("/bookings/{}/", urlencoding::encode(reference)))
            .await
    }

    async fn get_list<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>, ApiError> {
        let page: crate::types::Paginated<T> = self.get(endpoint).await?;
        Ok(page.results)
    }
}
