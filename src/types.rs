//! Wire types for the travel-booking backend.

use serde::{Deserialize, Serialize};

/// Standard pagination envelope every list endpoint responds with; callers
/// only ever see the unwrapped `results`.
#[derive(Clone, Debug, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct City {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hero_image: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub author: String,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Experience {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HotelTier {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_multiplier: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TransportOption {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Package {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub city_name: String,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub hotel_tiers: Vec<HotelTier>,
    #[serde(default)]
    pub transport_options: Vec<TransportOption>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchCategory {
    Packages,
    Cities,
    Articles,
    Experiences,
}

impl SearchCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchCategory::Packages => "packages",
            SearchCategory::Cities => "cities",
            SearchCategory::Articles => "articles",
            SearchCategory::Experiences => "experiences",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SearchOptions {
    pub categories: Vec<SearchCategory>,
    pub limit: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub slug: String,
    pub url: String,
    pub relevance_score: f64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchBuckets {
    #[serde(default)]
    pub packages: Vec<SearchResult>,
    #[serde(default)]
    pub cities: Vec<SearchResult>,
    #[serde(default)]
    pub articles: Vec<SearchResult>,
    #[serde(default)]
    pub experiences: Vec<SearchResult>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: SearchBuckets,
    pub total_count: u64,
    #[serde(default)]
    pub search_time_ms: f64,
}

/// The caller's package configuration, priced server-side; the client never
/// re-implements the breakdown rules.
#[derive(Clone, Debug, Serialize)]
pub struct PriceSelection {
    pub package_id: u64,
    pub experience_ids: Vec<u64>,
    pub hotel_tier_id: u64,
    pub transport_option_id: u64,
    pub num_travelers: u32,
    pub booking_date: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub experiences_total: f64,
    pub hotel_multiplier: f64,
    pub transport_total: f64,
    pub total_price: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct BookingRequest {
    pub package_id: u64,
    pub experience_ids: Vec<u64>,
    pub hotel_tier_id: u64,
    pub transport_option_id: u64,
    pub booking_date: String,
    pub num_travelers: u32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BookingResponse {
    pub id: u64,
    pub booking_reference: String,
    pub status: BookingStatus,
    pub total_price: String,
    #[serde(default)]
    pub payment_url: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    pub is_active: bool,
}

/// Issued by login, registration, and guest checkout alike.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub access: String,
    pub refresh: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct GuestCheckoutData {
    pub email: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub phone: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegisterData {
    pub email: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub phone: String,
    pub password: String,
    pub password_confirm: String,
}
