use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::serde::rfc3339;
use uuid::Uuid;

use crate::domain::types::{OrderStatus, SocialPlatform};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryListQuery {
    pub include_empty: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(with = "rfc3339")]
    pub scheduled_for: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub platform: SocialPlatform,
}

#[derive(Debug, Deserialize)]
pub struct BreadcrumbQuery {
    pub path: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegalListQuery {
    pub jurisdiction: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ImagePromptsRequest {
    pub description: String,
    #[serde(default = "default_prompt_count")]
    pub count: usize,
}

fn default_prompt_count() -> usize {
    3
}

#[derive(Debug, Serialize)]
pub struct ImagePromptsResponse {
    pub prompts: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeoCopyRequest {
    pub subject: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestListQuery {
    pub user_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordsRequest {
    pub text: String,
    #[serde(default)]
    pub seed: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct KeywordsResponse {
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRequest {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaResponse {
    pub meta_title: String,
    pub meta_description: Option<String>,
}
