use serde::{Deserialize, Serialize};

/// Search and social metadata attached to posts, products, and pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoData {
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub canonical_url: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    /// JSON-LD block embedded in the page head.
    pub structured_data: Option<serde_json::Value>,
    pub no_index: bool,
}
