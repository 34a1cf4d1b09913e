//! Domain entities mirrored from the collection store.
//!
//! Every record serializes with camelCase keys, matching the JSON documents
//! the storefront reads. Cross-entity references (post → category, menu item
//! → page URL, order line → product) are plain ids or slugs.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::serde::rfc3339;
use uuid::Uuid;

use crate::domain::seo::SeoData;
use crate::domain::types::{
    AiContentType, AiRequestStatus, LegalPageType, LinkType, MenuType, OrderStatus, PostStatus,
    SocialPlatform,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub author_id: String,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: PostStatus,
    #[serde(default, with = "rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(default, with = "rfc3339::option")]
    pub scheduled_for: Option<OffsetDateTime>,
    /// Minutes, derived from the content word count.
    pub reading_time: u32,
    #[serde(default)]
    pub table_of_contents: Vec<TocEntry>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub social_shares: SocialShares,
    #[serde(default)]
    pub seo: SeoData,
    #[serde(default)]
    pub featured: bool,
    #[serde(with = "rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl BlogPost {
    /// Timestamp used for newest-first ordering and date-range filters.
    pub fn sort_timestamp(&self) -> OffsetDateTime {
        self.published_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    pub anchor: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialShares {
    pub facebook: u64,
    pub twitter: u64,
    pub linkedin: u64,
    pub pinterest: u64,
    pub email: u64,
}

impl SocialShares {
    pub fn increment(&mut self, platform: SocialPlatform) {
        let counter = match platform {
            SocialPlatform::Facebook => &mut self.facebook,
            SocialPlatform::Twitter => &mut self.twitter,
            SocialPlatform::Linkedin => &mut self.linkedin,
            SocialPlatform::Pinterest => &mut self.pinterest,
            SocialPlatform::Email => &mut self.email,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        self.facebook + self.twitter + self.linkedin + self.pinterest + self.email
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `#rrggbb` hex color used for category badges.
    pub color: String,
    /// Derived on read by counting posts that reference the category.
    #[serde(default)]
    pub post_count: u64,
    #[serde(default)]
    pub order: i32,
    #[serde(with = "rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationMenu {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub menu_type: MenuType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<NavigationItem>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Incremented on every update; checked only when a caller supplies an
    /// expected version.
    pub version: u32,
    #[serde(with = "rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl NavigationMenu {
    /// Total number of items in the tree, children included.
    pub fn item_count(&self) -> usize {
        fn count(items: &[NavigationItem]) -> usize {
            items.iter().map(|item| 1 + count(&item.children)).sum()
        }
        count(&self.items)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationItem {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub label: String,
    pub url: String,
    #[serde(default)]
    pub link_type: LinkType,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub open_in_new_tab: bool,
    #[serde(default)]
    pub children: Vec<NavigationItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalPage {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub page_type: LegalPageType,
    pub title: String,
    pub content: String,
    /// Semantic version string, `major.minor.patch`.
    pub version: String,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub legal_reviewed: bool,
    pub jurisdiction: String,
    #[serde(default)]
    pub applicable_laws: Vec<String>,
    #[serde(default, with = "rfc3339::option")]
    pub effective_date: Option<OffsetDateTime>,
    #[serde(default, with = "rfc3339::option")]
    pub last_reviewed_at: Option<OffsetDateTime>,
    #[serde(default, with = "rfc3339::option")]
    pub next_review_at: Option<OffsetDateTime>,
    #[serde(with = "rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    pub category: String,
    pub species: String,
    pub specifications: ProductSpecifications,
    pub pricing: Pricing,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub seo: SeoData,
    #[serde(with = "rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Product {
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|image| image.is_primary)
            .or_else(|| self.images.first())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductSpecifications {
    pub dimensions: Dimensions,
    pub grade: String,
    #[serde(default)]
    pub moisture_content_percent: Option<f64>,
    #[serde(default)]
    pub density_kg_m3: Option<f64>,
    #[serde(default)]
    pub finish: Option<String>,
    #[serde(default)]
    pub treatment: Option<String>,
    /// EN 350 natural durability class, 1 (very durable) to 5.
    #[serde(default)]
    pub durability_class: Option<u8>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub length_mm: f64,
    pub width_mm: f64,
    pub thickness_mm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricingUnit {
    #[default]
    PerPiece,
    PerLinearMetre,
    PerSquareMetre,
    PerCubicMetre,
}

impl PricingUnit {
    pub fn label(self) -> &'static str {
        match self {
            PricingUnit::PerPiece => "per piece",
            PricingUnit::PerLinearMetre => "per linear metre",
            PricingUnit::PerSquareMetre => "per square metre",
            PricingUnit::PerCubicMetre => "per cubic metre",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub unit: PricingUnit,
    pub base_price: f64,
    pub currency: String,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub tiers: Vec<PriceTier>,
}

impl Pricing {
    /// Unit price for an order of `quantity`: the best matching volume tier,
    /// else the sale price, else the base price.
    pub fn unit_price_for(&self, quantity: u32) -> f64 {
        let list_price = self.sale_price.unwrap_or(self.base_price);
        self.tiers
            .iter()
            .filter(|tier| quantity >= tier.min_quantity)
            .max_by_key(|tier| tier.min_quantity)
            .map(|tier| tier.price.min(list_price))
            .unwrap_or(list_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    pub min_quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    pub alt_text: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub reference: String,
    pub customer: CustomerDetails,
    #[serde(default)]
    pub delivery: Option<DeliveryAddress>,
    pub items: Vec<OrderLine>,
    pub subtotal: f64,
    pub currency: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: OrderStatus,
    #[serde(with = "rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postcode: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub line_total: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiContentRequest {
    pub id: Uuid,
    pub description: String,
    pub content_type: AiContentType,
    #[serde(default)]
    pub template_id: Option<Uuid>,
    pub prompt: String,
    #[serde(default)]
    pub generated_content: Option<String>,
    pub status: AiRequestStatus,
    #[serde(default)]
    pub error: Option<String>,
    pub metadata: AiRequestMetadata,
    pub user_id: String,
    #[serde(with = "rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AiRequestMetadata {
    pub model: String,
    pub tokens_used: u32,
    pub generation_time_ms: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: Uuid,
    pub name: String,
    pub content_type: AiContentType,
    /// Prompt text with `{{variable}}` placeholders.
    pub template: String,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default, with = "rfc3339::option")]
    pub last_used_at: Option<OffsetDateTime>,
    #[serde(with = "rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub rate_limits: RateLimits,
    pub cost_per_1k_tokens: f64,
    #[serde(default, with = "rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimits {
    pub per_minute: u32,
    pub per_hour: u32,
    pub per_day: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            per_minute: 10,
            per_hour: 100,
            per_day: 500,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pricing() -> Pricing {
        Pricing {
            unit: PricingUnit::PerLinearMetre,
            base_price: 12.0,
            currency: "AUD".to_string(),
            sale_price: None,
            tiers: vec![
                PriceTier {
                    min_quantity: 50,
                    price: 11.0,
                },
                PriceTier {
                    min_quantity: 200,
                    price: 9.5,
                },
            ],
        }
    }

    #[test]
    fn unit_price_picks_highest_applicable_tier() {
        let pricing = pricing();
        assert_eq!(pricing.unit_price_for(10), 12.0);
        assert_eq!(pricing.unit_price_for(50), 11.0);
        assert_eq!(pricing.unit_price_for(500), 9.5);
    }

    #[test]
    fn sale_price_caps_tier_price() {
        let mut pricing = pricing();
        pricing.sale_price = Some(10.0);
        assert_eq!(pricing.unit_price_for(1), 10.0);
        assert_eq!(pricing.unit_price_for(60), 10.0);
        assert_eq!(pricing.unit_price_for(300), 9.5);
    }

    #[test]
    fn navigation_item_ids_default_when_missing() {
        let item: NavigationItem =
            serde_json::from_str(r#"{"label":"Decking","url":"/decking"}"#).unwrap();
        assert_eq!(item.link_type, LinkType::Internal);
        assert!(item.children.is_empty());
        assert!(!item.id.is_nil());
    }

    #[test]
    fn social_shares_increment_per_platform() {
        let mut shares = SocialShares::default();
        shares.increment(SocialPlatform::Pinterest);
        shares.increment(SocialPlatform::Pinterest);
        shares.increment(SocialPlatform::Email);
        assert_eq!(shares.pinterest, 2);
        assert_eq!(shares.total(), 3);
    }
}
