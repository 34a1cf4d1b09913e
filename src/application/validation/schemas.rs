use std::collections::HashSet;

use super::{
    Validate, Validator, Violations, is_absolute_url, is_email, is_hex_color, is_link_target,
    is_phone, is_semver,
};
use crate::domain::accounts::{MediaAsset, UserRegistration};
use crate::domain::entities::{
    AiSettings, BlogCategory, BlogPost, LegalPage, NavigationMenu, Order, PriceTier, Pricing,
    Product, ProductImage, ProductSpecifications, PromptTemplate,
};
use crate::domain::seo::SeoData;
use crate::domain::slug::is_valid_slug;
use crate::domain::types::PostStatus;

pub const MAX_MEDIA_BYTES: u64 = 10 * 1024 * 1024;
pub const MEDIA_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/svg+xml",
    "application/pdf",
];

const SLUG_EXPECTATION: &str =
    "must be at most 100 lowercase letters or digits joined by single hyphens";

fn slug(validator: &mut Validator, field: &str, value: &str) {
    validator.matches(field, value, is_valid_slug, SLUG_EXPECTATION);
}

pub fn validate_seo_block(seo: &SeoData) -> Result<(), Violations> {
    let mut v = Validator::new();
    v.max_len("metaTitle", &seo.meta_title, 60)
        .max_len("metaDescription", &seo.meta_description, 160)
        .check(seo.keywords.len() <= 10, "keywords: at most 10 keywords")
        .check(
            seo.keywords.iter().all(|keyword| keyword.chars().count() <= 50),
            "keywords: each keyword must be at most 50 characters",
        );
    if let Some(canonical) = &seo.canonical_url {
        v.matches("canonicalUrl", canonical, is_absolute_url, "must be an absolute URL");
    }
    if let Some(image) = &seo.og_image {
        v.matches("ogImage", image, is_link_target, "must be a URL or site path");
    }
    v.finish()
}

impl Validate for BlogPost {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Validator::new();
        v.length("title", &self.title, 3, 200);
        slug(&mut v, "slug", &self.slug);
        v.max_len("summary", &self.summary, 500)
            .length("content", &self.content, 1, 100_000)
            .required("authorId", &self.author_id)
            .check(self.category_ids.len() <= 10, "categoryIds: at most 10 categories")
            .check(self.tags.len() <= 20, "tags: at most 20 tags")
            .check(
                self.tags
                    .iter()
                    .all(|tag| (1..=50).contains(&tag.trim().chars().count())),
                "tags: each tag must be between 1 and 50 characters",
            );
        if let Some(cover) = &self.cover_image {
            v.matches("coverImage", cover, is_link_target, "must be a URL or site path");
        }
        if self.status == PostStatus::Scheduled {
            v.check(
                self.scheduled_for.is_some(),
                "scheduledFor: is required when status is scheduled",
            );
        }
        if self.status == PostStatus::Published {
            v.check(
                self.published_at.is_some(),
                "publishedAt: is required when status is published",
            );
        }
        v.nested("seo", validate_seo_block(&self.seo));
        v.finish()
    }
}

impl Validate for BlogCategory {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Validator::new();
        v.length("name", &self.name, 2, 50);
        slug(&mut v, "slug", &self.slug);
        v.matches("color", &self.color, is_hex_color, "must be a hex color such as #8B5E3C");
        if let Some(description) = &self.description {
            v.max_len("description", description, 200);
        }
        v.finish()
    }
}

/// Basic menu fields only; tree depth and link checks live in the navigation
/// report so that an over-deep menu can still be stored.
impl Validate for NavigationMenu {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Validator::new();
        v.length("name", &self.name, 2, 50);
        if let Some(description) = &self.description {
            v.max_len("description", description, 200);
        }
        v.finish()
    }
}

impl Validate for LegalPage {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Validator::new();
        v.length("title", &self.title, 5, 200)
            .length("content", &self.content, 50, 200_000)
            .matches("version", &self.version, is_semver, "must look like 1.0.0")
            .length("jurisdiction", &self.jurisdiction, 2, 50)
            .check(
                self.applicable_laws.len() <= 20,
                "applicableLaws: at most 20 entries",
            );
        if let (Some(reviewed), Some(next)) = (self.last_reviewed_at, self.next_review_at) {
            v.check(next > reviewed, "nextReviewAt: must be after lastReviewedAt");
        }
        v.finish()
    }
}

fn validate_specifications(spec: &ProductSpecifications) -> Result<(), Violations> {
    let mut v = Validator::new();
    let dims = spec.dimensions;
    v.check(
        dims.length_mm > 0.0 && dims.width_mm > 0.0 && dims.thickness_mm > 0.0,
        "dimensions: length, width, and thickness must be positive",
    )
    .check(
        dims.length_mm <= 20_000.0,
        "dimensions.lengthMm: must be at most 20000",
    )
    .length("grade", &spec.grade, 1, 50);
    if let Some(moisture) = spec.moisture_content_percent {
        v.range("moistureContentPercent", moisture, 0.0, 100.0);
    }
    if let Some(density) = spec.density_kg_m3 {
        v.range("densityKgM3", density, 100.0, 1500.0);
    }
    if let Some(class) = spec.durability_class {
        v.range("durabilityClass", class, 1, 5);
    }
    v.check(
        spec.certifications.len() <= 10,
        "certifications: at most 10 entries",
    );
    v.finish()
}

fn validate_tiers(tiers: &[PriceTier]) -> Result<(), Violations> {
    let mut v = Validator::new();
    for (index, tier) in tiers.iter().enumerate() {
        v.check(
            tier.min_quantity >= 2,
            format!("tiers[{index}].minQuantity: must be at least 2"),
        )
        .check(
            tier.price > 0.0,
            format!("tiers[{index}].price: must be positive"),
        );
    }
    v.check(
        tiers
            .windows(2)
            .all(|pair| pair[0].min_quantity < pair[1].min_quantity),
        "tiers: minQuantity must increase strictly",
    );
    v.finish()
}

fn validate_pricing(pricing: &Pricing) -> Result<(), Violations> {
    let mut v = Validator::new();
    v.check(pricing.base_price > 0.0, "basePrice: must be positive")
        .matches(
            "currency",
            &pricing.currency,
            |value| value.len() == 3 && value.chars().all(|ch| ch.is_ascii_uppercase()),
            "must be a three-letter ISO code",
        );
    if let Some(sale) = pricing.sale_price {
        v.check(
            sale > 0.0 && sale < pricing.base_price,
            "salePrice: must be positive and below basePrice",
        );
    }
    v.merge(validate_tiers(&pricing.tiers));
    v.finish()
}

fn validate_images(images: &[ProductImage]) -> Result<(), Violations> {
    let mut v = Validator::new();
    v.check(images.len() <= 20, "images: at most 20 images").check(
        images.iter().filter(|image| image.is_primary).count() <= 1,
        "images: at most one primary image",
    );
    for (index, image) in images.iter().enumerate() {
        v.matches(
            &format!("images[{index}].url"),
            &image.url,
            is_link_target,
            "must be a URL or site path",
        )
        .length(&format!("images[{index}].altText"), &image.alt_text, 1, 150);
    }
    v.finish()
}

fn is_sku(value: &str) -> bool {
    (3..=30).contains(&value.len())
        && value
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '-')
}

impl Validate for Product {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Validator::new();
        v.length("name", &self.name, 3, 200);
        slug(&mut v, "slug", &self.slug);
        v.matches(
            "sku",
            &self.sku,
            is_sku,
            "must be 3-30 uppercase letters, digits, or hyphens",
        )
        .length("description", &self.description, 20, 5000)
        .length("category", &self.category, 2, 50)
        .length("species", &self.species, 2, 80)
        .check(self.features.len() <= 20, "features: at most 20 entries");
        if let Some(short) = &self.short_description {
            v.max_len("shortDescription", short, 300);
        }
        v.check(
            self.in_stock || self.stock_quantity == 0,
            "stockQuantity: must be zero when the product is out of stock",
        );
        v.nested("specifications", validate_specifications(&self.specifications));
        v.nested("pricing", validate_pricing(&self.pricing))
            .merge(validate_images(&self.images));
        v.nested("seo", validate_seo_block(&self.seo));
        v.finish()
    }
}

impl Validate for Order {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Validator::new();
        v.required("reference", &self.reference)
            .length("customer.name", &self.customer.name, 2, 100)
            .matches(
                "customer.email",
                &self.customer.email,
                is_email,
                "must be a valid email address",
            )
            .matches(
                "customer.phone",
                &self.customer.phone,
                is_phone,
                "must be a valid phone number",
            )
            .check(!self.items.is_empty(), "items: at least one item is required")
            .check(self.items.len() <= 50, "items: at most 50 items");
        if let Some(company) = &self.customer.company {
            v.max_len("customer.company", company, 100);
        }
        if let Some(delivery) = &self.delivery {
            v.required("delivery.line1", &delivery.line1)
                .required("delivery.city", &delivery.city)
                .required("delivery.region", &delivery.region)
                .matches(
                    "delivery.postcode",
                    &delivery.postcode,
                    |value| {
                        (3..=10).contains(&value.len())
                            && value.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == ' ')
                    },
                    "must be 3-10 letters or digits",
                )
                .required("delivery.country", &delivery.country);
        }
        for (index, line) in self.items.iter().enumerate() {
            v.range(&format!("items[{index}].quantity"), line.quantity, 1, 10_000)
                .check(
                    line.unit_price >= 0.0,
                    format!("items[{index}].unitPrice: must not be negative"),
                );
            if let Some(notes) = &line.notes {
                v.max_len(&format!("items[{index}].notes"), notes, 500);
            }
        }
        if let Some(notes) = &self.notes {
            v.max_len("notes", notes, 1000);
        }
        v.finish()
    }
}

impl Validate for UserRegistration {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Validator::new();
        v.matches("email", &self.email, is_email, "must be a valid email address")
            .length("password", &self.password, 8, 128)
            .check(
                self.password.chars().any(|ch| ch.is_ascii_alphabetic())
                    && self.password.chars().any(|ch| ch.is_ascii_digit()),
                "password: must contain a letter and a digit",
            )
            .check(
                self.password == self.confirm_password,
                "confirmPassword: passwords do not match",
            )
            .length("fullName", &self.full_name, 2, 100)
            .check(self.accept_terms, "acceptTerms: terms must be accepted");
        if let Some(phone) = &self.phone {
            v.matches("phone", phone, is_phone, "must be a valid phone number");
        }
        v.finish()
    }
}

impl Validate for MediaAsset {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Validator::new();
        v.length("filename", &self.filename, 1, 255)
            .check(
                MEDIA_MIME_TYPES.contains(&self.mime_type.as_str()),
                format!("mimeType: `{}` is not an accepted file type", self.mime_type),
            )
            .check(self.size_bytes > 0, "sizeBytes: file is empty")
            .check(
                self.size_bytes <= MAX_MEDIA_BYTES,
                "sizeBytes: file exceeds the 10 MiB limit",
            )
            .matches("url", &self.url, is_link_target, "must be a URL or site path");
        if let Some(alt) = &self.alt_text {
            v.max_len("altText", alt, 150);
        }
        v.finish()
    }
}

/// Declared variables must be identifiers, unique, and used by the template.
pub fn validate_template_variables(template: &str, variables: &[String]) -> Result<(), Violations> {
    let mut v = Validator::new();
    let mut seen = HashSet::new();
    for variable in variables {
        v.matches(
            "variables",
            variable,
            |name| {
                name.chars().next().is_some_and(|ch| ch.is_ascii_lowercase() || ch == '_')
                    && name
                        .chars()
                        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
            },
            "names must be lowercase identifiers",
        )
        .check(
            seen.insert(variable.as_str()),
            format!("variables: `{variable}` is declared twice"),
        )
        .check(
            template.contains(&format!("{{{{{variable}}}}}")),
            format!("variables: `{variable}` is not used by the template"),
        );
    }
    v.finish()
}

impl Validate for PromptTemplate {
    fn validate(&self) -> Result<(), Violations> {
        let mut v = Validator::new();
        v.length("name", &self.name, 3, 100)
            .length("template", &self.template, 10, 5000)
            .nested("template", validate_template_variables(&self.template, &self.variables));
        v.finish()
    }
}

impl Validate for AiSettings {
    fn validate(&self) -> Result<(), Violations> {
        let limits = self.rate_limits;
        let mut v = Validator::new();
        v.length("model", &self.model, 1, 100)
            .range("temperature", self.temperature, 0.0, 2.0)
            .range("maxTokens", self.max_tokens, 1, 8000)
            .check(
                limits.per_minute > 0 && limits.per_hour > 0 && limits.per_day > 0,
                "rateLimits: every limit must be positive",
            )
            .check(
                limits.per_minute <= limits.per_hour && limits.per_hour <= limits.per_day,
                "rateLimits: perMinute <= perHour <= perDay must hold",
            )
            .check(
                self.cost_per_1k_tokens >= 0.0,
                "costPer1kTokens: must not be negative",
            );
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CustomerDetails, OrderLine, RateLimits};
    use crate::domain::types::OrderStatus;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn registration() -> UserRegistration {
        UserRegistration {
            email: "builder@example.com".to_string(),
            password: "hardwood42".to_string(),
            confirm_password: "hardwood42".to_string(),
            full_name: "Sam Carpenter".to_string(),
            phone: None,
            accept_terms: true,
        }
    }

    #[test]
    fn registration_requires_matching_passwords() {
        assert!(registration().validate().is_ok());

        let mut mismatched = registration();
        mismatched.confirm_password = "softwood42".to_string();
        let violations = mismatched.validate().unwrap_err();
        assert_eq!(
            violations.messages(),
            &["confirmPassword: passwords do not match"]
        );
    }

    #[test]
    fn ai_settings_reject_inverted_limits() {
        let settings = AiSettings {
            model: "gpt-4o-mini".to_string(),
            temperature: 2.5,
            max_tokens: 9000,
            rate_limits: RateLimits {
                per_minute: 50,
                per_hour: 10,
                per_day: 100,
            },
            cost_per_1k_tokens: 0.002,
            updated_at: None,
        };
        let messages = settings.validate().unwrap_err().into_messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("temperature"));
        assert!(messages[1].starts_with("maxTokens"));
        assert!(messages[2].starts_with("rateLimits"));
    }

    #[test]
    fn template_variables_must_appear_in_template() {
        assert!(
            validate_template_variables("Describe {{species}} decking", &["species".into()])
                .is_ok()
        );
        let messages = validate_template_variables(
            "Describe {{species}}",
            &["species".into(), "Grade".into()],
        )
        .unwrap_err()
        .into_messages();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn media_asset_rejects_oversized_and_unknown_types() {
        let asset = MediaAsset {
            id: Uuid::new_v4(),
            filename: "deck.tiff".to_string(),
            mime_type: "image/tiff".to_string(),
            size_bytes: MAX_MEDIA_BYTES + 1,
            url: "/media/deck.tiff".to_string(),
            alt_text: None,
            width: None,
            height: None,
        };
        assert_eq!(asset.validate().unwrap_err().messages().len(), 2);
    }

    #[test]
    fn order_requires_items_and_contact_details() {
        let now = OffsetDateTime::now_utc();
        let mut order = Order {
            id: Uuid::new_v4(),
            reference: "EST-20260101-ABC123".to_string(),
            customer: CustomerDetails {
                name: "Alex".to_string(),
                email: "alex@example.com".to_string(),
                phone: "0412 345 678".to_string(),
                company: None,
            },
            delivery: None,
            items: vec![OrderLine {
                product_id: Uuid::new_v4(),
                product_name: "Spotted Gum Decking".to_string(),
                quantity: 40,
                unit_price: 11.5,
                line_total: 460.0,
                notes: None,
            }],
            subtotal: 460.0,
            currency: "AUD".to_string(),
            notes: None,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        assert!(order.validate().is_ok());

        order.items.clear();
        order.customer.email = "alex".to_string();
        let messages = order.validate().unwrap_err().into_messages();
        assert_eq!(
            messages,
            vec![
                "customer.email: must be a valid email address".to_string(),
                "items: at least one item is required".to_string(),
            ]
        );
    }
}
