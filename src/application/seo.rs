//! Deterministic search metadata: meta tags, keywords, and JSON-LD blocks.
//!
//! Lengths follow common search-engine display limits: titles up to
//! [`META_TITLE_MAX`] characters, descriptions up to
//! [`META_DESCRIPTION_MAX`], and between [`MIN_KEYWORDS`] and
//! [`MAX_KEYWORDS`] keywords.

use std::collections::HashMap;

use ammonia::Builder as AmmoniaBuilder;
use serde::Serialize;
use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use url::Url;

use crate::application::validation::quality_score;
use crate::domain::content;
use crate::domain::entities::{BlogPost, Product};
use crate::domain::seo::SeoData;

pub const META_TITLE_MAX: usize = 60;
pub const META_DESCRIPTION_MAX: usize = 160;
pub const MIN_KEYWORDS: usize = 3;
pub const MAX_KEYWORDS: usize = 10;
const MAX_KEYWORD_LEN: usize = 50;
const ELLIPSIS: char = '…';

const DEFAULT_KEYWORDS: &[&str] = &["timber", "wood products", "sustainable timber"];

const STOPWORDS: &[&str] = &[
    "about", "after", "all", "also", "and", "any", "are", "because", "been", "before", "but",
    "can", "could", "does", "each", "for", "from", "had", "has", "have", "her", "his", "how",
    "into", "its", "just", "more", "most", "not", "now", "off", "only", "other", "our", "out",
    "over", "per", "should", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "too", "use", "used", "very", "was",
    "way", "were", "what", "when", "where", "which", "while", "who", "why", "will", "with",
    "would", "you", "your",
];

/// Public identity of the storefront used in titles and absolute URLs.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub name: String,
    pub base_url: Url,
}

impl SiteProfile {
    /// Absolute URL for a site path; falls back to the base URL when `path`
    /// cannot be joined.
    pub fn url_for(&self, path: &str) -> String {
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoQualityReport {
    pub is_valid: bool,
    pub score: u8,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn generate_meta_title(title: &str, site_name: Option<&str>) -> String {
    let title = collapse_whitespace(title);
    let site_name = site_name.map(str::trim).filter(|name| !name.is_empty());

    match site_name {
        Some(site) if title.is_empty() => truncate_at_word(site, META_TITLE_MAX),
        Some(site) => {
            let branded = format!("{title} | {site}");
            if branded.chars().count() <= META_TITLE_MAX {
                branded
            } else {
                truncate_at_word(&title, META_TITLE_MAX)
            }
        }
        None => truncate_at_word(&title, META_TITLE_MAX),
    }
}

/// Plain-text description from markdown or HTML input.
pub fn generate_meta_description(text: &str) -> String {
    truncate_at_word(&strip_markup(text), META_DESCRIPTION_MAX)
}

/// Most frequent meaningful words in `text`, ties broken by first occurrence.
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    let plain = strip_markup(text).to_lowercase();
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (position, word) in plain
        .split(|ch: char| !(ch.is_alphanumeric() || ch == '-'))
        .map(|word| word.trim_matches('-'))
        .filter(|word| word.chars().count() >= 3)
        .filter(|word| !word.chars().all(|ch| ch.is_ascii_digit()))
        .filter(|word| !STOPWORDS.contains(word))
        .enumerate()
    {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });
    ranked
        .into_iter()
        .take(max)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Seed keywords first, then extracted ones, padded with site defaults to at
/// least [`MIN_KEYWORDS`] and capped at [`MAX_KEYWORDS`].
pub fn generate_keywords(text: &str, seed: &[String]) -> Vec<String> {
    let mut keywords = normalize_keywords(seed.iter().cloned());
    for keyword in extract_keywords(text, MAX_KEYWORDS) {
        if keywords.len() >= MAX_KEYWORDS {
            break;
        }
        if !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    for default in DEFAULT_KEYWORDS {
        if keywords.len() >= MIN_KEYWORDS {
            break;
        }
        if !keywords.iter().any(|keyword| keyword == default) {
            keywords.push((*default).to_string());
        }
    }
    keywords
}

/// Lowercase, trim, drop empties and duplicates, cap at [`MAX_KEYWORDS`].
pub fn normalize_keywords(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for keyword in raw {
        let keyword = collapse_whitespace(&keyword).to_lowercase();
        if keyword.is_empty() || keyword.chars().count() > MAX_KEYWORD_LEN {
            continue;
        }
        if !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }
    keywords
}

pub fn generate_article_structured_data(post: &BlogPost, site: &SiteProfile) -> Value {
    let published = post.published_at.unwrap_or(post.created_at);
    let word_count = content::plain_text(&post.content).split_whitespace().count();
    let mut data = json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": truncate_at_word(&post.title, 110),
        "description": generate_meta_description(&post.summary),
        "url": site.url_for(&format!("/blog/{}", post.slug)),
        "mainEntityOfPage": site.url_for(&format!("/blog/{}", post.slug)),
        "datePublished": format_timestamp(published),
        "dateModified": format_timestamp(post.updated_at),
        "author": { "@type": "Person", "name": post.author_id },
        "publisher": { "@type": "Organization", "name": site.name, "url": site.base_url.as_str() },
        "wordCount": word_count,
        "timeRequired": format!("PT{}M", post.reading_time),
    });
    if let Some(cover) = &post.cover_image {
        data["image"] = Value::String(absolute(site, cover));
    }
    if !post.tags.is_empty() {
        data["keywords"] = Value::String(post.tags.join(", "));
    }
    data
}

pub fn generate_product_structured_data(product: &Product, site: &SiteProfile) -> Value {
    let pricing = &product.pricing;
    let price = pricing.sale_price.unwrap_or(pricing.base_price);
    let availability = if product.in_stock {
        "https://schema.org/InStock"
    } else {
        "https://schema.org/OutOfStock"
    };
    let images: Vec<String> = product
        .images
        .iter()
        .map(|image| absolute(site, &image.url))
        .collect();
    let spec = &product.specifications;
    let mut properties = vec![
        property("Grade", spec.grade.clone()),
        property(
            "Dimensions",
            format!(
                "{} x {} x {} mm",
                spec.dimensions.length_mm, spec.dimensions.width_mm, spec.dimensions.thickness_mm
            ),
        ),
        property("Pricing unit", pricing.unit.label().to_string()),
    ];
    if let Some(class) = spec.durability_class {
        properties.push(property("Durability class", class.to_string()));
    }
    if let Some(treatment) = &spec.treatment {
        properties.push(property("Treatment", treatment.clone()));
    }

    json!({
        "@context": "https://schema.org",
        "@type": "Product",
        "name": product.name,
        "description": generate_meta_description(&product.description),
        "sku": product.sku,
        "category": product.category,
        "material": product.species,
        "image": images,
        "brand": { "@type": "Brand", "name": site.name },
        "offers": {
            "@type": "Offer",
            "price": format!("{price:.2}"),
            "priceCurrency": pricing.currency,
            "availability": availability,
            "url": site.url_for(&format!("/products/{}", product.slug)),
        },
        "additionalProperty": properties,
    })
}

pub fn generate_organization_structured_data(site: &SiteProfile) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": site.name,
        "url": site.base_url.as_str(),
        "logo": site.url_for("/logo.png"),
    })
}

pub fn generate_breadcrumb_structured_data(crumbs: &[Breadcrumb], site: &SiteProfile) -> Value {
    let elements: Vec<Value> = crumbs
        .iter()
        .enumerate()
        .map(|(index, crumb)| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "name": crumb.label,
                "item": absolute(site, &crumb.url),
            })
        })
        .collect();
    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": elements,
    })
}

pub fn generate_post_seo(post: &BlogPost, site: &SiteProfile) -> SeoData {
    let description_source = if post.summary.trim().is_empty() {
        &post.content
    } else {
        &post.summary
    };
    let description = generate_meta_description(description_source);
    SeoData {
        meta_title: generate_meta_title(&post.title, Some(&site.name)),
        meta_description: description.clone(),
        keywords: generate_keywords(&post.content, &post.tags),
        canonical_url: Some(site.url_for(&format!("/blog/{}", post.slug))),
        og_title: Some(generate_meta_title(&post.title, None)),
        og_description: Some(description),
        og_image: post.cover_image.clone(),
        structured_data: Some(generate_article_structured_data(post, site)),
        no_index: false,
    }
}

pub fn generate_product_seo(product: &Product, site: &SiteProfile) -> SeoData {
    let description_source = product
        .short_description
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(&product.description);
    let description = generate_meta_description(description_source);
    let mut seed = vec![product.species.clone(), product.category.clone()];
    seed.extend(product.features.iter().cloned());
    SeoData {
        meta_title: generate_meta_title(&product.name, Some(&site.name)),
        meta_description: description.clone(),
        keywords: generate_keywords(&product.description, &seed),
        canonical_url: Some(site.url_for(&format!("/products/{}", product.slug))),
        og_title: Some(generate_meta_title(&product.name, None)),
        og_description: Some(description),
        og_image: product.primary_image().map(|image| image.url.clone()),
        structured_data: Some(generate_product_structured_data(product, site)),
        no_index: !product.is_active,
    }
}

pub fn validate_seo_quality(seo: &SeoData) -> SeoQualityReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let title_len = seo.meta_title.trim().chars().count();
    if title_len == 0 {
        errors.push("Meta title is missing".to_string());
    } else if title_len > META_TITLE_MAX {
        errors.push(format!("Meta title exceeds {META_TITLE_MAX} characters"));
    } else if title_len < 30 {
        warnings.push("Meta title is shorter than 30 characters".to_string());
    }

    let description_len = seo.meta_description.trim().chars().count();
    if description_len == 0 {
        errors.push("Meta description is missing".to_string());
    } else if description_len > META_DESCRIPTION_MAX {
        errors.push(format!(
            "Meta description exceeds {META_DESCRIPTION_MAX} characters"
        ));
    } else if description_len < 120 {
        warnings.push("Meta description is shorter than 120 characters".to_string());
    }

    if seo.keywords.len() > MAX_KEYWORDS {
        errors.push(format!("More than {MAX_KEYWORDS} keywords"));
    } else if seo.keywords.len() < MIN_KEYWORDS {
        warnings.push(format!("Fewer than {MIN_KEYWORDS} keywords"));
    }

    if seo.structured_data.is_none() {
        warnings.push("Structured data is missing".to_string());
    }
    if seo.og_image.is_none() {
        warnings.push("Open Graph image is missing".to_string());
    }
    if seo.canonical_url.is_none() {
        warnings.push("Canonical URL is missing".to_string());
    }

    SeoQualityReport {
        is_valid: errors.is_empty(),
        score: quality_score(errors.len(), warnings.len()),
        errors,
        warnings,
    }
}

/// Remove HTML tags and markdown syntax, leaving collapsed plain text.
pub fn strip_markup(text: &str) -> String {
    let without_tags = AmmoniaBuilder::empty().clean(text).to_string();
    content::plain_text(&without_tags)
}

/// Cut `text` to at most `max` characters, preferring a word boundary and
/// marking the cut with an ellipsis.
pub fn truncate_at_word(text: &str, max: usize) -> String {
    let text = collapse_whitespace(text);
    if text.chars().count() <= max {
        return text;
    }
    if max == 0 {
        return String::new();
    }

    let budget = max - 1;
    let head: String = text.chars().take(budget).collect();
    let cut = match head.rfind(' ') {
        Some(index) if head[..index].chars().count() * 2 >= budget => &head[..index],
        _ => head.as_str(),
    };
    let mut truncated = cut
        .trim_end_matches(|ch: char| ch.is_whitespace() || matches!(ch, ',' | ';' | ':' | '-' | '.'))
        .to_string();
    truncated.push(ELLIPSIS);
    truncated
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn absolute(site: &SiteProfile, target: &str) -> String {
    if target.starts_with('/') {
        site.url_for(target)
    } else {
        target.to_string()
    }
}

fn property(name: &str, value: String) -> Value {
    json!({ "@type": "PropertyValue", "name": name, "value": value })
}

fn format_timestamp(value: OffsetDateTime) -> Option<String> {
    value.format(&Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteProfile {
        SiteProfile {
            name: "Timberline".to_string(),
            base_url: Url::parse("https://timberline.example").unwrap(),
        }
    }

    #[test]
    fn meta_title_never_exceeds_limit() {
        assert_eq!(
            generate_meta_title("Teak Care 101", Some("Timberline")),
            "Teak Care 101 | Timberline"
        );

        let long = "A comprehensive guide to selecting, sealing, and maintaining hardwood decking ".repeat(4);
        for site_name in [None, Some("Timberline")] {
            let title = generate_meta_title(&long, site_name);
            assert!(title.chars().count() <= META_TITLE_MAX, "{title}");
            assert!(title.ends_with(ELLIPSIS));
        }
    }

    #[test]
    fn meta_description_strips_markup_and_caps_length() {
        let html = "<p>Kiln-dried <strong>spotted gum</strong> &amp; blackbutt.</p>";
        assert_eq!(
            generate_meta_description(html),
            "Kiln-dried spotted gum & blackbutt."
        );

        let long = "Hardwood decking lasts decades when oiled every season. ".repeat(20);
        let description = generate_meta_description(&long);
        assert!(description.chars().count() <= META_DESCRIPTION_MAX);
        assert!(description.chars().count() > 100);
    }

    #[test]
    fn truncate_handles_unbroken_text() {
        let word = "x".repeat(200);
        let truncated = truncate_at_word(&word, 60);
        assert_eq!(truncated.chars().count(), 60);
    }

    #[test]
    fn extract_keywords_ranks_by_frequency() {
        let text = "Decking oil protects decking boards. Oil twice yearly; decking lasts.";
        assert_eq!(extract_keywords(text, 2), vec!["decking", "oil"]);
    }

    #[test]
    fn generate_keywords_pads_and_caps() {
        let padded = generate_keywords("", &["Teak".to_string()]);
        assert_eq!(padded, vec!["teak", "timber", "wood products"]);

        let seed: Vec<String> = (0..15).map(|index| format!("grade {index}")).collect();
        assert_eq!(generate_keywords("", &seed).len(), MAX_KEYWORDS);
    }

    #[test]
    fn breadcrumb_structured_data_uses_absolute_urls() {
        let crumbs = vec![
            Breadcrumb {
                label: "Home".to_string(),
                url: "/".to_string(),
            },
            Breadcrumb {
                label: "Decking".to_string(),
                url: "/products/decking".to_string(),
            },
        ];
        let data = generate_breadcrumb_structured_data(&crumbs, &site());
        assert_eq!(data["@type"], "BreadcrumbList");
        assert_eq!(data["itemListElement"][1]["position"], 2);
        assert_eq!(
            data["itemListElement"][1]["item"],
            "https://timberline.example/products/decking"
        );
    }

    #[test]
    fn seo_quality_penalizes_missing_fields() {
        let empty = validate_seo_quality(&SeoData::default());
        assert!(!empty.is_valid);
        assert_eq!(empty.errors.len(), 2);
        assert_eq!(empty.score, 100 - 40 - 20);

        let complete = SeoData {
            meta_title: "Spotted Gum Decking Boards | Timberline Supplies".to_string(),
            meta_description: "Premium kiln-dried spotted gum decking in three profiles, \
                               graded for residential and commercial projects across the east coast."
                .to_string(),
            keywords: vec!["decking".into(), "spotted gum".into(), "hardwood".into()],
            canonical_url: Some("https://timberline.example/products/spotted-gum".into()),
            og_title: None,
            og_description: None,
            og_image: Some("/media/spotted-gum.jpg".into()),
            structured_data: Some(json!({"@type": "Product"})),
            no_index: false,
        };
        let report = validate_seo_quality(&complete);
        assert!(report.is_valid);
        assert_eq!(report.score, 100);
    }
}
