//! Product catalog: browsing, administration, and side-by-side comparison.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::error::ServiceError;
use crate::application::seo::{SiteProfile, generate_product_seo};
use crate::application::store::{CachedCollection, CollectionStore, collections};
use crate::application::validation::Validate;
use crate::cache::CacheConfig;
use crate::domain::entities::{Pricing, Product, ProductImage, ProductSpecifications};
use crate::domain::seo::SeoData;
use crate::domain::slug::generate_slug;

pub const DEFAULT_PRODUCT_LIMIT: u32 = 20;
pub const MAX_PRODUCT_LIMIT: u32 = 100;
pub const MIN_COMPARED: usize = 2;
pub const MAX_COMPARED: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
    #[default]
    Name,
    PriceAsc,
    PriceDesc,
    Newest,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub species: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub in_stock: Option<bool>,
    /// Admin listings include deactivated products.
    pub include_inactive: bool,
    pub sort: ProductSort,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_more: bool,
}

/// Fields a caller supplies when creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
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
    #[serde(default)]
    pub seo: Option<SeoData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProductCommand {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub category: Option<String>,
    pub species: Option<String>,
    pub specifications: Option<ProductSpecifications>,
    pub pricing: Option<Pricing>,
    pub images: Option<Vec<ProductImage>>,
    pub features: Option<Vec<String>>,
    pub in_stock: Option<bool>,
    pub stock_quantity: Option<u32>,
    pub is_active: Option<bool>,
    pub seo: Option<SeoData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedProduct {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub attribute: &'static str,
    pub label: &'static str,
    /// One value per compared product, in request order.
    pub values: Vec<String>,
    pub differs: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductComparison {
    pub products: Vec<ComparedProduct>,
    pub rows: Vec<ComparisonRow>,
}

pub struct ProductService {
    products: CachedCollection<Product>,
    site: SiteProfile,
}

impl ProductService {
    pub fn new(store: Arc<dyn CollectionStore>, cache: CacheConfig, site: SiteProfile) -> Self {
        Self {
            products: CachedCollection::new(store, collections::PRODUCTS, cache.ttl),
            site,
        }
    }

    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ServiceError> {
        let products = self.products.all().await?;
        Ok(filter_products(&products, query))
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, ServiceError> {
        self.products
            .all()
            .await?
            .iter()
            .find(|product| product.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("product"))
    }

    /// Storefront lookup; deactivated products are not found.
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, ServiceError> {
        self.products
            .all()
            .await?
            .iter()
            .find(|product| product.slug == slug && product.is_active)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("product"))
    }

    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, ServiceError> {
        let slug = match draft.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => generate_slug(&draft.name)
                .map_err(|err| ServiceError::validation(format!("slug: {err}")))?,
        };
        let now = OffsetDateTime::now_utc();
        let mut product = Product {
            id: Uuid::new_v4(),
            name: draft.name.trim().to_string(),
            slug,
            sku: draft.sku.trim().to_uppercase(),
            description: draft.description,
            short_description: draft.short_description.filter(|text| !text.trim().is_empty()),
            category: draft.category.trim().to_string(),
            species: draft.species.trim().to_string(),
            specifications: draft.specifications,
            pricing: draft.pricing,
            images: draft.images,
            features: draft.features,
            in_stock: draft.in_stock,
            stock_quantity: draft.stock_quantity,
            is_active: true,
            seo: SeoData::default(),
            created_at: now,
            updated_at: now,
        };
        product.seo = fill_seo(draft.seo, generate_product_seo(&product, &self.site));
        product.validate()?;

        let created = self
            .products
            .mutate(|products| {
                ensure_unique(products, &product, None)?;
                products.push(product.clone());
                Ok(product)
            })
            .await?;
        info!(
            target = "timberline::catalog",
            product_id = %created.id,
            sku = %created.sku,
            "product created"
        );
        Ok(created)
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        command: UpdateProductCommand,
    ) -> Result<Product, ServiceError> {
        let site = &self.site;
        let now = OffsetDateTime::now_utc();
        let updated = self
            .products
            .mutate(|products| {
                let index = products
                    .iter()
                    .position(|product| product.id == id)
                    .ok_or_else(|| ServiceError::not_found("product"))?;
                let mut product = products[index].clone();
                if let Some(name) = command.name {
                    product.name = name.trim().to_string();
                }
                if let Some(slug) = command.slug {
                    product.slug = slug.trim().to_string();
                }
                if let Some(sku) = command.sku {
                    product.sku = sku.trim().to_uppercase();
                }
                if let Some(description) = command.description {
                    product.description = description;
                }
                if let Some(short) = command.short_description {
                    product.short_description = Some(short).filter(|text| !text.trim().is_empty());
                }
                if let Some(category) = command.category {
                    product.category = category.trim().to_string();
                }
                if let Some(species) = command.species {
                    product.species = species.trim().to_string();
                }
                if let Some(specifications) = command.specifications {
                    product.specifications = specifications;
                }
                if let Some(pricing) = command.pricing {
                    product.pricing = pricing;
                }
                if let Some(images) = command.images {
                    product.images = images;
                }
                if let Some(features) = command.features {
                    product.features = features;
                }
                if let Some(in_stock) = command.in_stock {
                    product.in_stock = in_stock;
                    if !in_stock {
                        product.stock_quantity = 0;
                    }
                }
                if let Some(quantity) = command.stock_quantity {
                    product.stock_quantity = quantity;
                }
                if let Some(active) = command.is_active {
                    product.is_active = active;
                }
                product.updated_at = now;
                let current = std::mem::take(&mut product.seo);
                product.seo = fill_seo(Some(command.seo.unwrap_or(current)), generate_product_seo(&product, site));
                product.validate()?;
                ensure_unique(products, &product, Some(id))?;

                products[index] = product.clone();
                Ok(product)
            })
            .await?;
        info!(
            target = "timberline::catalog",
            product_id = %updated.id,
            active = updated.is_active,
            "product updated"
        );
        Ok(updated)
    }

    /// Soft delete: the product is deactivated and hidden from the storefront.
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let now = OffsetDateTime::now_utc();
        self.products
            .mutate(|products| {
                let product = products
                    .iter_mut()
                    .find(|product| product.id == id)
                    .ok_or_else(|| ServiceError::not_found("product"))?;
                product.is_active = false;
                product.seo.no_index = true;
                product.updated_at = now;
                Ok(())
            })
            .await?;
        info!(target = "timberline::catalog", product_id = %id, "product deactivated");
        Ok(())
    }

    /// Align 2 to 4 active products attribute by attribute.
    pub async fn compare_products(&self, ids: &[Uuid]) -> Result<ProductComparison, ServiceError> {
        let mut seen = HashSet::new();
        let unique: Vec<Uuid> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if !(MIN_COMPARED..=MAX_COMPARED).contains(&unique.len()) {
            return Err(ServiceError::validation(format!(
                "ids: compare between {MIN_COMPARED} and {MAX_COMPARED} distinct products"
            )));
        }
        let catalog = self.products.all().await?;
        let products = unique
            .iter()
            .map(|id| {
                catalog
                    .iter()
                    .find(|product| product.id == *id && product.is_active)
                    .ok_or_else(|| ServiceError::not_found("product"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(compare(&products))
    }
}

pub fn filter_products(products: &[Product], query: &ProductQuery) -> ProductPage {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PRODUCT_LIMIT)
        .clamp(1, MAX_PRODUCT_LIMIT);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<&Product> = products
        .iter()
        .filter(|product| query.include_inactive || product.is_active)
        .filter(|product| {
            query
                .category
                .as_deref()
                .is_none_or(|category| product.category.eq_ignore_ascii_case(category))
        })
        .filter(|product| {
            query
                .species
                .as_deref()
                .is_none_or(|species| product.species.eq_ignore_ascii_case(species))
        })
        .filter(|product| query.in_stock.is_none_or(|in_stock| product.in_stock == in_stock))
        .filter(|product| query.min_price.is_none_or(|min| current_price(product) >= min))
        .filter(|product| query.max_price.is_none_or(|max| current_price(product) <= max))
        .filter(|product| {
            search.as_deref().is_none_or(|term| {
                product.name.to_lowercase().contains(term)
                    || product.description.to_lowercase().contains(term)
                    || product.species.to_lowercase().contains(term)
                    || product.sku.to_lowercase().contains(term)
            })
        })
        .collect();

    match query.sort {
        ProductSort::Name => matched.sort_by(|a, b| a.name.cmp(&b.name)),
        ProductSort::PriceAsc => {
            matched.sort_by(|a, b| current_price(a).total_cmp(&current_price(b)))
        }
        ProductSort::PriceDesc => {
            matched.sort_by(|a, b| current_price(b).total_cmp(&current_price(a)))
        }
        ProductSort::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }

    let total = matched.len() as u64;
    let total_pages = u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
    let offset = (page as usize - 1).saturating_mul(limit as usize);
    ProductPage {
        products: matched
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect(),
        total,
        page,
        limit,
        total_pages,
        has_more: page < total_pages,
    }
}

fn current_price(product: &Product) -> f64 {
    product.pricing.sale_price.unwrap_or(product.pricing.base_price)
}

fn compare(products: &[&Product]) -> ProductComparison {
    let rows = vec![
        row(products, "species", "Species", |p| p.species.clone()),
        row(products, "category", "Category", |p| p.category.clone()),
        row(products, "price", "Price", |p| {
            format!(
                "{:.2} {} {}",
                current_price(p),
                p.pricing.currency,
                p.pricing.unit.label()
            )
        }),
        row(products, "dimensions", "Dimensions (mm)", |p| {
            let d = p.specifications.dimensions;
            format!("{} × {} × {}", d.length_mm, d.width_mm, d.thickness_mm)
        }),
        row(products, "grade", "Grade", |p| p.specifications.grade.clone()),
        row(products, "durabilityClass", "Durability class", |p| {
            optional(p.specifications.durability_class.map(|class| class.to_string()))
        }),
        row(products, "densityKgM3", "Density (kg/m³)", |p| {
            optional(p.specifications.density_kg_m3.map(|density| density.to_string()))
        }),
        row(products, "moistureContentPercent", "Moisture content (%)", |p| {
            optional(p.specifications.moisture_content_percent.map(|m| m.to_string()))
        }),
        row(products, "treatment", "Treatment", |p| optional(p.specifications.treatment.clone())),
        row(products, "finish", "Finish", |p| optional(p.specifications.finish.clone())),
        row(products, "certifications", "Certifications", |p| {
            optional(
                Some(p.specifications.certifications.join(", ")).filter(|joined| !joined.is_empty()),
            )
        }),
        row(products, "origin", "Origin", |p| optional(p.specifications.origin.clone())),
        row(products, "availability", "Availability", |p| {
            if p.in_stock {
                format!("In stock ({})", p.stock_quantity)
            } else {
                "Made to order".to_string()
            }
        }),
    ];

    ProductComparison {
        products: products
            .iter()
            .map(|product| ComparedProduct {
                id: product.id,
                name: product.name.clone(),
                slug: product.slug.clone(),
                image: product.primary_image().map(|image| image.url.clone()),
            })
            .collect(),
        rows,
    }
}

fn row(
    products: &[&Product],
    attribute: &'static str,
    label: &'static str,
    extract: impl Fn(&Product) -> String,
) -> ComparisonRow {
    let values: Vec<String> = products.iter().map(|product| extract(*product)).collect();
    let differs = values.windows(2).any(|pair| pair[0] != pair[1]);
    ComparisonRow {
        attribute,
        label,
        values,
        differs,
    }
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "—".to_string())
}

fn fill_seo(supplied: Option<SeoData>, generated: SeoData) -> SeoData {
    let Some(supplied) = supplied else {
        return generated;
    };
    SeoData {
        meta_title: Some(supplied.meta_title)
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(generated.meta_title),
        meta_description: Some(supplied.meta_description)
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(generated.meta_description),
        keywords: Some(supplied.keywords)
            .filter(|keywords| !keywords.is_empty())
            .unwrap_or(generated.keywords),
        canonical_url: generated.canonical_url,
        og_title: supplied.og_title.or(generated.og_title),
        og_description: supplied.og_description.or(generated.og_description),
        og_image: supplied.og_image.or(generated.og_image),
        structured_data: generated.structured_data,
        no_index: generated.no_index || supplied.no_index,
    }
}

fn ensure_unique(products: &[Product], candidate: &Product, except: Option<Uuid>) -> Result<(), ServiceError> {
    for existing in products.iter().filter(|p| Some(p.id) != except) {
        if existing.slug == candidate.slug {
            return Err(ServiceError::conflict(format!(
                "a product with slug `{}` already exists",
                candidate.slug
            )));
        }
        if existing.sku == candidate.sku {
            return Err(ServiceError::conflict(format!(
                "a product with SKU `{}` already exists",
                candidate.sku
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::entities::{Dimensions, PriceTier, PricingUnit};
    use crate::infra::store::MemoryCollectionStore;
    use url::Url;

    pub(crate) fn site() -> SiteProfile {
        SiteProfile {
            name: "Timberline".to_string(),
            base_url: Url::parse("https://timber.example").unwrap(),
        }
    }

    pub(crate) fn draft(name: &str, sku: &str, species: &str, price: f64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            slug: None,
            sku: sku.to_string(),
            description: format!("{name} milled from kiln dried {species} for outdoor use."),
            short_description: None,
            category: "decking".to_string(),
            species: species.to_string(),
            specifications: ProductSpecifications {
                dimensions: Dimensions {
                    length_mm: 5400.0,
                    width_mm: 140.0,
                    thickness_mm: 19.0,
                },
                grade: "Select".to_string(),
                durability_class: Some(2),
                ..Default::default()
            },
            pricing: Pricing {
                unit: PricingUnit::PerLinearMetre,
                base_price: price,
                currency: "AUD".to_string(),
                sale_price: None,
                tiers: vec![PriceTier {
                    min_quantity: 100,
                    price: price * 0.9,
                }],
            },
            images: Vec::new(),
            features: vec!["Class 2 durability".to_string()],
            in_stock: true,
            stock_quantity: 500,
            seo: None,
        }
    }

    pub(crate) fn service() -> ProductService {
        ProductService::new(Arc::new(MemoryCollectionStore::new()), CacheConfig::default(), site())
    }

    #[tokio::test]
    async fn create_generates_slug_and_seo() {
        let catalog = service();
        let product = catalog
            .create_product(draft("Spotted Gum Decking", "SG-140", "Spotted Gum", 12.5))
            .await
            .unwrap();
        assert_eq!(product.slug, "spotted-gum-decking");
        assert!(product.seo.meta_title.starts_with("Spotted Gum Decking"));
        assert_eq!(
            product.seo.canonical_url.as_deref(),
            Some("https://timber.example/products/spotted-gum-decking")
        );
        assert_eq!(product.seo.structured_data.as_ref().unwrap()["@type"], "Product");
    }

    #[tokio::test]
    async fn duplicate_slug_or_sku_conflicts() {
        let catalog = service();
        catalog
            .create_product(draft("Merbau Decking", "MB-90", "Merbau", 9.0))
            .await
            .unwrap();
        let same_sku = catalog
            .create_product(draft("Merbau Screening", "MB-90", "Merbau", 7.0))
            .await
            .unwrap_err();
        assert!(matches!(same_sku, ServiceError::Conflict { .. }));
    }

    #[tokio::test]
    async fn list_filters_sorts_and_hides_inactive() {
        let catalog = service();
        let jarrah = catalog
            .create_product(draft("Jarrah Decking", "JA-140", "Jarrah", 15.0))
            .await
            .unwrap();
        catalog
            .create_product(draft("Blackbutt Decking", "BB-140", "Blackbutt", 11.0))
            .await
            .unwrap();
        catalog
            .create_product(draft("Pine Decking", "PN-90", "Pine", 4.0))
            .await
            .unwrap();

        let cheap = catalog
            .list_products(&ProductQuery {
                max_price: Some(12.0),
                sort: ProductSort::PriceAsc,
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<&str> = cheap.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Pine Decking", "Blackbutt Decking"]);

        catalog.delete_product(jarrah.id).await.unwrap();
        let storefront = catalog.list_products(&ProductQuery::default()).await.unwrap();
        assert_eq!(storefront.total, 2);
        let admin = catalog
            .list_products(&ProductQuery {
                include_inactive: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(admin.total, 3);
        assert!(catalog.get_product_by_slug("jarrah-decking").await.is_err());
        assert!(!catalog.get_product(jarrah.id).await.unwrap().is_active);
    }

    #[test]
    fn limit_is_capped() {
        let page = filter_products(
            &[],
            &ProductQuery {
                limit: Some(1000),
                ..Default::default()
            },
        );
        assert_eq!(page.limit, MAX_PRODUCT_LIMIT);
    }

    #[tokio::test]
    async fn compare_aligns_rows_and_flags_differences() {
        let catalog = service();
        let a = catalog
            .create_product(draft("Ironbark Decking", "IB-140", "Ironbark", 16.0))
            .await
            .unwrap();
        let b = catalog
            .create_product(draft("Tallowwood Decking", "TW-140", "Tallowwood", 14.0))
            .await
            .unwrap();

        let comparison = catalog.compare_products(&[a.id, b.id]).await.unwrap();
        assert_eq!(comparison.products.len(), 2);
        let species = comparison.rows.iter().find(|row| row.attribute == "species").unwrap();
        assert_eq!(species.values, vec!["Ironbark", "Tallowwood"]);
        assert!(species.differs);
        let grade = comparison.rows.iter().find(|row| row.attribute == "grade").unwrap();
        assert!(!grade.differs);

        assert!(matches!(
            catalog.compare_products(&[a.id]).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            catalog.compare_products(&[a.id, Uuid::new_v4()]).await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
