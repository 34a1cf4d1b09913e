//! Customer estimate requests priced from the catalog.

use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::info;
use uuid::Uuid;

use crate::application::catalog::ProductService;
use crate::application::error::ServiceError;
use crate::application::store::{CachedCollection, CollectionStore, collections};
use crate::application::validation::Validate;
use crate::cache::CacheConfig;
use crate::domain::entities::{CustomerDetails, DeliveryAddress, Order, OrderLine};
use crate::domain::types::OrderStatus;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateLineRequest {
    pub product_id: Uuid,
    pub quantity: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub customer: CustomerDetails,
    #[serde(default)]
    pub delivery: Option<DeliveryAddress>,
    pub items: Vec<EstimateLineRequest>,
    #[serde(default)]
    pub notes: Option<String>,
}

pub struct OrderService {
    orders: CachedCollection<Order>,
    products: Arc<ProductService>,
}

impl OrderService {
    pub fn new(store: Arc<dyn CollectionStore>, cache: CacheConfig, products: Arc<ProductService>) -> Self {
        Self {
            orders: CachedCollection::new(store, collections::ORDERS, cache.ttl),
            products,
        }
    }

    /// Price each line from the live catalog and record a pending estimate.
    pub async fn create_estimate(&self, request: EstimateRequest) -> Result<Order, ServiceError> {
        let mut lines = Vec::with_capacity(request.items.len());
        let mut currency: Option<String> = None;
        for (index, item) in request.items.iter().enumerate() {
            let product = match self.products.get_product(item.product_id).await {
                Ok(product) if product.is_active => product,
                Ok(_) | Err(ServiceError::NotFound { .. }) => {
                    return Err(ServiceError::validation(format!(
                        "items[{index}].productId: unknown product {}",
                        item.product_id
                    )));
                }
                Err(err) => return Err(err),
            };
            match &currency {
                Some(existing) if *existing != product.pricing.currency => {
                    return Err(ServiceError::validation(format!(
                        "items[{index}]: priced in {}, other items in {existing}",
                        product.pricing.currency
                    )));
                }
                Some(_) => {}
                None => currency = Some(product.pricing.currency.clone()),
            }

            let unit_price = round_cents(product.pricing.unit_price_for(item.quantity));
            lines.push(OrderLine {
                product_id: product.id,
                product_name: product.name,
                quantity: item.quantity,
                unit_price,
                line_total: round_cents(unit_price * f64::from(item.quantity)),
                notes: item.notes.clone().filter(|notes| !notes.trim().is_empty()),
            });
        }

        let now = OffsetDateTime::now_utc();
        let id = Uuid::new_v4();
        let order = Order {
            id,
            reference: estimate_reference(now, id)?,
            customer: request.customer,
            delivery: request.delivery,
            subtotal: round_cents(lines.iter().map(|line| line.line_total).sum()),
            items: lines,
            currency: currency.unwrap_or_default(),
            notes: request.notes.filter(|notes| !notes.trim().is_empty()),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        order.validate()?;

        let created = self
            .orders
            .mutate(|orders| {
                orders.push(order.clone());
                Ok(order)
            })
            .await?;
        info!(
            target = "timberline::orders",
            order_id = %created.id,
            reference = %created.reference,
            lines = created.items.len(),
            subtotal = created.subtotal,
            "estimate requested"
        );
        Ok(created)
    }

    /// Newest first, optionally restricted to one status.
    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, ServiceError> {
        let mut orders: Vec<Order> = self
            .orders
            .all()
            .await?
            .iter()
            .filter(|order| status.is_none_or(|status| order.status == status))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, ServiceError> {
        self.orders
            .all()
            .await?
            .iter()
            .find(|order| order.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("order"))
    }

    pub async fn update_order_status(
        &self,
        id: Uuid,
        next: OrderStatus,
    ) -> Result<Order, ServiceError> {
        let now = OffsetDateTime::now_utc();
        let order = self
            .orders
            .mutate(|orders| {
                let order = orders
                    .iter_mut()
                    .find(|order| order.id == id)
                    .ok_or_else(|| ServiceError::not_found("order"))?;
                if !order.status.can_transition_to(next) {
                    return Err(ServiceError::validation(format!(
                        "status: cannot move an order from {:?} to {:?}",
                        order.status, next
                    )));
                }
                order.status = next;
                order.updated_at = now;
                Ok(order.clone())
            })
            .await?;
        info!(
            target = "timberline::orders",
            order_id = %order.id,
            status = ?order.status,
            "order status changed"
        );
        Ok(order)
    }
}

/// `EST-YYYYMMDD-XXXXXX` with six uppercase hex characters from the id.
fn estimate_reference(now: OffsetDateTime, id: Uuid) -> Result<String, ServiceError> {
    let date = now
        .format(format_description!("[year][month][day]"))
        .map_err(|err| ServiceError::unexpected(format!("failed to format estimate date: {err}")))?;
    let suffix: String = id.simple().to_string().chars().take(6).collect();
    Ok(format!("EST-{date}-{}", suffix.to_uppercase()))
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::catalog::tests::{draft, site};
    use crate::infra::store::MemoryCollectionStore;

    fn services() -> (Arc<ProductService>, OrderService) {
        let store: Arc<dyn CollectionStore> = Arc::new(MemoryCollectionStore::new());
        let products = Arc::new(ProductService::new(store.clone(), CacheConfig::default(), site()));
        let orders = OrderService::new(store, CacheConfig::default(), products.clone());
        (products, orders)
    }

    fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "Sam Carpenter".to_string(),
            email: "sam@example.com".to_string(),
            phone: "+61 400 000 000".to_string(),
            company: None,
        }
    }

    fn line(product_id: Uuid, quantity: u32) -> EstimateLineRequest {
        EstimateLineRequest {
            product_id,
            quantity,
            notes: None,
        }
    }

    #[tokio::test]
    async fn estimate_prices_lines_with_tiers() {
        let (products, orders) = services();
        let decking = products
            .create_product(draft("Jarrah Decking", "JA-140", "Jarrah", 15.0))
            .await
            .unwrap();

        let order = orders
            .create_estimate(EstimateRequest {
                customer: customer(),
                delivery: None,
                items: vec![line(decking.id, 120), line(decking.id, 3)],
                notes: Some("Deliver before Friday".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.currency, "AUD");
        assert_eq!(order.items[0].unit_price, 13.5);
        assert_eq!(order.items[0].line_total, 1620.0);
        assert_eq!(order.items[1].line_total, 45.0);
        assert_eq!(order.subtotal, 1665.0);
        assert!(order.reference.starts_with("EST-"));
        assert_eq!(order.reference.len(), "EST-20260101-ABCDEF".len());
    }

    #[tokio::test]
    async fn unknown_products_and_bad_contacts_are_rejected() {
        let (_, orders) = services();
        let err = orders
            .create_estimate(EstimateRequest {
                customer: customer(),
                delivery: None,
                items: vec![line(Uuid::new_v4(), 1)],
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = orders
            .create_estimate(EstimateRequest {
                customer: customer(),
                delivery: None,
                items: Vec::new(),
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn status_follows_transition_table() {
        let (products, orders) = services();
        let product = products
            .create_product(draft("Pine Framing", "PF-90", "Radiata Pine", 3.2))
            .await
            .unwrap();
        let order = orders
            .create_estimate(EstimateRequest {
                customer: customer(),
                delivery: None,
                items: vec![line(product.id, 10)],
                notes: None,
            })
            .await
            .unwrap();

        let err = orders
            .update_order_status(order.id, OrderStatus::Fulfilled)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        orders.update_order_status(order.id, OrderStatus::Quoted).await.unwrap();
        let confirmed = orders
            .update_order_status(order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        assert_eq!(orders.list_orders(Some(OrderStatus::Confirmed)).await.unwrap().len(), 1);
        assert!(orders.list_orders(Some(OrderStatus::Pending)).await.unwrap().is_empty());
    }
}
