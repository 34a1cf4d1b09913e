use std::sync::Arc;

use crate::application::ai::{AiContentService, AiSettingsService, PromptTemplateService};
use crate::application::blog::BlogService;
use crate::application::catalog::ProductService;
use crate::application::legal::LegalPageService;
use crate::application::navigation::NavigationService;
use crate::application::orders::OrderService;

#[derive(Clone)]
pub struct ApiState {
    pub blog: Arc<BlogService>,
    pub navigation: Arc<NavigationService>,
    pub legal: Arc<LegalPageService>,
    pub products: Arc<ProductService>,
    pub orders: Arc<OrderService>,
    pub ai: Arc<AiContentService>,
    pub templates: Arc<PromptTemplateService>,
    pub ai_settings: Arc<AiSettingsService>,
    /// Accepted bearer tokens; empty accepts any token.
    pub admin_tokens: Arc<Vec<String>>,
}
