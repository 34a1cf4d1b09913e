//! Blog posts and categories.

mod categories;
mod posts;
mod query;

use std::sync::Arc;

use crate::application::seo::SiteProfile;
use crate::application::store::{CachedCollection, CollectionStore, collections};
use crate::cache::CacheConfig;
use crate::domain::entities::{BlogCategory, BlogPost};

pub use categories::{CreateCategoryCommand, DEFAULT_CATEGORY_COLOR, UpdateCategoryCommand};
pub use posts::{CreatePostCommand, UpdatePostCommand};
pub use query::{
    DEFAULT_PAGE_LIMIT, FacetCount, MAX_PAGE_LIMIT, PostFacets, PostPage, PostQuery, PostSortField,
    query_posts,
};

pub struct BlogService {
    posts: CachedCollection<BlogPost>,
    categories: CachedCollection<BlogCategory>,
    site: SiteProfile,
}

impl BlogService {
    pub fn new(store: Arc<dyn CollectionStore>, cache: CacheConfig, site: SiteProfile) -> Self {
        Self {
            posts: CachedCollection::new(store.clone(), collections::BLOG_POSTS, cache.ttl),
            categories: CachedCollection::new(store, collections::BLOG_CATEGORIES, cache.ttl),
            site,
        }
    }

    pub fn site(&self) -> &SiteProfile {
        &self.site
    }
}
