//! In-memory filtering, sorting, faceting, and pagination of posts.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{BlogCategory, BlogPost};
use crate::domain::types::{PostStatus, SortOrder};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PostSortField {
    #[default]
    PublishedAt,
    CreatedAt,
    UpdatedAt,
    Title,
    ViewCount,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<PostStatus>,
    /// Category id or slug.
    pub category: Option<String>,
    pub tag: Option<String>,
    pub author: Option<String>,
    pub search: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub date_from: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub date_to: Option<OffsetDateTime>,
    pub sort_by: PostSortField,
    pub sort_order: SortOrder,
    pub featured: Option<bool>,
}

impl PostQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetCount {
    pub value: String,
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFacets {
    pub categories: Vec<FacetCount>,
    pub tags: Vec<FacetCount>,
    pub authors: Vec<FacetCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<BlogPost>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_more: bool,
    pub facets: PostFacets,
}

/// Apply `query` to `posts`. Facets count the whole filtered set, not just
/// the returned page.
pub fn query_posts(posts: &[BlogPost], categories: &[BlogCategory], query: &PostQuery) -> PostPage {
    let page = query.page();
    let limit = query.limit();

    let category_filter = match query.category.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => match resolve_category(categories, value) {
            Some(id) => Some(id),
            None => return empty_page(page, limit),
        },
        _ => None,
    };
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase);
    let tag = query
        .tag
        .as_deref()
        .map(str::trim)
        .filter(|tag| !tag.is_empty());
    let author = query
        .author
        .as_deref()
        .map(str::trim)
        .filter(|author| !author.is_empty());

    let mut matched: Vec<&BlogPost> = posts
        .iter()
        .filter(|post| query.status.is_none_or(|status| post.status == status))
        .filter(|post| category_filter.is_none_or(|id| post.category_ids.contains(&id)))
        .filter(|post| tag.is_none_or(|tag| post.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))))
        .filter(|post| author.is_none_or(|author| post.author_id == author))
        .filter(|post| query.featured.is_none_or(|featured| post.featured == featured))
        .filter(|post| query.date_from.is_none_or(|from| post.sort_timestamp() >= from))
        .filter(|post| query.date_to.is_none_or(|to| post.sort_timestamp() <= to))
        .filter(|post| search.as_deref().is_none_or(|term| matches_search(post, term)))
        .collect();

    let facets = compute_facets(&matched, categories);

    matched.sort_by(|a, b| {
        let ordering = compare_posts(a, b, query.sort_by);
        match query.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let total = matched.len() as u64;
    let total_pages = u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
    let offset = (page as usize - 1).saturating_mul(limit as usize);
    let posts: Vec<BlogPost> = matched
        .into_iter()
        .skip(offset)
        .take(limit as usize)
        .cloned()
        .collect();

    PostPage {
        has_more: page < total_pages,
        posts,
        total,
        page,
        limit,
        total_pages,
        facets,
    }
}

fn empty_page(page: u32, limit: u32) -> PostPage {
    PostPage {
        posts: Vec::new(),
        total: 0,
        page,
        limit,
        total_pages: 0,
        has_more: false,
        facets: PostFacets::default(),
    }
}

pub(crate) fn resolve_category(categories: &[BlogCategory], value: &str) -> Option<Uuid> {
    categories
        .iter()
        .find(|category| category.slug == value || category.id.to_string() == value)
        .map(|category| category.id)
}

fn matches_search(post: &BlogPost, term: &str) -> bool {
    post.title.to_lowercase().contains(term)
        || post.summary.to_lowercase().contains(term)
        || post.content.to_lowercase().contains(term)
        || post.tags.iter().any(|tag| tag.to_lowercase().contains(term))
}

fn compare_posts(a: &BlogPost, b: &BlogPost, field: PostSortField) -> Ordering {
    let primary = match field {
        PostSortField::PublishedAt => a.sort_timestamp().cmp(&b.sort_timestamp()),
        PostSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        PostSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        PostSortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        PostSortField::ViewCount => a.view_count.cmp(&b.view_count),
    };
    primary.then_with(|| a.slug.cmp(&b.slug))
}

fn compute_facets(posts: &[&BlogPost], categories: &[BlogCategory]) -> PostFacets {
    let mut by_category: HashMap<Uuid, u64> = HashMap::new();
    let mut by_tag: HashMap<&str, u64> = HashMap::new();
    let mut by_author: HashMap<&str, u64> = HashMap::new();

    for post in posts {
        for id in &post.category_ids {
            *by_category.entry(*id).or_default() += 1;
        }
        for tag in &post.tags {
            *by_tag.entry(tag.as_str()).or_default() += 1;
        }
        *by_author.entry(post.author_id.as_str()).or_default() += 1;
    }

    let categories = by_category
        .into_iter()
        .filter_map(|(id, count)| {
            categories
                .iter()
                .find(|category| category.id == id)
                .map(|category| FacetCount {
                    value: category.slug.clone(),
                    label: category.name.clone(),
                    count,
                })
        })
        .collect();
    let tags = by_tag
        .into_iter()
        .map(|(tag, count)| FacetCount {
            value: tag.to_string(),
            label: tag.to_string(),
            count,
        })
        .collect();
    let authors = by_author
        .into_iter()
        .map(|(author, count)| FacetCount {
            value: author.to_string(),
            label: author.to_string(),
            count,
        })
        .collect();

    PostFacets {
        categories: ranked(categories),
        tags: ranked(tags),
        authors: ranked(authors),
    }
}

fn ranked(mut facets: Vec<FacetCount>) -> Vec<FacetCount> {
    facets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    facets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::SocialShares;
    use crate::domain::seo::SeoData;
    use time::Duration;

    fn category(name: &str, slug: &str) -> BlogCategory {
        let now = OffsetDateTime::now_utc();
        BlogCategory {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            color: "#8B5E3C".to_string(),
            post_count: 0,
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn post(slug: &str, status: PostStatus, age_days: i64, tags: &[&str], categories: &[Uuid]) -> BlogPost {
        let created = OffsetDateTime::now_utc() - Duration::days(age_days);
        BlogPost {
            id: Uuid::new_v4(),
            title: slug.replace('-', " "),
            slug: slug.to_string(),
            summary: String::new(),
            content: format!("All about {slug}"),
            cover_image: None,
            author_id: if age_days % 2 == 0 { "ana" } else { "ben" }.to_string(),
            category_ids: categories.to_vec(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            status,
            published_at: (status == PostStatus::Published).then_some(created),
            scheduled_for: None,
            reading_time: 1,
            table_of_contents: Vec::new(),
            view_count: age_days as u64,
            social_shares: SocialShares::default(),
            seo: SeoData::default(),
            featured: false,
            created_at: created,
            updated_at: created,
        }
    }

    fn fixture() -> (Vec<BlogPost>, Vec<BlogCategory>) {
        let care = category("Care", "care");
        let species = category("Species", "species");
        let posts = vec![
            post("oiling-decks", PostStatus::Published, 1, &["decking", "oil"], &[care.id]),
            post("teak-basics", PostStatus::Published, 2, &["teak"], &[species.id]),
            post("draft-notes", PostStatus::Draft, 3, &["decking"], &[care.id]),
            post("jarrah-guide", PostStatus::Published, 4, &["Decking"], &[species.id, care.id]),
        ];
        (posts, vec![care, species])
    }

    fn slugs(page: &PostPage) -> Vec<&str> {
        page.posts.iter().map(|post| post.slug.as_str()).collect()
    }

    #[test]
    fn filters_combine_and_sort_newest_first() {
        let (posts, categories) = fixture();
        let query = PostQuery {
            status: Some(PostStatus::Published),
            category: Some("care".to_string()),
            ..Default::default()
        };
        let page = query_posts(&posts, &categories, &query);
        assert_eq!(slugs(&page), vec!["oiling-decks", "jarrah-guide"]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn tag_filter_is_case_insensitive_and_search_spans_fields() {
        let (posts, categories) = fixture();
        let by_tag = query_posts(
            &posts,
            &categories,
            &PostQuery {
                tag: Some("decking".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_tag.total, 3);

        let by_search = query_posts(
            &posts,
            &categories,
            &PostQuery {
                search: Some("TEAK".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(slugs(&by_search), vec!["teak-basics"]);
    }

    #[test]
    fn unknown_category_matches_nothing() {
        let (posts, categories) = fixture();
        let page = query_posts(
            &posts,
            &categories,
            &PostQuery {
                category: Some("finishes".to_string()),
                ..Default::default()
            },
        );
        assert!(page.posts.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn paginates_and_reports_facets_for_full_result() {
        let (posts, categories) = fixture();
        let page = query_posts(
            &posts,
            &categories,
            &PostQuery {
                limit: Some(1),
                page: Some(2),
                sort_by: PostSortField::ViewCount,
                sort_order: SortOrder::Asc,
                ..Default::default()
            },
        );
        assert_eq!(slugs(&page), vec!["teak-basics"]);
        assert_eq!(page.total_pages, 4);
        assert!(page.has_more);

        assert_eq!(page.facets.categories[0].value, "care");
        assert_eq!(page.facets.categories[0].count, 3);
        assert_eq!(page.facets.authors.len(), 2);
        assert_eq!(page.facets.tags[0].value, "decking");
    }

    #[test]
    fn limit_is_capped() {
        let query = PostQuery {
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(query.limit(), MAX_PAGE_LIMIT);
        assert_eq!(PostQuery::default().page(), 1);
    }
}
