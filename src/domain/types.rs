//! Shared domain enumerations aligned with persisted collection values.

use serde::{Deserialize, Serialize};

/// Lifecycle of a blog post.
///
/// Transitions: `draft → {published, scheduled}`, `scheduled → {published,
/// unpublished}`, `published → unpublished`, `unpublished → {draft,
/// published}`. Staying in the same status is always allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Scheduled,
    Unpublished,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Unpublished => "unpublished",
        }
    }

    pub fn can_transition_to(self, next: PostStatus) -> bool {
        use PostStatus::*;

        self == next
            || matches!(
                (self, next),
                (Draft, Published)
                    | (Draft, Scheduled)
                    | (Scheduled, Published)
                    | (Scheduled, Unpublished)
                    | (Published, Unpublished)
                    | (Unpublished, Draft)
                    | (Unpublished, Published)
            )
    }
}

impl TryFrom<&str> for PostStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "scheduled" => Ok(PostStatus::Scheduled),
            "unpublished" => Ok(PostStatus::Unpublished),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuType {
    Main,
    Footer,
    Mobile,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    #[default]
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalPageType {
    Privacy,
    Terms,
    Shipping,
    Refund,
}

impl LegalPageType {
    pub fn title(self) -> &'static str {
        match self {
            LegalPageType::Privacy => "Privacy Policy",
            LegalPageType::Terms => "Terms and Conditions",
            LegalPageType::Shipping => "Shipping Policy",
            LegalPageType::Refund => "Refund Policy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Facebook,
    Twitter,
    Linkedin,
    Pinterest,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiContentType {
    BlogPost,
    ProductDescription,
    MetaDescription,
    SocialMedia,
    LegalPage,
    ImagePrompt,
    SeoCopy,
    Custom,
}

impl AiContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AiContentType::BlogPost => "blog_post",
            AiContentType::ProductDescription => "product_description",
            AiContentType::MetaDescription => "meta_description",
            AiContentType::SocialMedia => "social_media",
            AiContentType::LegalPage => "legal_page",
            AiContentType::ImagePrompt => "image_prompt",
            AiContentType::SeoCopy => "seo_copy",
            AiContentType::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiRequestStatus {
    Generating,
    Completed,
    Error,
}

/// Lifecycle of a customer estimate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Quoted,
    Confirmed,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        matches!(
            (self, next),
            (Pending, Quoted)
                | (Pending, Cancelled)
                | (Quoted, Confirmed)
                | (Quoted, Cancelled)
                | (Confirmed, Fulfilled)
                | (Confirmed, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}
