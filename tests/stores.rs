use std::sync::Arc;

use httpmock::MockServer;
use serde_json::json;
use time::OffsetDateTime;
use url::Url;

use timberline::application::ai::{ContentGenerator, GenerationRequest, GeneratorError};
use timberline::application::blog::{BlogService, CreatePostCommand};
use timberline::application::scheduler::ScheduledPublisher;
use timberline::application::seo::SiteProfile;
use timberline::application::store::{CollectionStore, StoreError};
use timberline::cache::CacheConfig;
use timberline::domain::types::PostStatus;
use timberline::infra::llm::OpenAiCompatibleGenerator;
use timberline::infra::store::{FileCollectionStore, RemoteCollectionStore, RemoteStoreConfig};

fn remote_store(server: &MockServer) -> RemoteCollectionStore {
    RemoteCollectionStore::new(RemoteStoreConfig {
        endpoint: Url::parse(&server.base_url()).unwrap(),
        project_id: "timber-project".to_string(),
        database_id: "main".to_string(),
        api_key: "store-key".to_string(),
    })
    .unwrap()
}

fn completion_request() -> GenerationRequest {
    GenerationRequest {
        system: Some("You write timber copy.".to_string()),
        prompt: "Describe blackbutt flooring.".to_string(),
        model: "gpt-4o-mini".to_string(),
        temperature: 0.7,
        max_tokens: 400,
    }
}

fn site() -> SiteProfile {
    SiteProfile {
        name: "Timberline".to_string(),
        base_url: Url::parse("https://timber.example").unwrap(),
    }
}

#[tokio::test]
async fn remote_store_treats_missing_collection_as_none() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/databases/main/collections/blog_posts/documents")
                .header("x-project-id", "timber-project")
                .header("x-api-key", "store-key");
            then.status(404).body("collection not found");
        })
        .await;

    let loaded = remote_store(&server).load("blog_posts").await.unwrap();
    assert!(loaded.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn remote_store_replaces_whole_collection() {
    let server = MockServer::start_async().await;
    let documents = json!([{"id": "a", "name": "Main"}, {"id": "b", "name": "Footer"}]);
    let put = server
        .mock_async(|when, then| {
            when.method("PUT")
                .path("/databases/main/collections/navigation_menus/documents")
                .header("x-api-key", "store-key")
                .json_body(documents.clone());
            then.status(200);
        })
        .await;
    let get = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/databases/main/collections/navigation_menus/documents");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(documents.clone());
        })
        .await;

    let store = remote_store(&server);
    let items = documents.as_array().unwrap().clone();
    store.save("navigation_menus", items.clone()).await.unwrap();
    let loaded = store.load("navigation_menus").await.unwrap().unwrap();

    assert_eq!(loaded, items);
    put.assert_async().await;
    get.assert_async().await;
}

#[tokio::test]
async fn remote_store_surfaces_backend_failures() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET");
            then.status(503).body("maintenance");
        })
        .await;

    let err = remote_store(&server).load("products").await.unwrap_err();
    match err {
        StoreError::Backend { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn generator_parses_completion_and_usage() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("POST")
                .path("/chat/completions")
                .header("authorization", "Bearer llm-key");
            then.status(200).json_body(json!({
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [{"message": {"role": "assistant", "content": "Blackbutt is a pale hardwood."}}],
                "usage": {"prompt_tokens": 20, "completion_tokens": 9, "total_tokens": 29}
            }));
        })
        .await;

    let generator =
        OpenAiCompatibleGenerator::new(Url::parse(&server.base_url()).unwrap(), "llm-key").unwrap();
    let generated = generator.generate(&completion_request()).await.unwrap();

    assert_eq!(generated.text, "Blackbutt is a pale hardwood.");
    assert_eq!(generated.model, "gpt-4o-mini-2024-07-18");
    assert_eq!(generated.tokens_used, Some(29));
    mock.assert_async().await;
}

#[tokio::test]
async fn generator_reports_provider_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("POST").path("/chat/completions");
            then.status(401).body(r#"{"error":{"message":"bad key"}}"#);
        })
        .await;

    let generator =
        OpenAiCompatibleGenerator::new(Url::parse(&server.base_url()).unwrap(), "wrong").unwrap();
    let err = generator.generate(&completion_request()).await.unwrap_err();
    assert!(matches!(err, GeneratorError::Api { status: 401, .. }));
}

#[tokio::test]
async fn generator_rejects_empty_choices() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("POST").path("/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        })
        .await;

    let generator =
        OpenAiCompatibleGenerator::new(Url::parse(&server.base_url()).unwrap(), "llm-key").unwrap();
    let err = generator.generate(&completion_request()).await.unwrap_err();
    assert!(matches!(err, GeneratorError::MalformedResponse(_)));
}

#[tokio::test]
async fn scheduled_posts_survive_restart_on_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let publish_at = (OffsetDateTime::now_utc() + time::Duration::minutes(5))
        .replace_nanosecond(0)
        .unwrap();

    {
        let store: Arc<dyn CollectionStore> =
            Arc::new(FileCollectionStore::open(dir.path().to_path_buf()).await.unwrap());
        let blog = BlogService::new(store, CacheConfig::default(), site());
        let post = blog
            .create_post(
                CreatePostCommand {
                    title: "Winter Firewood Guide".to_string(),
                    content: "Split and stack ironbark early so it seasons.".to_string(),
                    status: Some(PostStatus::Scheduled),
                    scheduled_for: Some(publish_at),
                    ..Default::default()
                },
                "editor",
            )
            .await
            .unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);
    }

    let store: Arc<dyn CollectionStore> =
        Arc::new(FileCollectionStore::open(dir.path().to_path_buf()).await.unwrap());
    let blog = Arc::new(BlogService::new(store, CacheConfig::default(), site()));
    let publisher = ScheduledPublisher::new(blog.clone());

    assert!(publisher.publish_due(OffsetDateTime::now_utc()).await.unwrap().is_empty());
    let published = publisher
        .publish_due(publish_at + time::Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(published, vec!["winter-firewood-guide".to_string()]);

    let post = blog.get_published_post("winter-firewood-guide").await.unwrap();
    assert_eq!(post.published_at, Some(publish_at));
    assert_eq!(post.view_count, 1);
}
