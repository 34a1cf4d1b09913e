use std::{future::IntoFuture, pin::pin, process, sync::Arc};

use apalis::prelude::{Monitor, WorkerBuilder, WorkerFactoryFn};
use apalis_cron::CronStream;
use thiserror::Error;
use time::OffsetDateTime;
use timberline::{
    application::{
        ai::{
            AiContentService, AiSettingsService, ContentGenerator, PromptTemplateService,
            UnavailableGenerator,
        },
        blog::BlogService,
        catalog::ProductService,
        error::ServiceError,
        legal::LegalPageService,
        navigation::NavigationService,
        orders::OrderService,
        scheduler::{ScheduledPublisher, process_publish_due_job, publish_schedule},
        seo::SiteProfile,
        store::CollectionStore,
    },
    cache::CacheConfig,
    config::{self, LoadError, StorageBackend},
    domain::entities::{AiSettings, RateLimits},
    infra::{
        error::InfraError,
        http::{self, ApiState},
        llm::OpenAiCompatibleGenerator,
        store::{FileCollectionStore, MemoryCollectionStore, RemoteCollectionStore, RemoteStoreConfig},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("server error: {0}")]
    Server(std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::PublishDue(_) => run_publish_due(settings).await,
    }
}

struct AppContext {
    api_state: ApiState,
    publisher: ScheduledPublisher,
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;

    let monitor_handle = settings
        .scheduler
        .enabled
        .then(|| spawn_scheduler(app.publisher.clone(), &settings.scheduler))
        .transpose()?;

    let result = serve_http(&settings, app.api_state).await;

    if let Some(handle) = monitor_handle {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn run_publish_due(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;
    let slugs = app.publisher.publish_due(OffsetDateTime::now_utc()).await?;
    info!(
        target = "timberline::scheduler",
        published = slugs.len(),
        slugs = ?slugs,
        "publish-due tick finished"
    );
    Ok(())
}

async fn open_store(storage: &config::StorageSettings) -> Result<Arc<dyn CollectionStore>, InfraError> {
    let store: Arc<dyn CollectionStore> = match &storage.backend {
        StorageBackend::Memory => {
            warn!(
                target = "timberline::store",
                "memory storage selected; data is lost on restart"
            );
            Arc::new(MemoryCollectionStore::new())
        }
        StorageBackend::File { directory } => {
            Arc::new(FileCollectionStore::open(directory.clone()).await?)
        }
        StorageBackend::Remote(remote) => Arc::new(RemoteCollectionStore::new(RemoteStoreConfig {
            endpoint: remote.endpoint.clone(),
            project_id: remote.project_id.clone(),
            database_id: remote.database_id.clone(),
            api_key: remote.api_key.clone(),
        })?),
    };
    Ok(store)
}

fn build_generator(llm: &config::LlmSettings) -> Result<Arc<dyn ContentGenerator>, InfraError> {
    match llm.api_key.as_deref() {
        Some(key) => {
            let generator = OpenAiCompatibleGenerator::new(llm.base_url.clone(), key)?;
            Ok(Arc::new(generator))
        }
        None => {
            warn!(
                target = "timberline::ai",
                "llm.api_key not set; content generation is unavailable"
            );
            Ok(Arc::new(UnavailableGenerator))
        }
    }
}

async fn build_application_context(settings: &config::Settings) -> Result<AppContext, AppError> {
    let store = open_store(&settings.storage).await?;
    let cache = CacheConfig::from(&settings.cache);
    let site = SiteProfile {
        name: settings.site.name.clone(),
        base_url: settings.site.base_url.clone(),
    };

    let ai_defaults = AiSettings {
        model: settings.llm.model.clone(),
        temperature: settings.llm.temperature,
        max_tokens: settings.llm.max_tokens,
        rate_limits: RateLimits::default(),
        cost_per_1k_tokens: settings.llm.cost_per_1k_tokens,
        updated_at: None,
    };

    let blog = Arc::new(BlogService::new(store.clone(), cache, site.clone()));
    let navigation = Arc::new(NavigationService::new(store.clone(), cache, site.clone()));
    let products = Arc::new(ProductService::new(store.clone(), cache, site.clone()));
    let orders = Arc::new(OrderService::new(store.clone(), cache, products.clone()));
    let templates = Arc::new(PromptTemplateService::new(store.clone(), cache));
    let ai_settings = Arc::new(AiSettingsService::new(store.clone(), cache, ai_defaults));
    let ai = Arc::new(AiContentService::new(
        store.clone(),
        cache,
        templates.clone(),
        ai_settings.clone(),
        build_generator(&settings.llm)?,
        &site.name,
    ));
    let legal = Arc::new(LegalPageService::new(store, cache, ai.clone()));

    info!(
        target = "timberline::startup",
        site = %site.name,
        base_url = %site.base_url,
        generator = ai.generator_name(),
        cache_ttl_secs = cache.ttl.as_secs(),
        "services ready"
    );

    Ok(AppContext {
        publisher: ScheduledPublisher::new(blog.clone()),
        api_state: ApiState {
            blog,
            navigation,
            legal,
            products,
            orders,
            ai,
            templates,
            ai_settings,
            admin_tokens: Arc::new(settings.auth.admin_tokens.clone()),
        },
    })
}

fn spawn_scheduler(
    publisher: ScheduledPublisher,
    scheduler: &config::SchedulerSettings,
) -> Result<tokio::task::JoinHandle<()>, AppError> {
    let schedule = publish_schedule(&scheduler.cron).map_err(|err| {
        InfraError::configuration(format!("invalid scheduler.cron `{}`: {err}", scheduler.cron))
    })?;

    let worker = WorkerBuilder::new("publish-due-worker")
        .data(publisher)
        .backend(CronStream::new(schedule))
        .build_fn(process_publish_due_job);

    let monitor = Monitor::new().register(worker);
    info!(
        target = "timberline::scheduler",
        cron = %scheduler.cron,
        "scheduled publisher started"
    );

    Ok(tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "scheduler monitor stopped");
        }
    }))
}

async fn serve_http(settings: &config::Settings, api_state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(api_state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "timberline::startup",
        addr = %settings.server.addr,
        "http listener bound"
    );

    let shutdown = Arc::new(Notify::new());
    let drain = shutdown.clone();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { drain.notified().await })
        .into_future();
    let mut server = pin!(server);

    tokio::select! {
        result = &mut server => result.map_err(AppError::Server),
        () = shutdown_signal() => {
            info!(
                target = "timberline::startup",
                grace_secs = settings.server.graceful_shutdown.as_secs(),
                "shutdown requested; draining connections"
            );
            shutdown.notify_one();
            match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
                Ok(result) => result.map_err(AppError::Server),
                Err(_) => {
                    warn!(
                        target = "timberline::startup",
                        "graceful shutdown timed out; dropping open connections"
                    );
                    Ok(())
                }
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
