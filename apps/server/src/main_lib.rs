use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    config::Config,
    domain_events::WebDomainEventSink,
    events::{self, EventBus, ServerEvent},
};
use questboard_core::{
    badges::{BadgeService, BadgeServiceTrait},
    cleanup::ReferenceCleanupService,
    completion::{CompletionService, CompletionServiceTrait},
    events::DomainEventSink,
    join_requests::{JoinRequestService, JoinRequestServiceTrait},
    profiles::{ProfileService, ProfileServiceTrait},
    quests::{Quest, QuestService, QuestServiceTrait},
    subscriptions::{SnapshotCallback, Subscription},
};
use questboard_storage_sqlite::{
    db, BadgeRepository, ProfileRepository, QuestRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub quest_service: Arc<dyn QuestServiceTrait>,
    pub join_request_service: Arc<dyn JoinRequestServiceTrait>,
    pub profile_service: Arc<dyn ProfileServiceTrait>,
    pub badge_service: Arc<dyn BadgeServiceTrait>,
    pub completion_service: Arc<dyn CompletionServiceTrait>,
    pub cleanup_service: Arc<ReferenceCleanupService>,
    pub event_bus: EventBus,
    quest_feed: Mutex<Option<Subscription>>,
}

impl AppState {
    /// Releases the quest snapshot listener. Safe to call more than once.
    pub fn shutdown(&self) {
        let subscription = self
            .quest_feed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            let id = subscription.id();
            if subscription.unsubscribe() {
                tracing::debug!("Quest snapshot listener {} released", id);
            }
        }
    }
}

pub fn init_tracing() {
    let log_format = std::env::var("QB_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // `init` also installs the `log` bridge used by the library crates.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Forwards every quest collection snapshot to connected clients.
fn snapshot_forwarder(event_bus: EventBus) -> SnapshotCallback<Quest> {
    Arc::new(move |snapshot: &[Quest]| match serde_json::to_value(snapshot) {
        Ok(payload) => {
            event_bus.publish(ServerEvent::with_payload(events::QUESTS_SNAPSHOT, payload))
        }
        Err(err) => tracing::warn!("Failed to serialize quest snapshot: {}", err),
    })
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let event_bus = EventBus::new(256);
    let event_sink: Arc<dyn DomainEventSink> =
        Arc::new(WebDomainEventSink::new(event_bus.clone()));

    let quest_repository = Arc::new(QuestRepository::new(pool.clone(), writer.clone()));
    let profile_repository = Arc::new(ProfileRepository::new(pool.clone(), writer.clone()));
    let badge_repository = Arc::new(BadgeRepository::new(pool.clone(), writer.clone()));

    let quest_service = Arc::new(
        QuestService::new(quest_repository.clone())
            .with_profile_repository(profile_repository.clone())
            .with_event_sink(event_sink.clone()),
    );
    let profile_service = Arc::new(ProfileService::new(profile_repository.clone()));
    let join_request_service = Arc::new(
        JoinRequestService::new(quest_repository.clone(), profile_repository.clone())
            .with_event_sink(event_sink.clone()),
    );
    let completion_service: Arc<dyn CompletionServiceTrait> = Arc::new(
        CompletionService::new(quest_repository.clone(), badge_repository.clone())
            .with_event_sink(event_sink.clone()),
    );
    let badge_service = Arc::new(
        BadgeService::new(badge_repository.clone(), completion_service.clone())
            .with_event_sink(event_sink),
    );
    let cleanup_service = Arc::new(ReferenceCleanupService::new(
        quest_repository,
        profile_repository,
        badge_repository,
    ));

    let quest_feed = quest_service.subscribe(snapshot_forwarder(event_bus.clone()));

    Ok(Arc::new(AppState {
        quest_service,
        join_request_service,
        profile_service,
        badge_service,
        completion_service,
        cleanup_service,
        event_bus,
        quest_feed: Mutex::new(Some(quest_feed)),
    }))
}
