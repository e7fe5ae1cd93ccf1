use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryContestRepository, LoggingVoteNotifier};
use crate::routes::with_ranking_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use storyfest::config::AppConfig;
use storyfest::error::AppError;
use storyfest::ranking::{spawn_recompute_worker, ContestImporter, ContestSnapshot, RankingService};
use storyfest::telemetry;
use tokio::sync::mpsc;
use tracing::info;

const CHANGE_FEED_CAPACITY: usize = 256;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let snapshot = match (args.entries.take(), args.scores.take()) {
        (Some(entries), Some(scores)) => ContestImporter::from_paths(entries, scores)?,
        _ => ContestSnapshot::default(),
    };
    let events = snapshot.events();

    let (change_sender, change_receiver) = mpsc::channel(CHANGE_FEED_CAPACITY);
    let repository =
        Arc::new(InMemoryContestRepository::from_snapshot(snapshot).with_change_feed(change_sender));
    let notifier = Arc::new(LoggingVoteNotifier::default());
    let ranking_service = Arc::new(RankingService::new(repository, notifier, config.ranking));

    for event_id in &events {
        ranking_service.refresh(event_id)?;
    }
    let _recompute = spawn_recompute_worker(ranking_service.clone(), change_receiver);

    let app = with_ranking_routes(ranking_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        events = events.len(),
        podium_size = config.ranking.podium_size,
        pool_size = config.ranking.pool_size,
        "storyfest ranking engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
