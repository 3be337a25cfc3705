use std::io;
use std::sync::Arc;

use actix_web::web;
use deck_core::{DeckCatalog, PreferenceTable};
use tokio_util::sync::CancellationToken;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{env::Settings, hub::RoomEventHub, metrics::MetricsCtx, store::RoomStore};

pub mod env;
pub mod errors;
pub mod event_stream;
pub mod handlers;
pub mod hub;
pub mod metrics;
pub mod protocol;
pub mod room_code;
pub mod store;

pub struct LoggerManager {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

impl LoggerManager {
    pub fn setup(settings: &Settings) -> Self {
        // 1. 파일 로거 설정
        let file_appender = RollingFileAppender::new(
            Rotation::DAILY,
            &settings.logging.directory,
            &settings.logging.filename,
        );
        let (non_blocking_file_writer, guard) = tracing_appender::non_blocking(file_appender);

        // 2. 로그 레벨 필터 (RUST_LOG 우선, 없으면 설정 파일 값)
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.server.log_level));

        // 3. 콘솔 출력 레이어
        let console_layer = fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .pretty();

        // 4. 파일 출력 레이어 (ANSI 제외)
        let file_layer = fmt::layer()
            .with_writer(non_blocking_file_writer)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(false);

        // 5. 레지스트리에 필터와 레이어 결합
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        tracing::info!(
            "로거 초기화 완료: 콘솔 및 파일({}/{}) 출력 활성화.",
            settings.logging.directory,
            settings.logging.filename
        );

        Self { _guard: guard }
    }
}

// 워커 전체에서 공유하는 상태. 방 데이터 자체는 store 만 가진다.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub catalog: Arc<DeckCatalog>,
    pub preferences: Arc<PreferenceTable>,
    pub store: Arc<dyn RoomStore>,
    pub hub: Arc<RoomEventHub>,
    pub logger_manager: Option<Arc<LoggerManager>>,
    pub metrics: Arc<MetricsCtx>,
    pub metrics_registry: prometheus::Registry,
}

impl AppState {
    pub fn new(
        settings: Settings,
        catalog: DeckCatalog,
        store: Arc<dyn RoomStore>,
        shutdown_token: CancellationToken,
    ) -> Self {
        let preferences = PreferenceTable::for_catalog(&catalog);
        let metrics = Arc::new(MetricsCtx::new());
        let hub = Arc::new(RoomEventHub::new(metrics.clone(), shutdown_token));

        Self {
            settings,
            catalog: Arc::new(catalog),
            preferences: Arc::new(preferences),
            store,
            hub,
            logger_manager: None,
            metrics,
            metrics_registry: prometheus::Registry::new(),
        }
    }

    pub fn with_logger(mut self, logger_manager: Arc<LoggerManager>) -> Self {
        self.logger_manager = Some(logger_manager);
        self
    }

    pub fn with_metrics_registry(mut self, registry: prometheus::Registry) -> Self {
        self.metrics_registry = registry;
        self
    }
}

/// 모든 HTTP 라우트. `main` 과 통합 테스트가 같은 구성을 쓴다.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::rooms::deck)
        .service(handlers::rooms::api_deck)
        .service(handlers::rooms::create_room)
        .service(handlers::rooms::join_room)
        .service(handlers::rooms::save_room)
        .service(handlers::rooms::load_room)
        .service(handlers::draw::preview_draw)
        .service(handlers::draw::room_draw)
        .service(handlers::draw::choose_draw)
        .service(handlers::sync::sync_room)
        .service(event_stream::room_events)
        .service(handlers::ops::metrics_route)
        .service(handlers::ops::health)
        .service(handlers::ops::ready);
}
