use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use deck_core::DeckCatalog;
use room_server::{configure, env::Settings, store::FileRoomStore, AppState, LoggerManager};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 1. 환경변수 로드
    dotenv::dotenv().ok();

    // 2. 설정 파일 로드
    let settings = Settings::new().expect("Failed to load settings");

    // 3. 로거 초기화
    let logger_manager = Arc::new(LoggerManager::setup(&settings));
    info!("Logger initialized");

    // 4. 덱 로드 (시작 시 한 번)
    let catalog = DeckCatalog::load(&settings.storage.deck_path).expect("Failed to load deck");

    // 5. 방 저장소 준비
    let store = FileRoomStore::open(&settings.storage.saves_dir)
        .await
        .expect("Failed to prepare saves directory");
    info!("Room store ready at {}", store.dir().display());

    // 6. 전역 Shutdown Token 생성
    let shutdown_token = CancellationToken::new();

    // 7. Metrics 초기화
    let metrics_registry = prometheus::Registry::new();
    metrics::register_custom_metrics(&metrics_registry)
        .expect("Failed to register custom metrics");
    info!("Metrics initialized and registered");

    // 8. AppState 구성 (RoomEventHub 포함)
    let app_state = AppState::new(
        settings.clone(),
        catalog,
        Arc::new(store),
        shutdown_token,
    )
    .with_logger(logger_manager)
    .with_metrics_registry(metrics_registry);
    let hub = app_state.hub.clone();

    // 9. HTTP 서버 시작
    let bind_address = format!("{}:{}", settings.server.bind_address, settings.server.port);
    info!("Starting HTTP server on {}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(configure)
    })
    .bind(&bind_address)?
    .run();

    info!("Room Server is running on {}", bind_address);

    // 10. 종료 신호 대기
    tokio::select! {
        res = &mut server => {
            error!("Server exited unexpectedly");
            return res;
        },

        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received. Initiating graceful shutdown...");
            // SSE 스트림이 열려 있으면 graceful shutdown 이 끝나지 않는다.
            hub.shutdown();
            server.handle().stop(true).await;
        },
    }

    // 11. 남은 워커 정리 대기
    server.await?;
    info!("System has shut down gracefully");

    Ok(())
}
