use std::net::SocketAddr;
use std::process::ExitCode;

use prompt_server::config::{database::HEARTBEAT_INTERVAL, AppConfig, DatabaseHandle};
use prompt_server::utils::{logging::init_logging, shutdown::shutdown_signal};
use prompt_server::{create_router, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    // 1. 환경변수 로드
    dotenvy::dotenv().ok();

    // 2. 로깅 초기화 (guard는 main 종료까지 유지)
    let _log_guard = init_logging(&AppConfig::log_dir_from_env());

    // 3. 설정 로드
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    // 4. 영속 저장소 연결 (없거나 실패하면 메모리 저장소로 동작)
    let database = match config.database_url.as_deref() {
        Some(url) => match DatabaseHandle::connect(url).await {
            Ok(handle) => {
                handle.spawn_heartbeat(HEARTBEAT_INTERVAL, config.db_schema_update);
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Database connection setup failed, using in-memory storage");
                None
            }
        },
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory storage");
            None
        }
    };

    // 5. 라우터 설정
    let port = config.server_port;
    let app = create_router(AppState::from_config(config, database));

    // 6. 서버 실행
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Server shut down gracefully");
    ExitCode::SUCCESS
}
