use axum::{extract::State, Json};

use super::dto::{HealthState, HealthStatus};
use crate::state::AppState;

/// 헬스체크 API
///
/// 서버 상태, 버전, 가동 시간, 사용 중인 저장소와 정제 설정 여부를 반환합니다.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "헬스체크 성공", body = HealthStatus)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(current_status(&state))
}

pub fn current_status(state: &AppState) -> HealthStatus {
    let storage = state.prompts.active_backend();
    let status = if state.config.database_url.is_some() && storage != "durable" {
        HealthState::Degraded
    } else {
        HealthState::Healthy
    };

    HealthStatus {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        storage,
        refinement: if state.refiner.is_configured() {
            "configured"
        } else {
            "disabled"
        },
    }
}
