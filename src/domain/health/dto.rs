use serde::Serialize;
use utoipa::ToSchema;

/// 헬스체크 응답
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// healthy / degraded
    pub status: HealthState,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
    /// 서버 가동 시간 (초)
    #[schema(example = 3600)]
    pub uptime_secs: u64,
    /// 현재 활성 저장소 (durable / ephemeral)
    #[schema(example = "ephemeral")]
    pub storage: &'static str,
    /// 프롬프트 정제 설정 여부 (configured / disabled)
    #[schema(example = "disabled")]
    pub refinement: &'static str,
}

#[derive(Serialize, Debug, PartialEq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    /// DB URL이 설정되었지만 연결되지 않은 상태
    Degraded,
}
