use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use validator::Validate;

use crate::state::AppState;
use crate::utils::error::AppError;

use super::dto::{GeneratePromptRequest, GeneratePromptResponse};
use super::prompt::{build_prompt, Framework, DEFAULT_TARGET_MODEL};
use super::service::RefinementOutcome;

/// 프롬프트 생성
///
/// 목표/대상으로 프레임워크 템플릿을 채우고, API 키가 설정되어 있으면 외부 서비스로 정제합니다.
/// 정제에 실패하면 502와 함께 정제 전 프롬프트를 `prompt` 필드로 돌려줍니다.
#[utoipa::path(
    post,
    path = "/api/generate-prompt",
    tag = "Prompt",
    request_body = GeneratePromptRequest,
    responses(
        (status = 200, description = "생성 성공", body = GeneratePromptResponse),
        (status = 400, description = "goal/audience 누락", body = ErrorResponse),
        (status = 502, description = "정제 실패 (대체 프롬프트 포함)", body = ErrorResponse)
    )
)]
pub async fn generate_prompt(
    State(state): State<AppState>,
    request: Result<Json<GeneratePromptRequest>, JsonRejection>,
) -> Result<Json<GeneratePromptResponse>, AppError> {
    // JSON 파싱 에러 처리
    let Json(request) = request.map_err(AppError::from)?;

    // 입력 검증
    request.validate()?;

    let framework = Framework::parse(request.framework.as_deref());
    let target_model = request
        .target_model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_TARGET_MODEL);

    tracing::info!(
        framework = framework.as_str(),
        target_model,
        goal_length = request.goal.len(),
        "Generate prompt request received"
    );

    let raw_prompt = build_prompt(
        &request.goal,
        &request.audience,
        request.target_model.as_deref(),
        request.framework.as_deref(),
    );

    match state.refiner.refine(&raw_prompt, target_model).await {
        RefinementOutcome::Refined(prompt) => {
            tracing::info!(prompt_length = prompt.len(), "Prompt generated");
            Ok(Json(GeneratePromptResponse { prompt }))
        }
        RefinementOutcome::Unrefined { original, reason } => Err(AppError::UpstreamFailure {
            reason,
            prompt: original,
        }),
    }
}
