use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::state::AppState;
use crate::utils::auth::{Identity, MaybeIdentity};
use crate::utils::error::AppError;

use super::dto::{NewPromptRecord, PromptRecord, SavePromptRequest};

/// 프롬프트 저장
///
/// 인증 사용자는 사용자 소유로, 익명 요청은 세션 소유로 저장합니다.
#[utoipa::path(
    post,
    path = "/api/prompts",
    tag = "Prompt",
    request_body = SavePromptRequest,
    params(
        ("x-session-id" = Option<String>, Header, description = "익명 세션 ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "저장 성공", body = PromptRecord),
        (status = 400, description = "promptText 누락", body = ErrorResponse),
        (status = 401, description = "식별 정보 없음", body = ErrorResponse),
        (status = 500, description = "저장소 오류", body = ErrorResponse)
    )
)]
pub async fn save_prompt(
    State(state): State<AppState>,
    Identity(identity): Identity,
    request: Result<Json<SavePromptRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PromptRecord>), AppError> {
    let Json(request) = request.map_err(AppError::from)?;
    request.validate()?;

    let record = state
        .prompts
        .save(NewPromptRecord::new(request, &identity))
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// 내 프롬프트 목록 (최신순, 최대 200건)
#[utoipa::path(
    get,
    path = "/api/prompts",
    tag = "Prompt",
    params(
        ("x-session-id" = Option<String>, Header, description = "익명 세션 ID"),
        ("session" = Option<String>, Query, description = "익명 세션 ID (헤더 대체)")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "조회 성공", body = [PromptRecord]),
        (status = 400, description = "식별 정보 없음", body = ErrorResponse)
    )
)]
pub async fn list_prompts(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
) -> Result<Json<Vec<PromptRecord>>, AppError> {
    // 전체 조회는 허용하지 않는다
    let identity = identity.ok_or_else(|| AppError::bad_request("Missing session id"))?;

    let records = state.prompts.list_for(&identity).await?;
    Ok(Json(records))
}

/// 프롬프트 삭제
#[utoipa::path(
    delete,
    path = "/api/prompts/{id}",
    tag = "Prompt",
    params(
        ("id" = String, Path, description = "프롬프트 ID"),
        ("x-session-id" = Option<String>, Header, description = "익명 세션 ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "삭제 성공"),
        (status = 401, description = "식별 정보 없음", body = ErrorResponse),
        (status = 403, description = "소유자가 아님", body = ErrorResponse),
        (status = 404, description = "존재하지 않는 ID", body = ErrorResponse)
    )
)]
pub async fn delete_prompt(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.prompts.delete_one(&id, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
