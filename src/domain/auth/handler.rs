use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use validator::Validate;

use super::dto::{AuthResponse, LoginRequest, SignupRequest};
use super::service::AuthService;
use crate::state::AppState;
use crate::utils::error::AppError;

/// 회원가입
///
/// 계정을 만들고 바로 사용할 수 있는 Bearer 토큰을 발급합니다.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "가입 성공", body = AuthResponse),
        (status = 400, description = "username/password 누락", body = ErrorResponse),
        (status = 409, description = "이미 존재하는 username", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    request: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(request) = request.map_err(AppError::from)?;
    request.validate()?;

    let response = AuthService::signup(&state, request).await?;
    Ok(Json(response))
}

/// 로그인
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = AuthResponse),
        (status = 400, description = "username/password 누락", body = ErrorResponse),
        (status = 401, description = "잘못된 자격 증명", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(request) = request.map_err(AppError::from)?;
    request.validate()?;

    let response = AuthService::login(&state, request).await?;
    Ok(Json(response))
}
