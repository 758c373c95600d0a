//! 요청자 식별 (Access Gate)
//!
//! 유효한 Bearer 토큰이 있으면 인증 사용자, 없으면 클라이언트가 보낸 세션 ID로 식별한다.
//! 토큰이 잘못되었거나 만료된 경우에도 요청을 거부하지 않고 세션 식별로 넘어간다.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Uri},
};
use serde::Deserialize;

use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::jwt::decode_token;

pub const SESSION_HEADER: &str = "x-session-id";

/// 요청자 식별 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityContext {
    /// 서명 검증된 토큰의 사용자
    User { user_id: String, username: String },
    /// 익명 세션
    Session(String),
}

impl IdentityContext {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            IdentityContext::User { user_id, .. } => Some(user_id),
            IdentityContext::Session(_) => None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            IdentityContext::User { .. } => None,
            IdentityContext::Session(session) => Some(session),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IdentityContext::User { .. } => "user",
            IdentityContext::Session(_) => "session",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session: Option<String>,
}

/// 헤더/쿼리에서 식별 정보를 결정한다. 사용자 토큰이 세션보다 우선한다.
pub fn resolve_identity(headers: &HeaderMap, uri: &Uri, jwt_secret: &str) -> Option<IdentityContext> {
    if let Some(claims) = bearer_token(headers).and_then(|token| decode_token(token, jwt_secret)) {
        return Some(IdentityContext::User {
            user_id: claims.sub,
            username: claims.username,
        });
    }

    session_id(headers, uri).map(IdentityContext::Session)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn session_id(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_header = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(non_blank);

    from_header.or_else(|| {
        Query::<SessionQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(q)| q.session)
            .as_deref()
            .and_then(non_blank)
    })
}

// 헤더/쿼리 모두 앞뒤 공백을 제거한 값을 세션 ID로 사용
fn non_blank(value: &str) -> Option<String> {
    Some(value.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// 식별 정보가 반드시 필요한 핸들러용 Extractor (없으면 401)
pub struct Identity(pub IdentityContext);

/// 식별 정보가 선택인 핸들러용 Extractor (거부하지 않음)
pub struct MaybeIdentity(pub Option<IdentityContext>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = resolve_identity(&parts.headers, &parts.uri, &state.config.jwt_secret);
        if let Some(identity) = &identity {
            tracing::debug!(identity = identity.kind(), "Caller identity resolved");
        }
        Ok(MaybeIdentity(identity))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeIdentity(identity) = MaybeIdentity::from_request_parts(parts, state).await?;
        identity.map(Identity).ok_or_else(|| {
            AppError::unauthorized("Authentication required or provide session id")
        })
    }
}
