use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const MISSING_CREDENTIALS: &str = "Missing username or password";

/// 회원가입 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing username or password"))]
    #[schema(example = "alice")]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing username or password"))]
    pub password: String,
}

/// 로그인 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing username or password"))]
    #[schema(example = "alice")]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing username or password"))]
    pub password: String,
}

impl SignupRequest {
    /// 공백만 있는 사용자명은 누락으로 본다.
    pub fn normalized_username(&self) -> Option<&str> {
        non_blank(&self.username)
    }
}

impl LoginRequest {
    pub fn normalized_username(&self) -> Option<&str> {
        non_blank(&self.username)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

/// 외부에 노출되는 사용자 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
}

/// 회원가입/로그인 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer 토큰
    pub token: String,
    pub user: PublicUser,
}
