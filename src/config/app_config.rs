use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
/// 30일
pub const DEFAULT_JWT_EXPIRATION_SECS: i64 = 30 * 24 * 60 * 60;
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-5-nano";
pub const DEFAULT_OPENAI_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_LOG_DIR: &str = "logs";

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_expiration: i64,

    // AI Service (키가 없으면 정제 없이 템플릿을 그대로 반환)
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_timeout: Duration,

    // Storage (없으면 메모리 저장소만 사용)
    pub database_url: Option<String>,
    pub db_schema_update: bool,

    /// 정제 실패 사유를 응답에 그대로 노출할지 여부
    pub expose_error_details: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiration: DEFAULT_JWT_EXPIRATION_SECS,
            openai_api_key: None,
            openai_model: None,
            openai_timeout: Duration::from_secs(DEFAULT_OPENAI_TIMEOUT_SECS),
            database_url: None,
            db_schema_update: true,
            expose_error_details: true,
        }
    }
}

impl AppConfig {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_port = match non_empty_var("PORT").or_else(|| non_empty_var("SERVER_PORT")) {
            Some(port) => port.parse().map_err(|_| ConfigError::InvalidPort(port))?,
            None => DEFAULT_PORT,
        };

        let jwt_secret = non_empty_var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET is not set, falling back to the development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        let jwt_expiration = match non_empty_var("JWT_EXPIRATION") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("JWT_EXPIRATION", value))?,
            None => DEFAULT_JWT_EXPIRATION_SECS,
        };

        let openai_api_key = unquoted_var("OPENAI_API_KEY");
        let openai_model = unquoted_var("OPENAI_MODEL");

        let openai_timeout = match non_empty_var("OPENAI_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(
                value
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("OPENAI_TIMEOUT_SECS", value))?,
            ),
            None => Duration::from_secs(DEFAULT_OPENAI_TIMEOUT_SECS),
        };

        let database_url = non_empty_var("DATABASE_URL");
        let db_schema_update = parse_bool("DB_SCHEMA_UPDATE")?.unwrap_or(true);

        let production = non_empty_var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let expose_error_details = parse_bool("EXPOSE_ERROR_DETAILS")?.unwrap_or(!production);

        Ok(Self {
            server_port,
            jwt_secret,
            jwt_expiration,
            openai_api_key,
            openai_model,
            openai_timeout,
            database_url,
            db_schema_update,
            expose_error_details,
        })
    }
}

impl AppConfig {
    /// 로그 디렉터리는 로깅 초기화가 설정 로드보다 먼저 필요해 따로 읽는다.
    pub fn log_dir_from_env() -> String {
        non_empty_var("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `.env`에서 값을 따옴표로 감싼 경우를 대비해 앞뒤 따옴표를 제거
fn unquoted_var(key: &str) -> Option<String> {
    let raw = non_empty_var(key)?;
    let cleaned = strip_quotes(&raw);
    if cleaned.len() != raw.len() {
        tracing::info!(variable = key, "Stripped surrounding quotes from environment value");
    }
    Some(cleaned.to_string()).filter(|v| !v.is_empty())
}

pub(crate) fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix(['"', '\'']).unwrap_or(value);
    value.strip_suffix(['"', '\'']).unwrap_or(value)
}

fn parse_bool(key: &'static str) -> Result<Option<bool>, ConfigError> {
    match non_empty_var(key) {
        Some(value) => value
            .trim()
            .to_ascii_lowercase()
            .parse::<bool>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidBool(key, value)),
        None => Ok(None),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(String),
    #[error("Invalid number for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("Invalid boolean for {0}: {1} (use 'true' or 'false')")]
    InvalidBool(&'static str, String),
}
