use std::sync::Arc;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use backoff::ExponentialBackoff;

/// 외부 텍스트 생성 서비스 호출 실패
///
/// 전송 라이브러리의 에러 형태와 무관하게 재시도 여부를 판단할 수 있도록
/// 호출 직후 이 타입으로 변환한다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("rate limited by upstream: {0}")]
    RateLimited(String),
    #[error("upstream server error: {0}")]
    Server(String),
    #[error("connection to upstream failed: {0}")]
    Connection(String),
    #[error("upstream call timed out after {0}s")]
    Timeout(u64),
    #[error("upstream rejected credentials: {0}")]
    Auth(String),
    #[error("upstream rejected request: {0}")]
    InvalidRequest(String),
    #[error("upstream call failed: {0}")]
    Other(String),
}

/// 실패 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retryable,
    Terminal,
}

impl UpstreamError {
    /// Rate limit, 5xx, 연결 끊김, 타임아웃은 재시도
    /// 인증/요청 형식 오류 등은 즉시 실패
    pub fn class(&self) -> FailureClass {
        match self {
            UpstreamError::RateLimited(_)
            | UpstreamError::Server(_)
            | UpstreamError::Connection(_)
            | UpstreamError::Timeout(_) => FailureClass::Retryable,
            UpstreamError::Auth(_) | UpstreamError::InvalidRequest(_) | UpstreamError::Other(_) => {
                FailureClass::Terminal
            }
        }
    }
}

/// OpenAI API 에러 응답의 type/code/message로 분류
pub(crate) fn classify_api_error(err_type: &str, err_code: &str, message: &str) -> UpstreamError {
    let message_lower = message.to_lowercase();

    if err_code.contains("invalid_api_key")
        || err_type == "authentication_error"
        || message_lower.contains("api key")
    {
        UpstreamError::Auth(message.to_string())
    } else if err_type.contains("rate_limit")
        || err_code.contains("rate_limit")
        || message_lower.contains("rate limit")
    {
        UpstreamError::RateLimited(message.to_string())
    } else if err_type == "server_error"
        || err_code.contains("server")
        || message_lower.contains("server error")
        || message_lower.contains("overloaded")
    {
        UpstreamError::Server(message.to_string())
    } else if err_type == "invalid_request_error" {
        UpstreamError::InvalidRequest(message.to_string())
    } else {
        UpstreamError::Other(message.to_string())
    }
}

/// OpenAI 에러를 UpstreamError로 변환
fn classify_openai_error(error: OpenAIError) -> UpstreamError {
    match &error {
        OpenAIError::ApiError(api_err) => {
            let err_type = api_err.r#type.as_deref().unwrap_or("");
            // 에러 코드가 JSON Value일 수 있으므로 문자열로 변환
            let err_code = api_err
                .code
                .as_ref()
                .map(|c| c.to_string())
                .unwrap_or_default();
            classify_api_error(err_type, &err_code, &api_err.message)
        }
        OpenAIError::Reqwest(req_err) => {
            let status = req_err.status().map(|s| s.as_u16());
            if req_err.is_timeout() {
                UpstreamError::Connection(format!("request timed out: {}", req_err))
            } else if req_err.is_connect()
                || req_err.is_request()
                || req_err.is_body()
                || req_err.is_decode()
            {
                UpstreamError::Connection(req_err.to_string())
            } else if status == Some(401) || status == Some(403) {
                UpstreamError::Auth(req_err.to_string())
            } else if status == Some(429) {
                UpstreamError::RateLimited(req_err.to_string())
            } else if status.map(|s| s >= 500).unwrap_or(false) {
                UpstreamError::Server(req_err.to_string())
            } else {
                UpstreamError::Other(req_err.to_string())
            }
        }
        // 에러 응답 본문이 JSON이 아닌 경우 (게이트웨이 HTML/텍스트 5xx 페이지 등)
        OpenAIError::JSONDeserialize(_) => UpstreamError::Server(error.to_string()),
        OpenAIError::InvalidArgument(msg) => UpstreamError::InvalidRequest(msg.clone()),
        _ => UpstreamError::Other(error.to_string()),
    }
}

/// 텍스트 생성 클라이언트 인터페이스
///
/// 테스트에서 Mock 객체로 대체할 수 있도록 호출을 추상화한다.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// 채팅 완성 요청
    ///
    /// 응답에서 비어 있지 않은 첫 번째 텍스트를 반환한다. 텍스트가 없으면 `None`.
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<Option<String>, UpstreamError>;
}

/// Arc로 래핑된 클라이언트 (Clone 지원)
pub type AiClient = Arc<dyn CompletionClient>;

/// OpenAI API 클라이언트 구현체
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        Self::with_config(OpenAIConfig::new().with_api_key(api_key), timeout)
    }

    pub fn with_config(config: OpenAIConfig, timeout: Duration) -> Self {
        // 라이브러리 내장 재시도는 끄고 서비스의 재시도 정책만 적용
        let no_retry = ExponentialBackoff {
            max_elapsed_time: Some(Duration::ZERO),
            ..Default::default()
        };
        Self {
            client: Client::with_config(config).with_backoff(no_retry),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<Option<String>, UpstreamError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(0.2)
            .max_tokens(512_u32)
            .build()
            .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| UpstreamError::Timeout(self.timeout.as_secs()))? // 타임아웃
            .map_err(classify_openai_error)?;

        Ok(response
            .choices
            .iter()
            .filter_map(|choice| choice.message.content.as_deref())
            .map(str::trim)
            .find(|text| !text.is_empty())
            .map(String::from))
    }
}

/// 메시지 빌더 헬퍼 함수 (crate 내부용)
pub(crate) fn build_system_message(content: &str) -> Result<ChatCompletionRequestMessage, UpstreamError> {
    Ok(ChatCompletionRequestSystemMessageArgs::default()
        .content(content)
        .build()
        .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?
        .into())
}

pub(crate) fn build_user_message(content: &str) -> Result<ChatCompletionRequestMessage, UpstreamError> {
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(content)
        .build()
        .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?
        .into())
}
