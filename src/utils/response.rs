use serde::Serialize;
use utoipa::ToSchema;

/// 에러 응답 구조체
///
/// 형식:
/// ```json
/// {
///   "isSuccess": false,
///   "code": "PROMPT502",
///   "error": "Prompt refinement failed",
///   "details": "...",
///   "prompt": "..."
/// }
/// ```
///
/// `details`, `prompt`는 정제 실패 응답에만 포함된다.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[schema(example = false)]
    pub is_success: bool,
    #[schema(example = "COMMON400")]
    pub code: String,
    #[schema(example = "Missing required fields: goal and audience")]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// 정제되지 않은 템플릿 프롬프트 (대체 결과)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl ErrorResponse {
    /// 에러 응답 생성
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            is_success: false,
            code: code.into(),
            error: error.into(),
            details: None,
            prompt: None,
        }
    }

    pub fn with_fallback(mut self, details: impl Into<String>, prompt: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self.prompt = Some(prompt.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_format() {
        let response = ErrorResponse::new("COMMON404", "Not found");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["isSuccess"], false);
        assert_eq!(json["code"], "COMMON404");
        assert_eq!(json["error"], "Not found");
        assert!(json.get("details").is_none());
        assert!(json.get("prompt").is_none());
    }

    #[test]
    fn test_fallback_fields_are_serialized() {
        let response = ErrorResponse::new("PROMPT502", "Prompt refinement failed")
            .with_fallback("rate limited", "Task: write copy.");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["details"], "rate limited");
        assert_eq!(json["prompt"], "Task: write copy.");
    }
}
