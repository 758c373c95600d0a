use std::sync::Arc;

use crate::config::app_config::{AppConfig, DEFAULT_OPENAI_MODEL};

use super::client::{build_system_message, build_user_message, AiClient, OpenAiClient};
use super::retry::{with_retry, RetryPolicy};

pub const REFINER_SYSTEM_PROMPT: &str = "Act as an expert Prompt Engineer";

/// API 키 미설정 시 템플릿 뒤에 붙는 안내 문구
pub const UNREFINED_NOTE: &str =
    "[Note: OpenAI API key not configured - returning generated template.]";

/// 운영 환경에서 사용하는 일반화된 실패 사유
pub const GENERIC_FAILURE_REASON: &str = "Prompt refinement is temporarily unavailable";

/// 정제 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefinementOutcome {
    /// 정제 성공, 또는 정제 없이 사용 가능한 텍스트 (키 미설정/빈 응답)
    Refined(String),
    /// 재시도 소진 또는 재시도 불가 실패. 원본 템플릿을 함께 돌려준다.
    Unrefined { original: String, reason: String },
}

/// 템플릿 프롬프트를 외부 텍스트 생성 서비스로 다듬는 서비스
pub struct PromptRefiner {
    client: Option<AiClient>,
    default_model: String,
    model_override: Option<String>,
    policy: RetryPolicy,
    expose_error_details: bool,
}

impl PromptRefiner {
    pub fn new(client: Option<AiClient>, policy: RetryPolicy, expose_error_details: bool) -> Self {
        Self {
            client,
            default_model: DEFAULT_OPENAI_MODEL.to_string(),
            model_override: None,
            policy,
            expose_error_details,
        }
    }

    /// 설정값으로 생성. API 키가 없으면 클라이언트 없이 동작한다.
    pub fn from_config(config: &AppConfig) -> Self {
        let client = config.openai_api_key.as_deref().map(|key| {
            Arc::new(OpenAiClient::new(key, config.openai_timeout)) as AiClient
        });
        tracing::info!(
            refinement_configured = client.is_some(),
            model_override = config.openai_model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL),
            "Prompt refiner initialized"
        );

        let mut refiner = Self::new(client, RetryPolicy::default(), config.expose_error_details);
        refiner.model_override = config.openai_model.clone();
        refiner
    }

    pub fn with_model_override(mut self, model: impl Into<String>) -> Self {
        self.model_override = Some(model.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// 대상 모델 힌트가 GPT 계열일 때만 모델 오버라이드를 적용한다.
    pub fn resolve_model(&self, target_model: &str) -> &str {
        if target_model.to_lowercase().contains("gpt") {
            self.model_override.as_deref().unwrap_or(&self.default_model)
        } else {
            &self.default_model
        }
    }

    pub async fn refine(&self, raw_prompt: &str, target_model: &str) -> RefinementOutcome {
        let Some(client) = self.client.as_ref() else {
            return RefinementOutcome::Refined(format!("{} \n\n{}", raw_prompt, UNREFINED_NOTE));
        };

        let messages = match (
            build_system_message(REFINER_SYSTEM_PROMPT),
            build_user_message(&format!(
                "Refine this prompt for clarity, structure, and effectiveness:\n\n{}",
                raw_prompt
            )),
        ) {
            (Ok(system), Ok(user)) => vec![system, user],
            (Err(e), _) | (_, Err(e)) => return self.unrefined(raw_prompt, e.to_string()),
        };

        let model = self.resolve_model(target_model);
        tracing::info!(model, max_attempts = self.policy.max_attempts, "Calling refinement service");

        let result = with_retry(self.policy, || {
            let client = Arc::clone(client);
            let messages = messages.clone();
            async move { client.complete(model, messages).await }
        })
        .await;

        match result {
            Ok(Some(refined)) => RefinementOutcome::Refined(refined),
            Ok(None) => {
                tracing::warn!("Refinement response carried no text, returning template");
                RefinementOutcome::Refined(raw_prompt.to_string())
            }
            Err(e) => self.unrefined(raw_prompt, e.to_string()),
        }
    }

    fn unrefined(&self, raw_prompt: &str, detail: String) -> RefinementOutcome {
        tracing::error!(error = %detail, "Prompt refinement failed");
        let reason = if self.expose_error_details {
            detail
        } else {
            GENERIC_FAILURE_REASON.to_string()
        };
        RefinementOutcome::Unrefined {
            original: raw_prompt.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ai::client::{MockCompletionClient, UpstreamError};

    const RAW: &str = "Task: Write landing copy. Audience: founders.";

    fn refiner_with(mock: MockCompletionClient, expose: bool) -> PromptRefiner {
        PromptRefiner::new(Some(Arc::new(mock)), RetryPolicy::immediate(3), expose)
    }

    #[tokio::test]
    async fn should_return_annotated_template_without_client() {
        let refiner = PromptRefiner::new(None, RetryPolicy::immediate(3), true);

        let outcome = refiner.refine(RAW, "GPT-4").await;

        match outcome {
            RefinementOutcome::Refined(text) => {
                assert!(text.starts_with(RAW));
                assert!(text.ends_with(UNREFINED_NOTE));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn should_return_refined_text_on_success() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(1)
            .returning(|_, _| Ok(Some("Refined prompt".to_string())));

        let outcome = refiner_with(mock, true).refine(RAW, "GPT-4").await;

        assert_eq!(outcome, RefinementOutcome::Refined("Refined prompt".to_string()));
    }

    #[tokio::test]
    async fn should_fall_back_to_template_when_response_has_no_text() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete().times(1).returning(|_, _| Ok(None));

        let outcome = refiner_with(mock, true).refine(RAW, "GPT-4").await;

        assert_eq!(outcome, RefinementOutcome::Refined(RAW.to_string()));
    }

    #[tokio::test]
    async fn retryable_failure_should_attempt_three_times() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(3)
            .returning(|_, _| Err(UpstreamError::RateLimited("slow down".to_string())));

        let outcome = refiner_with(mock, true).refine(RAW, "GPT-4").await;

        match outcome {
            RefinementOutcome::Unrefined { original, reason } => {
                assert_eq!(original, RAW);
                assert!(reason.contains("slow down"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn terminal_failure_should_attempt_once() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(1)
            .returning(|_, _| Err(UpstreamError::Auth("invalid api key".to_string())));

        let outcome = refiner_with(mock, true).refine(RAW, "GPT-4").await;

        assert!(matches!(outcome, RefinementOutcome::Unrefined { .. }));
    }

    #[tokio::test]
    async fn failure_reason_should_be_generic_when_details_hidden() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .times(1)
            .returning(|_, _| Err(UpstreamError::InvalidRequest("secret detail".to_string())));

        let outcome = refiner_with(mock, false).refine(RAW, "GPT-4").await;

        assert_eq!(
            outcome,
            RefinementOutcome::Unrefined {
                original: RAW.to_string(),
                reason: GENERIC_FAILURE_REASON.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn should_pass_resolved_model_to_client() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete()
            .withf(|model, messages| model.to_string() == "gpt-4o-mini" && messages.len() == 2)
            .times(1)
            .returning(|_, _| Ok(Some("ok".to_string())));

        let refiner = refiner_with(mock, true).with_model_override("gpt-4o-mini");
        let outcome = refiner.refine(RAW, "GPT-4").await;

        assert_eq!(outcome, RefinementOutcome::Refined("ok".to_string()));
    }

    #[test]
    fn model_override_should_apply_only_to_gpt_targets() {
        let refiner = PromptRefiner::new(None, RetryPolicy::default(), true)
            .with_model_override("gpt-4o");

        assert_eq!(refiner.resolve_model("GPT-4"), "gpt-4o");
        assert_eq!(refiner.resolve_model("Claude"), DEFAULT_OPENAI_MODEL);
    }
}
