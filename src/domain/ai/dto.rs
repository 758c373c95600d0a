use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// 프롬프트 생성 요청 DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePromptRequest {
    /// 달성하려는 목표
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing required fields: goal and audience"))]
    #[schema(example = "Write landing copy")]
    pub goal: String,

    /// 대상 독자
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing required fields: goal and audience"))]
    #[schema(example = "founders")]
    pub audience: String,

    /// R.C.C.O / C.A.R.E / T.A.S.K (기본값 R.C.C.O)
    #[schema(example = "TASK")]
    pub framework: Option<String>,

    /// 대상 모델 라벨 (기본값 GPT-4)
    #[serde(alias = "aiModel")]
    #[schema(example = "GPT-4")]
    pub target_model: Option<String>,
}

/// 프롬프트 생성 응답 DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePromptResponse {
    pub prompt: String,
}
