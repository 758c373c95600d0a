use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use validator::Validate;

use super::entity::prompt;
use crate::utils::auth::IdentityContext;

/// 저장된 프롬프트 레코드
///
/// 생성 후 변경되지 않는다. `id`는 저장소가 부여한 불투명 문자열.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptRecord {
    #[schema(example = "1718000000000-a8Zk2LmQ")]
    pub id: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub framework: Option<String>,
    pub target_model: Option<String>,
    pub goal: Option<String>,
    pub audience: Option<String>,
    pub prompt_text: String,
    #[schema(value_type = Object)]
    pub meta: Value,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl PromptRecord {
    /// 요청자가 이 레코드의 소유자인지 확인
    ///
    /// 사용자 소유 레코드는 해당 사용자만, 세션 레코드는 같은 세션만 접근할 수 있다.
    pub fn is_owned_by(&self, identity: &IdentityContext) -> bool {
        match identity {
            IdentityContext::User { user_id, .. } => self.user_id.as_deref() == Some(user_id),
            IdentityContext::Session(session) => {
                self.user_id.is_none() && self.session_id.as_deref() == Some(session)
            }
        }
    }
}

impl From<prompt::Model> for PromptRecord {
    fn from(model: prompt::Model) -> Self {
        Self {
            id: model.prompt_id.to_string(),
            user_id: model.user_id,
            session_id: model.session_id,
            framework: model.framework,
            target_model: model.target_model,
            goal: model.goal,
            audience: model.audience,
            prompt_text: model.prompt_text,
            meta: model.meta,
            created_at: model.created_at,
        }
    }
}

/// 저장 전 레코드 (id/생성 시각 없음)
#[derive(Debug, Clone, PartialEq)]
pub struct NewPromptRecord {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub framework: Option<String>,
    pub target_model: Option<String>,
    pub goal: Option<String>,
    pub audience: Option<String>,
    pub prompt_text: String,
    pub meta: Value,
}

impl NewPromptRecord {
    /// 요청자 식별 정보로 소유자를 정한다. 소유 필드는 항상 하나만 채워진다.
    pub fn new(request: SavePromptRequest, owner: &IdentityContext) -> Self {
        Self {
            user_id: owner.user_id().map(String::from),
            session_id: owner.session_id().map(String::from),
            framework: request.framework,
            target_model: request.target_model,
            goal: request.goal,
            audience: request.audience,
            prompt_text: request.prompt_text,
            meta: match request.meta {
                Some(Value::Null) | None => json!({}),
                Some(meta) => meta,
            },
        }
    }

    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> PromptRecord {
        PromptRecord {
            id,
            user_id: self.user_id,
            session_id: self.session_id,
            framework: self.framework,
            target_model: self.target_model,
            goal: self.goal,
            audience: self.audience,
            prompt_text: self.prompt_text,
            meta: self.meta,
            created_at,
        }
    }
}

/// 프롬프트 저장 요청 DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavePromptRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "promptText required"))]
    pub prompt_text: String,
    pub framework: Option<String>,
    #[serde(alias = "aiModel")]
    pub target_model: Option<String>,
    pub goal: Option<String>,
    pub audience: Option<String>,
    /// 자유 형식 메타데이터
    #[schema(value_type = Object)]
    pub meta: Option<Value>,
}
