//! 프롬프트 저장소
//!
//! 영속(DB) 저장소와 프로세스 메모리 저장소를 하나의 인터페이스로 감싼다.
//! 어느 쪽을 쓸지는 호출마다 DB live 플래그를 읽어 결정한다.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, NotSet, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::dto::{NewPromptRecord, PromptRecord};
use super::entity::prompt::{self, Entity as Prompt};
use crate::config::DatabaseHandle;
use crate::utils::auth::IdentityContext;
use crate::utils::error::AppError;

/// 목록 조회 최대 건수
pub const LIST_LIMIT: usize = 200;

/// 메모리 저장소 최대 보관 건수
pub const EPHEMERAL_CAPACITY: usize = 500;

const NOT_FOUND_MESSAGE: &str = "Not found";
const FORBIDDEN_MESSAGE: &str = "Not allowed";

#[async_trait]
pub trait PromptBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn insert(&self, record: NewPromptRecord) -> Result<PromptRecord, AppError>;

    /// 소유자 기준 최신순 조회
    async fn list_owned(
        &self,
        identity: &IdentityContext,
        limit: usize,
    ) -> Result<Vec<PromptRecord>, AppError>;

    /// 소유권 확인 후 삭제 (없으면 NotFound, 소유자가 아니면 Forbidden)
    async fn delete_owned(&self, id: &str, identity: &IdentityContext) -> Result<(), AppError>;
}

/// DB 저장소
pub struct DurableStore {
    db: DatabaseHandle,
}

impl DurableStore {
    pub fn new(db: DatabaseHandle) -> Self {
        Self { db }
    }

    pub fn is_live(&self) -> bool {
        self.db.is_live()
    }
}

fn owner_condition(identity: &IdentityContext) -> Condition {
    match identity {
        IdentityContext::User { user_id, .. } => {
            Condition::all().add(prompt::Column::UserId.eq(user_id.as_str()))
        }
        IdentityContext::Session(session) => Condition::all()
            .add(prompt::Column::SessionId.eq(session.as_str()))
            .add(prompt::Column::UserId.is_null()),
    }
}

#[async_trait]
impl PromptBackend for DurableStore {
    fn name(&self) -> &'static str {
        "durable"
    }

    async fn insert(&self, record: NewPromptRecord) -> Result<PromptRecord, AppError> {
        let model = prompt::ActiveModel {
            prompt_id: NotSet,
            user_id: Set(record.user_id),
            session_id: Set(record.session_id),
            framework: Set(record.framework),
            target_model: Set(record.target_model),
            goal: Set(record.goal),
            audience: Set(record.audience),
            prompt_text: Set(record.prompt_text),
            meta: Set(record.meta),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.connection())
        .await?;

        Ok(PromptRecord::from(model))
    }

    async fn list_owned(
        &self,
        identity: &IdentityContext,
        limit: usize,
    ) -> Result<Vec<PromptRecord>, AppError> {
        let models = Prompt::find()
            .filter(owner_condition(identity))
            .order_by_desc(prompt::Column::CreatedAt)
            .order_by_desc(prompt::Column::PromptId)
            .limit(limit as u64)
            .all(self.db.connection())
            .await?;

        Ok(models.into_iter().map(PromptRecord::from).collect())
    }

    async fn delete_owned(&self, id: &str, identity: &IdentityContext) -> Result<(), AppError> {
        // 숫자가 아닌 id는 DB에 존재할 수 없다
        let prompt_id: i32 = id
            .parse()
            .map_err(|_| AppError::not_found(NOT_FOUND_MESSAGE))?;

        let record = Prompt::find_by_id(prompt_id)
            .one(self.db.connection())
            .await?
            .map(PromptRecord::from)
            .ok_or_else(|| AppError::not_found(NOT_FOUND_MESSAGE))?;

        if !record.is_owned_by(identity) {
            return Err(AppError::forbidden(FORBIDDEN_MESSAGE));
        }

        Prompt::delete_by_id(prompt_id)
            .exec(self.db.connection())
            .await?;
        Ok(())
    }
}

/// 프로세스 메모리 저장소 (재시작 시 소멸)
///
/// 삽입 순서를 유지하며 용량을 넘으면 가장 오래된 레코드부터 버린다.
/// 모든 변경은 하나의 Mutex 아래에서 일어나므로 용량 불변식과 id 유일성이 유지된다.
pub struct EphemeralStore {
    records: Mutex<VecDeque<PromptRecord>>,
    capacity: usize,
}

impl Default for EphemeralStore {
    fn default() -> Self {
        Self::with_capacity(EPHEMERAL_CAPACITY)
    }
}

impl EphemeralStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(EPHEMERAL_CAPACITY))),
            capacity,
        }
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

/// `<unix-millis>-<영숫자 8자>` 형식의 id
fn generate_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

#[async_trait]
impl PromptBackend for EphemeralStore {
    fn name(&self) -> &'static str {
        "ephemeral"
    }

    async fn insert(&self, record: NewPromptRecord) -> Result<PromptRecord, AppError> {
        let mut records = self.records.lock().await;

        let mut id = generate_id();
        while records.iter().any(|r| r.id == id) {
            id = generate_id();
        }

        let stored = record.into_record(id, Utc::now());
        records.push_back(stored.clone());
        while records.len() > self.capacity {
            if let Some(evicted) = records.pop_front() {
                debug!(id = %evicted.id, "Evicted oldest in-memory prompt");
            }
        }

        Ok(stored)
    }

    async fn list_owned(
        &self,
        identity: &IdentityContext,
        limit: usize,
    ) -> Result<Vec<PromptRecord>, AppError> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.is_owned_by(identity))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_owned(&self, id: &str, identity: &IdentityContext) -> Result<(), AppError> {
        let mut records = self.records.lock().await;

        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::not_found(NOT_FOUND_MESSAGE))?;

        if !records[index].is_owned_by(identity) {
            return Err(AppError::forbidden(FORBIDDEN_MESSAGE));
        }

        records.remove(index);
        Ok(())
    }
}

/// 프롬프트 저장소 진입점
pub struct PromptStore {
    durable: Option<DurableStore>,
    ephemeral: EphemeralStore,
}

impl PromptStore {
    /// DB 핸들이 없으면 메모리 저장소만 사용한다.
    pub fn new(db: Option<DatabaseHandle>) -> Self {
        Self {
            durable: db.map(DurableStore::new),
            ephemeral: EphemeralStore::default(),
        }
    }

    pub fn ephemeral_only() -> Self {
        Self::new(None)
    }

    /// 이번 호출에 사용할 저장소
    fn backend(&self) -> &dyn PromptBackend {
        match &self.durable {
            Some(durable) if durable.is_live() => durable,
            _ => &self.ephemeral,
        }
    }

    /// 현재 활성 저장소 이름 (`durable` / `ephemeral`)
    pub fn active_backend(&self) -> &'static str {
        self.backend().name()
    }

    pub async fn save(&self, record: NewPromptRecord) -> Result<PromptRecord, AppError> {
        let backend = self.backend();
        let stored = backend.insert(record).await?;
        info!(backend = backend.name(), id = %stored.id, "Prompt saved");
        Ok(stored)
    }

    /// 요청자 소유 레코드를 최신순으로 최대 200건 반환
    pub async fn list_for(&self, identity: &IdentityContext) -> Result<Vec<PromptRecord>, AppError> {
        let backend = self.backend();
        let records = backend.list_owned(identity, LIST_LIMIT).await?;
        debug!(
            backend = backend.name(),
            identity = identity.kind(),
            count = records.len(),
            "Prompts listed"
        );
        Ok(records)
    }

    pub async fn delete_one(&self, id: &str, identity: &IdentityContext) -> Result<(), AppError> {
        let backend = self.backend();
        backend.delete_owned(id, identity).await?;
        info!(backend = backend.name(), id = %id, "Prompt deleted");
        Ok(())
    }
}
