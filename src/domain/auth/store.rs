use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, NotSet, QueryFilter, Set, SqlErr,
};
use tokio::sync::Mutex;
use tracing::info;

use super::entity::account::{self, Entity as Account};
use crate::config::DatabaseHandle;
use crate::utils::error::AppError;

const DUPLICATE_USERNAME: &str = "Username already exists";

/// 저장된 계정
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<account::Model> for AccountRecord {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.account_id.to_string(),
            username: model.username,
            password_hash: model.password_hash,
            created_at: model.created_at,
        }
    }
}

/// 계정 저장소
///
/// 프롬프트 저장소와 같은 규칙으로 DB가 live면 `account` 테이블,
/// 아니면 프로세스 메모리의 사용자명 맵을 사용한다.
pub struct AccountStore {
    durable: Option<DatabaseHandle>,
    ephemeral: Mutex<HashMap<String, AccountRecord>>,
}

impl AccountStore {
    pub fn new(db: Option<DatabaseHandle>) -> Self {
        Self {
            durable: db,
            ephemeral: Mutex::new(HashMap::new()),
        }
    }

    pub fn ephemeral_only() -> Self {
        Self::new(None)
    }

    fn live_db(&self) -> Option<&DatabaseHandle> {
        self.durable.as_ref().filter(|db| db.is_live())
    }

    /// 새 계정 생성. 사용자명이 이미 있으면 Conflict.
    pub async fn create(&self, username: &str, password_hash: String) -> Result<AccountRecord, AppError> {
        if let Some(db) = self.live_db() {
            let exists = Account::find()
                .filter(account::Column::Username.eq(username))
                .one(db.connection())
                .await?
                .is_some();
            if exists {
                return Err(AppError::conflict(DUPLICATE_USERNAME));
            }

            let model = account::ActiveModel {
                account_id: NotSet,
                username: Set(username.to_string()),
                password_hash: Set(password_hash),
                created_at: Set(Utc::now()),
            }
            .insert(db.connection())
            .await
            .map_err(map_insert_error)?;

            info!(backend = "durable", account_id = model.account_id, "Account created");
            return Ok(AccountRecord::from(model));
        }

        let mut accounts = self.ephemeral.lock().await;
        if accounts.contains_key(username) {
            return Err(AppError::conflict(DUPLICATE_USERNAME));
        }
        let record = AccountRecord {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
            created_at: Utc::now(),
        };
        accounts.insert(username.to_string(), record.clone());

        info!(backend = "ephemeral", account_id = %record.id, "Account created");
        Ok(record)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<AccountRecord>, AppError> {
        if let Some(db) = self.live_db() {
            let model = Account::find()
                .filter(account::Column::Username.eq(username))
                .one(db.connection())
                .await?;
            return Ok(model.map(AccountRecord::from));
        }

        Ok(self.ephemeral.lock().await.get(username).cloned())
    }
}

// 동시 가입 경합으로 unique 제약에 걸린 경우도 중복으로 본다
fn map_insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(DUPLICATE_USERNAME),
        _ => AppError::from(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::database::test_support::sqlite_handle;

    #[tokio::test]
    async fn ephemeral_duplicate_username_should_conflict() {
        let store = AccountStore::ephemeral_only();
        store.create("alice", "hash".to_string()).await.unwrap();

        let result = store.create("alice", "other".to_string()).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn ephemeral_lookup_should_return_created_account() {
        let store = AccountStore::ephemeral_only();
        let created = store.create("bob", "hash".to_string()).await.unwrap();

        let found = store.find_by_username("bob").await.unwrap();

        assert_eq!(found, Some(created));
        assert!(store.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn durable_store_should_create_and_find_accounts() {
        let store = AccountStore::new(Some(sqlite_handle().await));

        let created = store.create("carol", "hash".to_string()).await.unwrap();
        let found = store.find_by_username("carol").await.unwrap().unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash, "hash");
        assert!(matches!(
            store.create("carol", "again".to_string()).await,
            Err(AppError::Conflict(_))
        ));
    }
}
