use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema, Statement,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::{auth::entity::account, prompt::entity::prompt};

/// 하트비트 주기
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// 영속 저장소 연결 핸들
///
/// 연결 객체와 함께 "live" 플래그를 들고 다닌다. 저장소 호출은 이 플래그만 읽어
/// 영속/메모리 저장소를 고르므로 요청마다 DB 왕복이 발생하지 않는다.
/// 플래그는 백그라운드 하트비트가 갱신하며, 스키마가 준비된 뒤에만 켜진다.
#[derive(Clone)]
pub struct DatabaseHandle {
    conn: DatabaseConnection,
    live: Arc<AtomicBool>,
    schema_synced: Arc<AtomicBool>,
}

impl DatabaseHandle {
    /// 지연 연결로 핸들을 만든다. 기동 시점에 DB가 없어도 실패하지 않는다.
    pub async fn connect(database_url: &str) -> Result<Self, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_owned());
        options
            .connect_lazy(true)
            .acquire_timeout(Duration::from_secs(3))
            .sqlx_logging(false);

        let conn = Database::connect(options).await?;
        Ok(Self::with_live(conn, false))
    }

    /// 이미 연결된 커넥션으로 핸들 생성 (live 상태로 시작)
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self::with_live(conn, true)
    }

    fn with_live(conn: DatabaseConnection, live: bool) -> Self {
        Self {
            conn,
            live: Arc::new(AtomicBool::new(live)),
            schema_synced: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn set_live(&self, live: bool) {
        let previous = self.live.swap(live, Ordering::AcqRel);
        if previous != live {
            if live {
                info!("Durable store is reachable, switching to database backend");
            } else {
                warn!("Durable store unreachable, falling back to in-memory backend");
            }
        }
    }

    /// DB에 ping을 보내고 live 플래그를 갱신한다.
    ///
    /// `ensure_schema`가 true면 스키마 생성이 성공한 뒤에만 live가 된다.
    /// 스키마 생성이 실패하면 메모리 저장소를 계속 사용한다.
    pub async fn probe(&self, ensure_schema: bool) -> bool {
        let ready = self.conn.ping().await.is_ok() && (!ensure_schema || self.ensure_schema().await);
        self.set_live(ready);
        ready
    }

    async fn ensure_schema(&self) -> bool {
        if self.schema_synced.load(Ordering::Acquire) {
            return true;
        }
        match self.sync_schema().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Schema synchronization failed, will retry");
                false
            }
        }
    }

    /// 주기적으로 probe를 수행하는 하트비트 태스크를 띄운다.
    pub fn spawn_heartbeat(&self, interval: Duration, sync_schema: bool) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                handle.probe(sync_schema).await;
            }
        })
    }

    /// 테이블/인덱스 생성 (이미 있으면 무시)
    pub async fn sync_schema(&self) -> Result<(), DbErr> {
        let db = &self.conn;
        let schema = Schema::new(db.get_database_backend());

        info!("Starting database schema synchronization...");

        create_table_if_not_exists(db, &schema, account::Entity).await?;
        create_table_if_not_exists(db, &schema, prompt::Entity).await?;

        // 소유자별 최신순 조회용 인덱스
        create_index_if_not_exists(db, "idx_prompt_user_created", "prompt", &["user_id", "created_at"])
            .await?;
        create_index_if_not_exists(
            db,
            "idx_prompt_session_created",
            "prompt",
            &["session_id", "created_at"],
        )
        .await?;

        self.schema_synced.store(true, Ordering::Release);
        info!("Database schema synchronization completed.");
        Ok(())
    }
}

async fn create_table_if_not_exists<E>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr>
where
    E: sea_orm::EntityTrait,
{
    let backend = db.get_database_backend();
    let create_stmt: Statement =
        backend.build(schema.create_table_from_entity(entity).if_not_exists());

    db.execute(create_stmt).await.map(|_| ()).map_err(|e| {
        tracing::error!(table = entity.table_name(), "Failed to create table: {}", e);
        e
    })
}

async fn create_index_if_not_exists(
    db: &DatabaseConnection,
    index_name: &str,
    table_name: &str,
    columns: &[&str],
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let sql = format!(
        "CREATE INDEX {} ON {} ({})",
        index_name,
        table_name,
        columns.join(", ")
    );
    match db.execute(Statement::from_string(backend, sql)).await {
        Ok(_) => Ok(()),
        Err(e) => {
            // 이미 존재하는 인덱스는 무시 (멱등성)
            let err_str = e.to_string().to_lowercase();
            if err_str.contains("duplicate") || err_str.contains("exists") {
                Ok(())
            } else {
                tracing::error!("Failed to create index {}: {}", index_name, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    async fn sqlite_connection() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        Database::connect(options)
            .await
            .expect("sqlite in-memory connection")
    }

    /// SQLite 인메모리 DB로 live 상태의 핸들을 만든다.
    pub async fn sqlite_handle() -> DatabaseHandle {
        let handle = DatabaseHandle::from_connection(sqlite_connection().await);
        handle.sync_schema().await.expect("schema sync");
        handle
    }

    /// 테이블이 없고 아직 live가 아닌 핸들 (기동 직후 상태)
    pub async fn unsynced_sqlite_handle() -> DatabaseHandle {
        DatabaseHandle::with_live(sqlite_connection().await, false)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, Statement};

    use super::test_support::{sqlite_handle, unsynced_sqlite_handle};
    use crate::domain::prompt::{NewPromptRecord, PromptStore};
    use crate::utils::auth::IdentityContext;

    fn session_record() -> NewPromptRecord {
        NewPromptRecord {
            user_id: None,
            session_id: Some("anon-boot".to_string()),
            framework: None,
            target_model: None,
            goal: None,
            audience: None,
            prompt_text: "p".to_string(),
            meta: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn sync_schema_should_be_idempotent() {
        let handle = sqlite_handle().await;

        assert!(handle.sync_schema().await.is_ok());
    }

    #[tokio::test]
    async fn probe_should_mark_reachable_database_live() {
        let handle = sqlite_handle().await;
        handle.set_live(false);

        assert!(handle.probe(true).await);
        assert!(handle.is_live());
    }

    #[tokio::test]
    async fn probe_should_create_schema_before_going_live() {
        let handle = unsynced_sqlite_handle().await;
        let store = PromptStore::new(Some(handle.clone()));

        assert!(handle.probe(true).await);

        assert_eq!(store.active_backend(), "durable");
        let saved = store.save(session_record()).await.unwrap();
        assert!(saved.id.parse::<i32>().is_ok());
    }

    #[tokio::test]
    async fn failed_schema_sync_should_keep_in_memory_backend() {
        let handle = unsynced_sqlite_handle().await;
        let backend = handle.connection().get_database_backend();
        handle
            .connection()
            .execute(Statement::from_string(backend, "PRAGMA query_only = ON".to_owned()))
            .await
            .unwrap();
        let store = PromptStore::new(Some(handle.clone()));

        assert!(!handle.probe(true).await);

        assert!(!handle.is_live());
        assert_eq!(store.active_backend(), "ephemeral");
        let saved = store.save(session_record()).await.unwrap();
        assert!(saved.id.contains('-'));
        let listed = store
            .list_for(&IdentityContext::Session("anon-boot".to_string()))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn set_live_should_flip_flag() {
        let handle = sqlite_handle().await;

        handle.set_live(false);
        assert!(!handle.is_live());
        handle.set_live(true);
        assert!(handle.is_live());
    }
}
