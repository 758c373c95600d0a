use std::sync::Arc;
use std::time::Instant;

use crate::config::{AppConfig, DatabaseHandle};
use crate::domain::ai::PromptRefiner;
use crate::domain::auth::AccountStore;
use crate::domain::prompt::PromptStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub refiner: Arc<PromptRefiner>,
    pub prompts: Arc<PromptStore>,
    pub accounts: Arc<AccountStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        refiner: PromptRefiner,
        prompts: PromptStore,
        accounts: AccountStore,
    ) -> Self {
        Self {
            config: Arc::new(config),
            refiner: Arc::new(refiner),
            prompts: Arc::new(prompts),
            accounts: Arc::new(accounts),
            started_at: Instant::now(),
        }
    }

    /// 설정과 (선택적) DB 핸들로 상태를 구성한다.
    pub fn from_config(config: AppConfig, db: Option<DatabaseHandle>) -> Self {
        let refiner = PromptRefiner::from_config(&config);
        let prompts = PromptStore::new(db.clone());
        let accounts = AccountStore::new(db);
        Self::new(config, refiner, prompts, accounts)
    }
}
