use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::{info, warn};

use super::dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest, MISSING_CREDENTIALS};
use super::store::AccountRecord;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::jwt::encode_token;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService;

impl AuthService {
    /// 회원가입 후 바로 토큰을 발급한다.
    pub async fn signup(state: &AppState, req: SignupRequest) -> Result<AuthResponse, AppError> {
        let username = req
            .normalized_username()
            .ok_or_else(|| AppError::bad_request(MISSING_CREDENTIALS))?
            .to_string();

        let password_hash = hash_password(req.password).await?;
        let account = state.accounts.create(&username, password_hash).await?;

        info!(account_id = %account.id, "Signup succeeded");
        Self::issue(state, account)
    }

    pub async fn login(state: &AppState, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let username = req
            .normalized_username()
            .ok_or_else(|| AppError::bad_request(MISSING_CREDENTIALS))?
            .to_string();

        let Some(account) = state.accounts.find_by_username(&username).await? else {
            warn!("Login rejected: unknown username");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(req.password, account.password_hash.clone()).await? {
            warn!(account_id = %account.id, "Login rejected: password mismatch");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        info!(account_id = %account.id, "Login succeeded");
        Self::issue(state, account)
    }

    fn issue(state: &AppState, account: AccountRecord) -> Result<AuthResponse, AppError> {
        let token = encode_token(
            &account.id,
            &account.username,
            &state.config.jwt_secret,
            state.config.jwt_expiration,
        )?;

        Ok(AuthResponse {
            token,
            user: PublicUser {
                id: account.id,
                username: account.username,
            },
        })
    }
}

/// Argon2 해시 (PHC 문자열). CPU 작업이므로 blocking 풀에서 실행한다.
async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal_error(format!("Password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::internal_error(format!("Hashing task failed: {}", e)))?
}

async fn verify_password(password: String, stored_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored_hash)
            .map_err(|e| AppError::internal_error(format!("Stored hash is malformed: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::internal_error(format!("Verification task failed: {}", e)))?
}
