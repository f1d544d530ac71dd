// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BusinessRepository, UserRepository},
    models::{
        auth::{AuthResponse, Claims, User},
        tenancy::Business,
    },
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    business_repo: BusinessRepository,
    jwt_secret: String,
    token_ttl_days: i64,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        business_repo: BusinessRepository,
        jwt_secret: String,
        token_ttl_days: i64,
    ) -> Self {
        Self { user_repo, business_repo, jwt_secret, token_ttl_days }
    }

    /// Hashes on a blocking thread; bcrypt is deliberately slow.
    pub async fn hash_password(password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Password hashing task failed: {}", e))??;
        Ok(hashed)
    }

    /// Logs a user into one business. Every failure looks the same to the caller.
    pub async fn login(&self, username: &str, password: &str, zid: i32) -> Result<AuthResponse, AppError> {
        let business = self
            .business_repo
            .find_active_by_zid(zid)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Password verification task failed: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_superuser && !self.business_repo.user_has_access(user.id, zid).await? {
            tracing::warn!(user = %user.username, zid, "Login refused: no business access");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(user.id, zid)?;
        tracing::info!(user = %user.username, zid, "User logged in");

        let Business { zid, name, .. } = business;
        Ok(AuthResponse { token, zid, business_name: name })
    }

    /// Resolves a bearer token into its user and the business it was issued for.
    pub async fn validate_token(&self, token: &str) -> Result<(User, i32), AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidToken)?;

        Ok((user, token_data.claims.zid))
    }

    /// Access can be revoked after the token was issued.
    pub async fn ensure_business_access(&self, user: &User, zid: i32) -> Result<(), AppError> {
        if self.business_repo.find_active_by_zid(zid).await?.is_none() {
            return Err(AppError::BusinessAccessDenied(zid));
        }
        if user.is_superuser || self.business_repo.user_has_access(user.id, zid).await? {
            return Ok(());
        }
        Err(AppError::BusinessAccessDenied(zid))
    }

    pub fn create_token(&self, user_id: Uuid, zid: i32) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.token_ttl_days);

        let claims = Claims {
            sub: user_id,
            zid,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
