pub mod rate_limit;

use crate::db::DbPool;
use crate::entities::{session, usuario};
use crate::errors::ServiceError;
use argon2::password_hash::PasswordHash;
use argon2::{Argon2, PasswordVerifier};
use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use chrono::{Duration, NaiveDateTime, Utc};
use rate_limit::LoginRateLimiter;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Name of the session cookie issued on login.
pub const SESSION_COOKIE: &str = "pagos.sid";

const GENERIC_LOGIN_ERROR: &str = "Usuario o contraseña incorrectos";

/// The authenticated identity attached to a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    pub rol: String,
}

/// Payload serialized into the `session.sess` column.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct SessionData {
    usuario: Principal,
    login_time: NaiveDateTime,
}

/// Credential verification and session lifecycle, backed by the `usuarios`
/// and `session` tables.
#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
    session_ttl: Duration,
    limiter: LoginRateLimiter,
}

impl AuthService {
    pub fn new(db: DbPool, session_ttl_hours: i64, limiter: LoginRateLimiter) -> Self {
        Self {
            db,
            session_ttl: Duration::hours(session_ttl_hours),
            limiter,
        }
    }

    /// Verifies credentials and opens a session. Failures are deliberately
    /// indistinguishable: unknown user, inactive user and wrong password all
    /// produce the same message.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client_key: &str,
    ) -> Result<(Principal, String), ServiceError> {
        if !self.limiter.check(client_key).await {
            warn!(client_key, "login throttled");
            return Err(ServiceError::RateLimitExceeded);
        }

        let user = usuario::Entity::find()
            .filter(usuario::Column::Username.eq(username))
            .one(&self.db)
            .await?;

        let user = match user.filter(|u| u.activo) {
            Some(user) => user,
            None => return self.fail_attempt(client_key).await,
        };

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            return self.fail_attempt(client_key).await;
        }

        self.limiter.clear(client_key).await;

        let now = Utc::now().naive_utc();
        let mut active: usuario::ActiveModel = user.clone().into();
        active.ultimo_acceso = Set(Some(now));
        active.update(&self.db).await?;

        self.purge_expired(now).await?;

        let principal = Principal {
            username: user.username,
            rol: user.rol,
        };
        let sid = Uuid::new_v4().to_string();
        let sess = serde_json::to_string(&SessionData {
            usuario: principal.clone(),
            login_time: now,
        })
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        session::ActiveModel {
            sid: Set(sid.clone()),
            sess: Set(sess),
            expire: Set(now + self.session_ttl),
        }
        .insert(&self.db)
        .await?;

        info!(username = %principal.username, "login succeeded");
        Ok((principal, sid))
    }

    async fn fail_attempt(&self, client_key: &str) -> Result<(Principal, String), ServiceError> {
        self.limiter.record_failure(client_key).await;
        Err(ServiceError::AuthError(GENERIC_LOGIN_ERROR.to_string()))
    }

    /// Resolves a session id to its principal. Expired sessions count as
    /// absent and are deleted on sight.
    pub async fn authenticate(&self, sid: &str) -> Result<Option<Principal>, ServiceError> {
        let row = session::Entity::find_by_id(sid).one(&self.db).await?;
        let Some(row) = row else { return Ok(None) };

        if row.expire <= Utc::now().naive_utc() {
            session::Entity::delete_by_id(sid).exec(&self.db).await?;
            return Ok(None);
        }

        let data: SessionData = serde_json::from_str(&row.sess)
            .map_err(|e| ServiceError::InternalError(format!("corrupt session payload: {e}")))?;
        Ok(Some(data.usuario))
    }

    /// Tears down a session. Unknown sids are a no-op.
    pub async fn logout(&self, sid: &str) -> Result<(), ServiceError> {
        session::Entity::delete_by_id(sid).exec(&self.db).await?;
        Ok(())
    }

    async fn purge_expired(&self, now: NaiveDateTime) -> Result<(), ServiceError> {
        session::Entity::delete_many()
            .filter(session::Column::Expire.lte(now))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

/// Extractor for handlers that require an authenticated caller. Rejects with
/// 401 when the cookie is missing, unknown or expired.
pub struct CurrentUser(pub Principal);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    crate::AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = crate::AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let sid = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| {
                ServiceError::AuthError("No autorizado. Por favor, inicie sesión.".to_string())
            })?;

        match app.auth.authenticate(&sid).await? {
            Some(principal) => Ok(CurrentUser(principal)),
            None => Err(ServiceError::AuthError(
                "No autorizado. Por favor, inicie sesión.".to_string(),
            )),
        }
    }
}
