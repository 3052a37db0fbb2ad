//! Account API endpoints.

use axum::extract::State;

use super::{success, ApiResult, FormBody, JsonBody};
use crate::auth::{hash_password, verify_password, Identity};
use crate::errors::AppError;
use crate::models::{AccessToken, LoginForm, RegisterRequest, User};
use crate::validation::RegistrationForm;
use crate::AppState;

const BAD_CREDENTIALS: &str = "Incorrect login or password";

/// Logins are compared case-insensitively.
fn normalize_login(login: &str) -> String {
    login.trim().to_lowercase()
}

/// Run CPU-heavy password work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("Password task failed: {}", e)))
}

/// POST /api/auth/register - Create an account.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> ApiResult<User> {
    let login = normalize_login(&request.login);
    let form = RegistrationForm {
        full_name: request.full_name.clone(),
        login: login.clone(),
        password: request.password.clone(),
        confirm_password: request
            .confirm_password
            .clone()
            .unwrap_or_else(|| request.password.clone()),
    };

    let errors = form.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password = request.password;
    let hash = blocking(move || hash_password(&password)).await??;

    let user = state
        .repo
        .create_user(request.full_name.trim(), &login, &hash, request.role)
        .await?;
    tracing::info!("Registered user {} with role {}", user.id, user.role.as_str());
    success(user)
}

/// POST /api/auth/login - Exchange form-encoded credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    FormBody(form): FormBody<LoginForm>,
) -> ApiResult<AccessToken> {
    let login = normalize_login(&form.username);
    let Some((user, stored_hash)) = state.repo.find_credentials(&login).await? else {
        return Err(AppError::Unauthenticated(BAD_CREDENTIALS.to_string()));
    };

    let password = form.password;
    let valid = blocking(move || verify_password(&password, &stored_hash)).await?;
    if !valid {
        tracing::debug!("Failed login for user {}", user.id);
        return Err(AppError::Unauthenticated(BAD_CREDENTIALS.to_string()));
    }

    let token = state.tokens.issue(&user)?;
    success(AccessToken::bearer(token))
}

/// GET /api/auth/me - The account behind the bearer token.
pub async fn me(identity: Identity) -> ApiResult<User> {
    success(identity.user)
}
