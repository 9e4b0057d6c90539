//! Front-side authentication: the single static shared secret `spec.md` §1
//! allows ("auth beyond a static shared secret or dev-mode bypass" is a
//! non-goal). Grounded in the teacher's own `authentication` module
//! (strategy + generic manager), wired here as an axum middleware instead
//! of left unused.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

// Layer 3: Internal module imports
use goblin_core::authentication::strategies::apikey::{
    ApiKeyAuthData, ApiKeyRequest, ApiKeySource, ApiKeyStrategy, InMemoryApiKeyValidator,
};
use goblin_core::authentication::{AuthContext, AuthMethod, AuthRequest, AuthenticationManager};
use goblin_core::config::AuthMode;

pub type ApiKeyManager = AuthenticationManager<ApiKeyStrategy<InMemoryApiKeyValidator>, ApiKeyRequest, ApiKeyAuthData>;

/// Build the manager for a config snapshot's `auth` section, or `None` when
/// `auth.mode` is the explicit dev-mode bypass.
pub fn build_manager(mode: AuthMode, api_key: Option<&str>) -> Option<ApiKeyManager> {
    let key = match mode {
        AuthMode::None => return None,
        AuthMode::Apikey => api_key?,
    };

    let mut valid_keys = HashMap::new();
    valid_keys.insert(
        key.to_string(),
        AuthContext::new(
            AuthMethod::new("apikey"),
            ApiKeyAuthData { key_id: "configured".to_string(), source: ApiKeySource::AuthorizationBearer },
        ),
    );
    let validator = InMemoryApiKeyValidator::new(valid_keys);
    Some(AuthenticationManager::new(ApiKeyStrategy::new(validator)))
}

/// Wraps one incoming request's headers so the strategy's `AuthRequest`
/// interface can pull the bearer/`x-api-key` value out without this module
/// needing to know anything about the strategy's internals.
struct HeaderAuthRequest {
    inner: ApiKeyRequest,
}

impl AuthRequest<ApiKeyRequest> for HeaderAuthRequest {
    fn custom_attribute(&self, _key: &str) -> Option<String> {
        None
    }

    fn custom_attributes(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn inner(&self) -> &ApiKeyRequest {
        &self.inner
    }
}

fn extract_api_key(request: &Request) -> Option<ApiKeyRequest> {
    let headers = request.headers();

    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(key) = value.strip_prefix("Bearer ") {
            return Some(ApiKeyRequest {
                api_key: key.to_string(),
                source: ApiKeySource::AuthorizationBearer,
                metadata: HashMap::new(),
            });
        }
    }

    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(ApiKeyRequest {
            api_key: key.to_string(),
            source: ApiKeySource::Header("x-api-key".to_string()),
            metadata: HashMap::new(),
        });
    }

    None
}

/// Axum middleware: no-op when `auth` is `None` (dev-mode bypass), otherwise
/// requires a valid `Authorization: Bearer <key>` or `X-API-Key` header.
pub async fn require_api_key(
    State(manager): State<Arc<Option<ApiKeyManager>>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(manager) = manager.as_ref() else {
        return Ok(next.run(request).await);
    };

    let Some(api_key_request) = extract_api_key(&request) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let auth_request = HeaderAuthRequest { inner: api_key_request };
    match manager.authenticate(&auth_request).await {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}
