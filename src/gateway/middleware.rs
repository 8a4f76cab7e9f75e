//! Session validation for the protected API prefix.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::config::{AppConfig, ShopDomain};
use crate::gateway::context::{query_shop, resolve_context, ContextSource, RequestKind};
use crate::gateway::error::{GatewayError, Reauthorize};
use crate::gateway::install_gate::shop_session;
use crate::gateway::state::AppState;

/// Resolves the caller's session and attaches it to the request.
///
/// On success the [`Session`](crate::auth::Session) and the
/// [`ShopContext`](crate::gateway::ShopContext) are inserted into the
/// request extensions. A bare `shop` parameter resolves through
/// [`shop_session`], which also accepts per-user sessions. Otherwise the
/// request short-circuits: API calls get 401 with re-authorization headers,
/// navigations are redirected into OAuth.
///
/// # Errors
///
/// - [`GatewayError::AuthenticationMissing`] when no context or no stored
///   session exists
/// - [`GatewayError::AuthenticationInvalid`] when a credential is rejected,
///   shops disagree or the session is expired or lacks scopes
/// - [`GatewayError::Store`] when the store fails
pub async fn validate_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let config = state.config();
    let kind = RequestKind::of(req.headers());

    let mut context = match resolve_context(req.headers(), req.uri(), config) {
        Ok(Some(context)) => context,
        Ok(None) => {
            return Err(GatewayError::AuthenticationMissing {
                reauthorize: reauthorize(config, kind, None),
            })
        }
        Err(e) => {
            let shop = query_shop(req.uri()).and_then(Result::ok);
            return Err(GatewayError::AuthenticationInvalid {
                reason: e.to_string(),
                reauthorize: reauthorize(config, kind, shop.as_ref()),
            });
        }
    };

    let stored = match context.source {
        ContextSource::ShopParam => {
            shop_session(state.sessions(), &context.shop, config.shopify().scopes()).await?
        }
        ContextSource::SessionToken | ContextSource::Cookie => {
            state.sessions().load_session(&context.session_id).await?
        }
    };
    let Some(session) = stored else {
        return Err(GatewayError::AuthenticationMissing {
            reauthorize: reauthorize(config, kind, Some(&context.shop)),
        });
    };

    if session.shop != context.shop {
        return Err(GatewayError::AuthenticationInvalid {
            reason: "stored session belongs to another shop".to_string(),
            reauthorize: reauthorize(config, kind, Some(&context.shop)),
        });
    }
    if !session.is_active(config.shopify().scopes()) {
        return Err(GatewayError::AuthenticationInvalid {
            reason: "session expired or missing scopes".to_string(),
            reauthorize: reauthorize(config, kind, Some(&context.shop)),
        });
    }

    context.session_id.clone_from(&session.id);
    tracing::debug!(shop = %context.shop, source = ?context.source, "session validated");
    req.extensions_mut().insert(session);
    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// `<auth path>?shop=<shop>`.
pub(crate) fn auth_url(config: &AppConfig, shop: &ShopDomain) -> String {
    format!(
        "{}?shop={}",
        config.auth_path(),
        urlencoding::encode(shop.as_ref())
    )
}

fn reauthorize(config: &AppConfig, kind: RequestKind, shop: Option<&ShopDomain>) -> Reauthorize {
    Reauthorize {
        url: shop.map(|shop| auth_url(config, shop)),
        navigation: kind == RequestKind::Navigation,
    }
}
