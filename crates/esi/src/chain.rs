//! Steps that run in front of the account handlers.
//!
//! [`load_accounts`] wraps every `/accounts` route and [`ensure_account`]
//! wraps the single-account routes inside it, so a handler only runs after
//! the steps it depends on have succeeded. Each step passes its result on
//! through request extensions: handlers take [`LoadedAccounts`] or
//! [`EnsuredAccount`], and neither exists unless its step ran.

use axum::Extension;
use axum::extract::{RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use esi_core::{AccountId, AccountTarget, Error};
use tracing::{debug, warn};

use crate::{ApiError, AppState};

/// Snapshot of the store directory taken once per request.
#[derive(Debug, Clone)]
pub struct LoadedAccounts {
    /// Ids in the store, sorted.
    pub ids: Vec<AccountId>,
    /// Account named by the `id` path parameter, if the route has one.
    pub target: Option<AccountTarget>,
}

impl LoadedAccounts {
    /// Whether the snapshot holds `id`.
    #[must_use]
    pub fn contains(&self, id: &AccountId) -> bool {
        self.ids.contains(id)
    }
}

/// Account named by the route and present in the snapshot.
#[derive(Debug, Clone)]
pub struct EnsuredAccount(pub AccountTarget);

/// Enumerate the store and resolve the addressed account.
///
/// # Errors
///
/// Fails with [`Error::StoreUnavailable`] if the directory cannot be read.
pub async fn load_accounts(
    State(state): State<AppState>,
    params: RawPathParams,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let store = state.store();
    let ids = store.list().await.inspect_err(|error| {
        warn!(%error, dir = %store.dir().display(), "load_accounts: unable to read store");
    })?;
    let target = params
        .iter()
        .find(|(key, _)| *key == "id")
        .map(|(_, id)| store.resolve(AccountId::new(id)));

    debug!(
        accounts = ids.len(),
        target = ?target.as_ref().map(AccountTarget::id),
        "load_accounts: done"
    );
    request
        .extensions_mut()
        .insert(LoadedAccounts { ids, target });

    Ok(next.run(request).await)
}

/// Stop with [`Error::AccountNotFound`] unless the addressed account was
/// loaded.
///
/// # Errors
///
/// Fails with [`Error::AccountNotFound`] if the id is not in the snapshot.
pub async fn ensure_account(
    Extension(loaded): Extension<LoadedAccounts>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(target) = loaded.target {
        if !loaded.ids.contains(target.id()) {
            warn!(id = %target.id(), "ensure_account: not found");
            return Err(Error::AccountNotFound(target.id().clone()).into());
        }
        request.extensions_mut().insert(EnsuredAccount(target));
    }

    Ok(next.run(request).await)
}
