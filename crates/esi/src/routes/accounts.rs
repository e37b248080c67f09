//! Account resource handlers.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use esi_core::{
    Account, AccountId, Error, IncomingServer, OutgoingServer, ValidationError, validate_name,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::params::accepts_json;
use crate::{ApiError, AppState, EnsuredAccount, LoadedAccounts, Params};

/// `POST /accounts`: create an account named by the `name` parameter.
pub async fn create_account(
    State(state): State<AppState>,
    Extension(loaded): Extension<LoadedAccounts>,
    params: Params,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let Some(name) = params.get("name") else {
        warn!(params = ?params.names(), "create_account: missing name");
        return Err(Error::MissingName.into());
    };

    let id = validate_name(name).map_err(|reason| {
        warn!(name, %reason, "create_account: invalid name");
        match reason {
            ValidationError::EmptyName => Error::MissingName,
            reason => Error::InvalidName {
                name: name.to_owned(),
                reason,
            },
        }
    })?;

    if loaded.contains(&id) {
        warn!(%id, "create_account: already exists");
        return Err(Error::AccountExists(id).into());
    }

    let mut account = Account::new(id);
    account.email_address = params
        .get("emailAddress")
        .or_else(|| params.get("email_address"))
        .map(str::to_owned);
    account.outgoing_server = params.field::<OutgoingServer>("outgoingServer");
    account.incoming_server = params.field::<IncomingServer>("incomingServer");

    state
        .store()
        .create(&account)
        .await
        .inspect_err(|error| warn!(%error, "create_account: unable to save"))?;

    debug!(id = %account.id, "create_account: done");
    Ok((StatusCode::CREATED, Json(account)))
}

/// `GET /accounts`: the ids loaded for this request.
pub async fn list_accounts(
    Extension(loaded): Extension<LoadedAccounts>,
) -> Json<Vec<AccountId>> {
    Json(loaded.ids)
}

/// `GET /accounts/{id}`.
///
/// Clients that accept JSON get the file streamed as it is read; others get
/// it parsed and serialized again.
pub async fn get_account(
    State(state): State<AppState>,
    Extension(EnsuredAccount(target)): Extension<EnsuredAccount>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if accepts_json(&headers) {
        let file = state.store().open(&target).await.inspect_err(|error| {
            warn!(%error, id = %target.id(), "get_account: unable to open");
        })?;
        let body = Body::from_stream(ReaderStream::new(file));
        return Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response());
    }

    let account = state.store().read(&target).await.inspect_err(|error| {
        warn!(%error, id = %target.id(), "get_account: unable to read");
    })?;
    Ok(Json(account).into_response())
}

/// `PUT /accounts/{id}`: overwrite the account with the request body.
pub async fn put_account(
    State(state): State<AppState>,
    Extension(EnsuredAccount(target)): Extension<EnsuredAccount>,
    params: Params,
) -> Result<StatusCode, ApiError> {
    if !params.is_json() {
        warn!(id = %target.id(), "put_account: body is not JSON");
        return Err(ApiError::UnsupportedMediaType);
    }

    if params.get("name").is_none_or(|name| name.trim().is_empty()) {
        warn!(id = %target.id(), params = ?params.names(), "put_account: missing name");
        return Err(Error::MissingName.into());
    }

    if params.raw().is_empty() {
        warn!(id = %target.id(), "put_account: empty body");
        return Err(ApiError::InvalidContent("request body is required".to_string()));
    }

    state
        .store()
        .write(&target, params.raw())
        .await
        .inspect_err(|error| warn!(%error, "put_account: unable to save"))?;

    debug!(id = %target.id(), "put_account: done");
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /accounts/{id}`.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(EnsuredAccount(target)): Extension<EnsuredAccount>,
) -> Result<StatusCode, ApiError> {
    state.store().delete(&target).await.inspect_err(|error| {
        warn!(%error, id = %target.id(), "delete_account: unable to delete");
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /accounts`: delete every loaded account.
///
/// All deletions run to completion. The request fails if any of them
/// failed; the ones that succeeded stay deleted.
pub async fn delete_all_accounts(
    State(state): State<AppState>,
    Extension(loaded): Extension<LoadedAccounts>,
) -> Result<StatusCode, ApiError> {
    let report = state.store().purge(&loaded.ids).await;
    for failure in &report.failed {
        warn!(id = %failure.id, error = %failure.source, "delete_all_accounts: unable to delete");
    }

    let deleted = report.into_result()?;
    debug!(deleted = deleted.len(), "delete_all_accounts: done");
    Ok(StatusCode::NO_CONTENT)
}
