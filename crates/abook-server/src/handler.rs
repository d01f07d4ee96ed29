use std::sync::Arc;

use abook_registry::Member;
use abook_service::{AddressbookService, DefaultOrder, ListQuery};
use abook_types::{Address, AddressId, Addressbook, AddressbookId, Principal};
use axum::extract::{FromRequest, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ServerError, ServerResult};

/// JSON request body whose rejections answer like every other
/// [`ServerError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct JsonBody<T>(pub T);

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AddressbookService>,
    principal_header: Arc<str>,
}

impl AppState {
    pub fn new(service: Arc<AddressbookService>, principal_header: &str) -> Self {
        Self {
            service,
            principal_header: Arc::from(principal_header),
        }
    }

    /// Caller identity, taken verbatim from the principal header.
    pub fn principal(&self, headers: &HeaderMap) -> Principal {
        headers
            .get(&*self.principal_header)
            .and_then(|value| value.to_str().ok())
            .map(Principal::new)
            .unwrap_or_default()
    }
}

pub async fn health(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    let stats = state.service.stats()?;
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "addressbooks": stats.addressbooks,
        "contacts": stats.contacts,
        "orgs": stats.orgs,
        "addresses": stats.addresses,
    })))
}

// ---- Addressbooks ----

pub async fn list_addressbooks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ServerResult<Json<Vec<Addressbook>>> {
    Ok(Json(state.service.list_addressbooks(&query)?))
}

pub async fn create_addressbook(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<Addressbook>,
) -> ServerResult<(StatusCode, Json<Addressbook>)> {
    let principal = state.principal(&headers);
    let created = state.service.create_addressbook(input, &principal)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn read_addressbook(
    State(state): State<AppState>,
    Path(aid): Path<AddressbookId>,
) -> ServerResult<Json<Addressbook>> {
    Ok(Json(state.service.read_addressbook(&aid)?))
}

pub async fn update_addressbook(
    State(state): State<AppState>,
    Path(aid): Path<AddressbookId>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<Addressbook>,
) -> ServerResult<Json<Addressbook>> {
    let principal = state.principal(&headers);
    Ok(Json(state.service.update_addressbook(&aid, input, &principal)?))
}

pub async fn delete_addressbook(
    State(state): State<AppState>,
    Path(aid): Path<AddressbookId>,
    headers: HeaderMap,
) -> ServerResult<StatusCode> {
    let principal = state.principal(&headers);
    state.service.delete_addressbook(&aid, &principal)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Contacts and orgs ----

pub async fn list_all_members<M>(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ServerResult<Json<Vec<M>>>
where
    M: Member + DefaultOrder + Serialize,
{
    Ok(Json(state.service.list_all_members(&query)?))
}

pub async fn list_members<M>(
    State(state): State<AppState>,
    Path(aid): Path<AddressbookId>,
    Query(query): Query<ListQuery>,
) -> ServerResult<Json<Vec<M>>>
where
    M: Member + DefaultOrder + Serialize,
{
    Ok(Json(state.service.list_members(&aid, &query)?))
}

pub async fn create_member<M>(
    State(state): State<AppState>,
    Path(aid): Path<AddressbookId>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<M>,
) -> ServerResult<(StatusCode, Json<M>)>
where
    M: Member + Serialize + DeserializeOwned,
{
    let principal = state.principal(&headers);
    let member = state.service.create_member(&aid, input, &principal)?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn read_member<M>(
    State(state): State<AppState>,
    Path((aid, id)): Path<(AddressbookId, M::Key)>,
) -> ServerResult<Json<M>>
where
    M: Member + Serialize,
    M::Key: DeserializeOwned,
{
    Ok(Json(state.service.read_member(&aid, &id)?))
}

pub async fn update_member<M>(
    State(state): State<AppState>,
    Path((aid, id)): Path<(AddressbookId, M::Key)>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<M>,
) -> ServerResult<Json<M>>
where
    M: Member + Serialize + DeserializeOwned,
    M::Key: DeserializeOwned,
{
    let principal = state.principal(&headers);
    Ok(Json(state.service.update_member(&aid, &id, input, &principal)?))
}

pub async fn delete_member<M>(
    State(state): State<AppState>,
    Path((aid, id)): Path<(AddressbookId, M::Key)>,
    headers: HeaderMap,
) -> ServerResult<StatusCode>
where
    M: Member,
    M::Key: DeserializeOwned,
{
    let principal = state.principal(&headers);
    state.service.delete_member::<M>(&aid, &id, &principal)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Addresses ----

pub async fn list_addresses<M>(
    State(state): State<AppState>,
    Path((aid, owner)): Path<(AddressbookId, M::Key)>,
    Query(query): Query<ListQuery>,
) -> ServerResult<Json<Vec<Address>>>
where
    M: Member,
    M::Key: DeserializeOwned,
{
    Ok(Json(state.service.list_addresses::<M>(&aid, &owner, &query)?))
}

pub async fn create_address<M>(
    State(state): State<AppState>,
    Path((aid, owner)): Path<(AddressbookId, M::Key)>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<Address>,
) -> ServerResult<(StatusCode, Json<Address>)>
where
    M: Member,
    M::Key: DeserializeOwned,
{
    let principal = state.principal(&headers);
    let created = state
        .service
        .create_address::<M>(&aid, &owner, input, &principal)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn read_address<M>(
    State(state): State<AppState>,
    Path((aid, owner, adrid)): Path<(AddressbookId, M::Key, AddressId)>,
) -> ServerResult<Json<Address>>
where
    M: Member,
    M::Key: DeserializeOwned,
{
    Ok(Json(state.service.read_address::<M>(&aid, &owner, &adrid)?))
}

pub async fn update_address<M>(
    State(state): State<AppState>,
    Path((aid, owner, adrid)): Path<(AddressbookId, M::Key, AddressId)>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<Address>,
) -> ServerResult<Json<Address>>
where
    M: Member,
    M::Key: DeserializeOwned,
{
    let principal = state.principal(&headers);
    Ok(Json(state.service.update_address::<M>(
        &aid,
        &owner,
        &adrid,
        input,
        &principal,
    )?))
}

pub async fn delete_address<M>(
    State(state): State<AppState>,
    Path((aid, owner, adrid)): Path<(AddressbookId, M::Key, AddressId)>,
    headers: HeaderMap,
) -> ServerResult<StatusCode>
where
    M: Member,
    M::Key: DeserializeOwned,
{
    let principal = state.principal(&headers);
    state
        .service
        .delete_address::<M>(&aid, &owner, &adrid, &principal)?;
    Ok(StatusCode::NO_CONTENT)
}
