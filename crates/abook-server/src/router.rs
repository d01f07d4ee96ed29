use abook_registry::Member;
use abook_service::DefaultOrder;
use abook_types::{Contact, Org};
use axum::routing::get;
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with every addressbook endpoint under `/api`.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/api/health", get(handler::health))
        .route(
            "/api/addressbooks",
            get(handler::list_addressbooks).post(handler::create_addressbook),
        )
        .route(
            "/api/addressbooks/:aid",
            get(handler::read_addressbook)
                .put(handler::update_addressbook)
                .delete(handler::delete_addressbook),
        )
        .route("/api/allcontacts", get(handler::list_all_members::<Contact>))
        .route("/api/allorgs", get(handler::list_all_members::<Org>));

    member_routes::<Contact>(member_routes::<Org>(router, "orgs"), "contacts")
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Member and address routes for one entity kind, mounted at
/// `/api/addressbooks/:aid/{segment}`.
fn member_routes<M>(router: Router<AppState>, segment: &str) -> Router<AppState>
where
    M: Member + DefaultOrder + Serialize + DeserializeOwned,
    M::Key: DeserializeOwned,
{
    let base = format!("/api/addressbooks/:aid/{segment}");
    router
        .route(
            &base,
            get(handler::list_members::<M>).post(handler::create_member::<M>),
        )
        .route(
            &format!("{base}/:id"),
            get(handler::read_member::<M>)
                .put(handler::update_member::<M>)
                .delete(handler::delete_member::<M>),
        )
        .route(
            &format!("{base}/:id/addresses"),
            get(handler::list_addresses::<M>).post(handler::create_address::<M>),
        )
        .route(
            &format!("{base}/:id/addresses/:adrid"),
            get(handler::read_address::<M>)
                .put(handler::update_address::<M>)
                .delete(handler::delete_address::<M>),
        )
}
