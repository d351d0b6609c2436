#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::{post, EndpointExt, Route};
use poem_openapi::OpenApiService;

use crate::utils::page_store::PageStore;
use crate::utils::templates::Templates;

use self::home::HomeApi;
use self::page_create::{create_page_form, CreatePageApi};
use self::page_edit::EditPageApi;
use self::page_save::SavePageApi;
use self::page_view::ViewPageApi;

pub mod home;
pub mod page_create;
pub mod page_edit;
pub mod page_save;
pub mod page_view;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const API_TITLE    : &str = "Wiki Server";
const API_VERSION  : Option<&str> = option_env!("CARGO_PKG_VERSION");

// ***************************************************************************
//                              Wiki Context
// ***************************************************************************
/** Everything a handler needs.  Built once at startup and never mutated;
 * the page store's own lock table is the only interior mutability.
 */
#[derive(Debug)]
pub struct WikiCtx {
    pub store: PageStore,
    pub templates: Templates,
    pub site_title: String,
    pub list_limit: usize,
}

impl WikiCtx {
    pub fn new(store: PageStore, templates: Templates, site_title: String, list_limit: usize) -> Self {
        Self {store, templates, site_title, list_limit}
    }
}

// ***************************************************************************
//                               Dispatcher
// ***************************************************************************
// ---------------------------------------------------------------------------
// make_app:
// ---------------------------------------------------------------------------
/** Bind the route prefixes to their handlers.  Every title-taking handler
 * re-validates the raw path with the route grammar before doing any work.
 * The form target /create/ keeps its trailing slash, so it is bound on the
 * outer route rather than through the API service.
 */
pub fn make_app(ctx: Arc<WikiCtx>, server_url: &str) -> Route {
    let endpoints = (
        HomeApi::new(Arc::clone(&ctx)),
        CreatePageApi::new(Arc::clone(&ctx)),
        ViewPageApi::new(Arc::clone(&ctx)),
        EditPageApi::new(Arc::clone(&ctx)),
        SavePageApi::new(Arc::clone(&ctx)),
    );
    let api_service = OpenApiService::new(endpoints, API_TITLE, API_VERSION.unwrap_or("unknown"))
        .server(server_url);

    Route::new()
        .at("/create/", post(create_page_form).data(ctx))
        .nest("/", api_service)
}
