#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::{handler, IntoResponse, Request, Response};
use poem::web::{Data, Form as WebForm};
use poem_openapi::{ OpenApi, Object, payload::{Form, PlainText}, ApiResponse };
use anyhow::Result;
use serde::Deserialize;
use log::{info, error};

use crate::utils::title::{normalize, route_token};
use crate::utils::wiki_types::Page;
use crate::utils::wiki_utils::{self, RequestDebug};
use crate::v1::wiki::WikiCtx;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct CreatePageApi {
    ctx: Arc<WikiCtx>,
}

impl CreatePageApi {
    pub fn new(ctx: Arc<WikiCtx>) -> Self {
        Self {ctx}
    }
}

/// Fields posted by the home page form.
#[derive(Object, Deserialize, Debug)]
struct CreatePageForm
{
    title: Option<String>,
}

struct ReqCreatePage
{
    title: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqCreatePage {
    type Req = ReqCreatePage;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request body:");
        s.push_str("\n    title: ");
        s.push_str(&self.title);
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum WikiResponse {
    #[oai(status = 302)]
    Http302(#[oai(header = "Location")] String),
    #[oai(status = 400)]
    Http400(PlainText<String>),
    #[oai(status = 500)]
    Http500(PlainText<String>),
}

fn make_http_302(location: String) -> WikiResponse {
    WikiResponse::Http302(location)
}
fn make_http_400(msg: String) -> WikiResponse {
    WikiResponse::Http400(PlainText(msg))
}
fn make_http_500(msg: String) -> WikiResponse {
    WikiResponse::Http500(PlainText(msg))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
// The API service drops trailing slashes, so it answers /create only.
#[OpenApi]
impl CreatePageApi {
    #[oai(path = "/create", method = "post")]
    async fn create_page_api(&self, http_req: &Request, form: Form<CreatePageForm>) -> WikiResponse {
        process_create(http_req, form.0, &self.ctx)
    }
}

// ---------------------------------------------------------------------------
// create_page_form:
// ---------------------------------------------------------------------------
/** The home page form posts to /create/, which is bound directly on the
 * outer route and shares all processing with the API endpoint.
 */
#[handler]
pub async fn create_page_form(http_req: &Request, Data(ctx): Data<&Arc<WikiCtx>>,
                              WebForm(form): WebForm<CreatePageForm>) -> Response {
    process_create(http_req, form, ctx).into_response()
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// process_create:
// ---------------------------------------------------------------------------
fn process_create(http_req: &Request, form: CreatePageForm, ctx: &WikiCtx) -> WikiResponse {
    let req = ReqCreatePage {title: form.title.unwrap_or_default()};

    // -------------------- Process Request ----------------------
    match create_page(http_req, &req, ctx) {
        Ok(r) => r,
        Err(e) => {
            let msg = "ERROR: ".to_owned() + e.to_string().as_str();
            error!("{}", msg);
            make_http_500(msg)
        }
    }
}

// ---------------------------------------------------------------------------
// create_page:
// ---------------------------------------------------------------------------
/** Persist a blank page for the posted title and send the client to its edit
 * form.  Multi-word titles are hyphen-joined in the redirect; either way
 * exactly one redirect is produced.  An existing page is left untouched.
 */
fn create_page(http_req: &Request, req: &ReqCreatePage, ctx: &WikiCtx) -> Result<WikiResponse> {
    wiki_utils::debug_request(http_req, req);

    let token = match route_token(&req.title) {
        Some(t) => t,
        None => {
            let msg = format!("ERROR: '{}' cannot be used as a page title.", req.title);
            error!("{}", msg);
            return Ok(make_http_400(msg));
        },
    };

    let page = Page::empty(normalize(&token));
    if ctx.store.create(&page)? {
        info!("Created page '{}'.", page.title);
    }

    Ok(make_http_302(format!("/edit/{}", token)))
}
