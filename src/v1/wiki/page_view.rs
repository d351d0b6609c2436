#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{ OpenApi, payload::{Html, PlainText}, param::Path, ApiResponse };
use anyhow::Result;
use log::error;

use crate::utils::route::{extract_token, Verb};
use crate::utils::templates::WikiTemplate;
use crate::utils::title::normalize;
use crate::utils::wiki_types::LoadOutcome;
use crate::utils::wiki_utils::{self, RequestDebug};
use crate::v1::wiki::WikiCtx;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct ViewPageApi {
    ctx: Arc<WikiCtx>,
}

impl ViewPageApi {
    pub fn new(ctx: Arc<WikiCtx>) -> Self {
        Self {ctx}
    }
}

struct ReqViewPage
{
    token: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqViewPage {
    type Req = ReqViewPage;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request:");
        s.push_str("\n    token: ");
        s.push_str(&self.token);
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum WikiResponse {
    #[oai(status = 200)]
    Http200(Html<String>),
    #[oai(status = 302)]
    Http302(#[oai(header = "Location")] String),
    #[oai(status = 404)]
    Http404(PlainText<String>),
    #[oai(status = 500)]
    Http500(PlainText<String>),
}

fn make_http_200(html: String) -> WikiResponse {
    WikiResponse::Http200(Html(html))
}
fn make_http_302(location: String) -> WikiResponse {
    WikiResponse::Http302(location)
}
fn make_http_404(msg: String) -> WikiResponse {
    WikiResponse::Http404(PlainText(msg))
}
fn make_http_500(msg: String) -> WikiResponse {
    WikiResponse::Http500(PlainText(msg))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl ViewPageApi {
    #[oai(path = "/view/:token", method = "get")]
    async fn view_page_api(&self, http_req: &Request, token: Path<String>) -> WikiResponse {
        // Only paths accepted by the route grammar reach the handler.
        let token = match extract_token(http_req, Verb::View) {
            Some(t) => t,
            None => return make_http_404(format!("404 page not found: /view/{}", token.0)),
        };
        let req = ReqViewPage {token};

        // -------------------- Process Request ----------------------
        match view_page(http_req, &req, &self.ctx) {
            Ok(r) => r,
            Err(e) => {
                let msg = "ERROR: ".to_owned() + e.to_string().as_str();
                error!("{}", msg);
                make_http_500(msg)
            }
        }
    }
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// view_page:
// ---------------------------------------------------------------------------
/** Render an existing page.  A missing page is an invitation to create it,
 * so the client is sent to the edit form instead of receiving an error.
 */
fn view_page(http_req: &Request, req: &ReqViewPage, ctx: &WikiCtx) -> Result<WikiResponse> {
    wiki_utils::debug_request(http_req, req);

    let title = normalize(&req.token);
    match ctx.store.load(&title) {
        LoadOutcome::Found(page) => {
            let page = page.with_route(req.token.clone());
            let html = ctx.templates.render_page(WikiTemplate::View, &page, &ctx.site_title)?;
            Ok(make_http_200(html))
        },
        LoadOutcome::Absent => Ok(make_http_302(format!("/edit/{}", req.token.to_lowercase()))),
    }
}
