#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{ OpenApi, payload::{Html, PlainText}, param::Path, ApiResponse };
use anyhow::Result;
use log::{debug, error};

use crate::utils::route::{extract_token, Verb};
use crate::utils::templates::WikiTemplate;
use crate::utils::title::normalize;
use crate::utils::wiki_types::{LoadOutcome, Page};
use crate::utils::wiki_utils::{self, RequestDebug};
use crate::v1::wiki::WikiCtx;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct EditPageApi {
    ctx: Arc<WikiCtx>,
}

impl EditPageApi {
    pub fn new(ctx: Arc<WikiCtx>) -> Self {
        Self {ctx}
    }
}

struct ReqEditPage
{
    token: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqEditPage {
    type Req = ReqEditPage;
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
    #[oai(status = 404)]
    Http404(PlainText<String>),
    #[oai(status = 500)]
    Http500(PlainText<String>),
}

fn make_http_200(html: String) -> WikiResponse {
    WikiResponse::Http200(Html(html))
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
impl EditPageApi {
    #[oai(path = "/edit/:token", method = "get")]
    async fn edit_page_api(&self, http_req: &Request, token: Path<String>) -> WikiResponse {
        let token = match extract_token(http_req, Verb::Edit) {
            Some(t) => t,
            None => return make_http_404(format!("404 page not found: /edit/{}", token.0)),
        };
        let req = ReqEditPage {token};

        // -------------------- Process Request ----------------------
        match edit_page(http_req, &req, &self.ctx) {
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
// edit_page:
// ---------------------------------------------------------------------------
/** Render the edit form, blank when the page does not exist yet.  The form
 * posts back to the route token the client used.
 */
fn edit_page(http_req: &Request, req: &ReqEditPage, ctx: &WikiCtx) -> Result<WikiResponse> {
    wiki_utils::debug_request(http_req, req);

    let title = normalize(&req.token);
    let page = match ctx.store.load(&title) {
        LoadOutcome::Found(page) => page,
        LoadOutcome::Absent => {
            debug!("Page '{}' not found, offering a blank form.", title);
            Page::empty(title)
        },
    };

    let page = page.with_route(req.token.clone());
    let html = ctx.templates.render_page(WikiTemplate::Edit, &page, &ctx.site_title)?;
    Ok(make_http_200(html))
}
