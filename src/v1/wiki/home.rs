#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{ OpenApi, payload::{Html, PlainText}, ApiResponse };
use anyhow::Result;
use log::error;

use crate::utils::route::is_routable;
use crate::utils::wiki_utils::{self, RequestDebug};
use crate::v1::wiki::WikiCtx;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct HomeApi {
    ctx: Arc<WikiCtx>,
}

impl HomeApi {
    pub fn new(ctx: Arc<WikiCtx>) -> Self {
        Self {ctx}
    }
}

struct ReqHome
{
    list_limit: usize,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqHome {
    type Req = ReqHome;
    fn get_request_info(&self) -> String {
        format!("  Request:\n    list_limit: {}", self.list_limit)
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
impl HomeApi {
    #[oai(path = "/", method = "get")]
    async fn home_api(&self, http_req: &Request) -> WikiResponse {
        if !is_routable(http_req) {
            return make_http_404(format!("404 page not found: {}", http_req.uri().path()));
        }
        let req = ReqHome {list_limit: self.ctx.list_limit};

        // -------------------- Process Request ----------------------
        match home(http_req, &req, &self.ctx) {
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
// home:
// ---------------------------------------------------------------------------
/** List the first pages in title order and render the home page. */
fn home(http_req: &Request, req: &ReqHome, ctx: &WikiCtx) -> Result<WikiResponse> {
    wiki_utils::debug_request(http_req, req);

    let archive = ctx.store.list_titles(req.list_limit)?;
    let html = ctx.templates.render_home(&archive, &ctx.site_title)?;
    Ok(make_http_200(html))
}
