#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{ OpenApi, Object, payload::{Form, PlainText}, param::Path, ApiResponse };
use anyhow::Result;
use serde::Deserialize;
use log::error;

use crate::utils::route::{extract_token, Verb};
use crate::utils::title::normalize;
use crate::utils::wiki_types::Page;
use crate::utils::wiki_utils::{self, RequestDebug};
use crate::v1::wiki::WikiCtx;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct SavePageApi {
    ctx: Arc<WikiCtx>,
}

impl SavePageApi {
    pub fn new(ctx: Arc<WikiCtx>) -> Self {
        Self {ctx}
    }
}

/// Fields posted by the edit form.
#[derive(Object, Deserialize, Debug)]
struct SavePageForm
{
    body: Option<String>,
}

struct ReqSavePage
{
    token: String,
    body: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqSavePage {
    type Req = ReqSavePage;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request:");
        s.push_str("\n    token: ");
        s.push_str(&self.token);
        s.push_str("\n    body length: ");
        s.push_str(&self.body.len().to_string());
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum WikiResponse {
    #[oai(status = 302)]
    Http302(#[oai(header = "Location")] String),
    #[oai(status = 404)]
    Http404(PlainText<String>),
    #[oai(status = 500)]
    Http500(PlainText<String>),
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
impl SavePageApi {
    #[oai(path = "/save/:token", method = "post")]
    async fn save_page_api(&self, http_req: &Request, token: Path<String>,
                           form: Form<SavePageForm>) -> WikiResponse {
        let token = match extract_token(http_req, Verb::Save) {
            Some(t) => t,
            None => return make_http_404(format!("404 page not found: /save/{}", token.0)),
        };

        // A form without a body field saves an empty page.
        let req = ReqSavePage {token, body: form.0.body.unwrap_or_default()};

        // -------------------- Process Request ----------------------
        match save_page(http_req, req, &self.ctx) {
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
// save_page:
// ---------------------------------------------------------------------------
fn save_page(http_req: &Request, req: ReqSavePage, ctx: &WikiCtx) -> Result<WikiResponse> {
    wiki_utils::debug_request(http_req, &req);

    let page = Page::new(normalize(&req.token), req.body.into_bytes());
    ctx.store.save(&page)?;

    Ok(make_http_302(format!("/view/{}", req.token.to_lowercase())))
}
