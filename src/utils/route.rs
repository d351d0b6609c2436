#![forbid(unsafe_code)]

use lazy_static::lazy_static;
use log::debug;
use poem::Request;
use regex::Regex;

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// The route grammar is compiled once and shared read-only by all requests.
// The create route is accepted with or without the trailing slash that the
// home page form posts to.
lazy_static! {
    static ref VALID_PATH: Regex =
        Regex::new(r"^/(edit|save|view)/([a-zA-Z0-9-]+)$|^/create/?$|^/$")
            .expect("route grammar must compile");
    static ref VALID_TOKEN: Regex =
        Regex::new(r"^[a-zA-Z0-9-]+$").expect("token grammar must compile");
}

// ***************************************************************************
//                              Route Types
// ***************************************************************************
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {Edit, Save, View}

impl Verb {
    fn from_capture(s: &str) -> Option<Self> {
        match s {
            "edit" => Some(Verb::Edit),
            "save" => Some(Verb::Save),
            "view" => Some(Verb::View),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Edit => "edit",
            Verb::Save => "save",
            Verb::View => "view",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    Page {verb: Verb, token: String},
    Create,
    Home,
}

// ***************************************************************************
//                            Public Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// validate:
// ---------------------------------------------------------------------------
/** Decide whether a raw request path belongs to the route grammar.  The path
 * is matched as received, so percent-encoded characters are rejected rather
 * than decoded.
 */
pub fn validate(path: &str) -> Option<RouteMatch> {
    let caps = VALID_PATH.captures(path)?;
    match (caps.get(1), caps.get(2)) {
        (Some(verb), Some(token)) => Some(RouteMatch::Page {
            verb: Verb::from_capture(verb.as_str())?,
            token: token.as_str().to_string(),
        }),
        _ if path == "/" => Some(RouteMatch::Home),
        _ => Some(RouteMatch::Create),
    }
}

// ---------------------------------------------------------------------------
// is_valid_token:
// ---------------------------------------------------------------------------
pub fn is_valid_token(token: &str) -> bool {
    VALID_TOKEN.is_match(token)
}

// ---------------------------------------------------------------------------
// extract_token:
// ---------------------------------------------------------------------------
/** The adapter shared by every title-taking endpoint.  Validate the request
 * path and return its token when the path is a page route for the expected
 * verb.  None means the caller must answer not found and do nothing else.
 *
 * The API service is nested at the root, so the request uri still carries
 * the full, undecoded path.
 */
pub fn extract_token(http_req: &Request, expected: Verb) -> Option<String> {
    let path = http_req.uri().path();
    match validate(path) {
        Some(RouteMatch::Page {verb, token}) if verb == expected => Some(token),
        _ => {
            debug!("Path rejected by {} route grammar: {}", expected.as_str(), path);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// is_routable:
// ---------------------------------------------------------------------------
/** Degenerate use of the grammar as a plain path existence check. */
pub fn is_routable(http_req: &Request) -> bool {
    validate(http_req.uri().path()).is_some()
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use poem::http::Uri;

    #[test]
    fn accepts_grammar_paths() {
        assert_eq!(validate("/view/abc123"),
                   Some(RouteMatch::Page {verb: Verb::View, token: "abc123".to_string()}));
        assert_eq!(validate("/edit/abc-123"),
                   Some(RouteMatch::Page {verb: Verb::Edit, token: "abc-123".to_string()}));
        assert_eq!(validate("/save/x"),
                   Some(RouteMatch::Page {verb: Verb::Save, token: "x".to_string()}));
        assert_eq!(validate("/create"), Some(RouteMatch::Create));
        assert_eq!(validate("/create/"), Some(RouteMatch::Create));
        assert_eq!(validate("/"), Some(RouteMatch::Home));
    }

    #[test]
    fn rejects_other_paths() {
        for p in ["/view/", "/foo/bar", "/view/has space", "/view/has%20space",
                  "/view/a/b", "/view/../x", "", "/create/x", "/VIEW/abc", "//"] {
            assert_eq!(validate(p), None, "path {:?} should not match", p);
        }
    }

    #[test]
    fn token_grammar() {
        assert!(is_valid_token("my-page"));
        assert!(is_valid_token("ABC123"));
        assert!(!is_valid_token(""));
        assert!(!is_valid_token("my page"));
        assert!(!is_valid_token("a_b"));
    }

    #[test]
    fn extract_token_checks_verb() {
        let req = Request::builder().uri(Uri::from_static("/view/hello")).finish();
        assert_eq!(extract_token(&req, Verb::View).as_deref(), Some("hello"));
        assert_eq!(extract_token(&req, Verb::Edit), None);

        let req = Request::builder().uri(Uri::from_static("/view/bad%20token")).finish();
        assert_eq!(extract_token(&req, Verb::View), None);
    }

    #[test]
    fn routable_paths() {
        for p in ["/", "/create", "/create/"] {
            let req = Request::builder().uri(Uri::from_static(p)).finish();
            assert!(is_routable(&req), "path {:?} should be routable", p);
        }
        let req = Request::builder().uri(Uri::from_static("/index.html")).finish();
        assert!(!is_routable(&req));
    }
}
