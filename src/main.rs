#![forbid(unsafe_code)]

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use lazy_static::lazy_static;
use log::info;
use poem::listener::TcpListener;

// Wiki Utilities
use crate::utils::config::{init_log, init_runtime_context, RuntimeCtx, WIKI_ARGS, WIKI_DIRS};
use crate::utils::errors::Errors;
use crate::utils::page_store::PageStore;
use crate::utils::templates::Templates;
use crate::v1::wiki::{make_app, WikiCtx};

// Modules
mod utils;
mod v1;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "WikiServer"; // for poem logging

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Lazily initialize the parameters variable so that is has a 'static lifetime.
// We exit if we can't read our parameters or create our directories.
lazy_static! {
    static ref RUNTIME_CTX: RuntimeCtx = init_runtime_context();
}

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // Announce ourselves.
    println!("Starting wiki_server!");

    // Directory creation happens as a side effect of the first access.
    if WIKI_ARGS.create_dirs_only {
        println!("Wiki directories initialized under {}", WIKI_DIRS.root_dir);
        return Ok(());
    }

    // Initialize the server.
    let ctx = wiki_init().map_err(|e| std::io::Error::other(e.to_string()))?;

    // --------------- Main Loop Set Up ---------------
    let config = &RUNTIME_CTX.parms.config;
    let wiki_url = format!("{}:{}", config.http_addr, config.http_port);
    let app = make_app(ctx, &wiki_url);

    // ------------------ Main Loop -------------------
    let addr = format!("{}{}", "0.0.0.0:", config.http_port);
    info!("Listening on {} as {}", addr, wiki_url);
    poem::Server::new(TcpListener::bind(addr))
        .name(SERVER_NAME)
        .run(app)
        .await
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// wiki_init:
// ---------------------------------------------------------------------------
/** Initialize all subsystems and build the shared, read-only handler
 * context: the page store over the data directory and the parsed templates.
 */
fn wiki_init() -> Result<Arc<WikiCtx>> {
    // Configure our log.
    init_log();

    // Force the reading of input parameters and initialization of runtime context.
    info!("{}", Errors::InputParms(format!("{:#?}", *RUNTIME_CTX)));

    // Log build info.
    print_version_info();

    let config_file = &RUNTIME_CTX.parms.config_file;
    info!("Configuration file: {}", if config_file.is_empty() {"none, using defaults"} else {config_file});
    info!("Log directory: {}", RUNTIME_CTX.wiki_dirs.logs_dir);

    let templates = Templates::load(Path::new(&RUNTIME_CTX.wiki_dirs.templates_dir))?;
    let store = PageStore::new(&RUNTIME_CTX.data_dir);
    info!("Serving pages from {:?}", store.data_dir());

    let config = &RUNTIME_CTX.parms.config;
    Ok(Arc::new(WikiCtx::new(store, templates, config.title.clone(), config.list_limit)))
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    info!("{}.", format!("\n*** Running WIKI={}, BRANCH={}, COMMIT={}, DIRTY={}, RUSTC={}",
                        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
                        env!("GIT_BRANCH"),
                        env!("GIT_COMMIT_SHORT"),
                        env!("GIT_DIRTY"),
                        env!("RUSTC_VERSION")),
    );
}
