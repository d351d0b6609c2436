pub mod config;
pub mod errors;
pub mod page_store;
pub mod route;
pub mod templates;
pub mod title;
pub mod wiki_types;
pub mod wiki_utils;
