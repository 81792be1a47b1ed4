pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod presentation;
pub mod resolution;
pub mod store;
pub mod views;

pub use catalog::{Catalog, CatalogSettings, FetchOutcome, Selection};
pub use error::CatalogError;
pub use store::ViewStore;
