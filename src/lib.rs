pub mod api;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod generation;
pub mod mcp;
pub mod repository;
pub mod search;
pub mod storage;
pub mod versioning;

pub use error::{Result, VellumError};
pub use mcp::VellumServer;
pub use repository::Repository;
pub use storage::DocumentStore;
