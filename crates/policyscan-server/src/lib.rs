//! PolicyScan Server
//!
//! HTTP front end for the policy analysis pipeline. Accepts PDF uploads,
//! extracts their page text, runs the analysis on the blocking thread pool
//! and returns the categorized report as JSON.

pub mod config;
pub mod extract;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use extract::{PdfTextExtractor, TextExtractor};
pub use routes::{create_router, AppError};
pub use state::AppState;
