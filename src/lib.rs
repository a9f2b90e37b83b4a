// Copyforge - ad copy and SEO content generation service

pub mod bulk;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod llm;
pub mod models;
pub mod monitoring;
pub mod queue;
pub mod routes;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
