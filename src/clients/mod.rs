pub mod runs_client;
pub mod token_cache;

pub use runs_client::RunsClient;
pub use token_cache::TokenCache;
