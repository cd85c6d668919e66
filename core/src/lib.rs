pub mod api;
pub mod crawl;
pub mod data;
pub mod network;
pub mod shutdown;
pub mod types;
pub mod utils;
