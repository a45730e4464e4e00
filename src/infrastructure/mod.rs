pub mod config;
pub mod http;
pub mod inference;
pub mod middleware;
pub mod repositories;
pub mod storage;
