pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod seed;
