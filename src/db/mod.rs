//! Database module for PostgreSQL connectivity
//!
//! Provides connection pool management and the product record repository.

pub mod pool;
pub mod models;
pub mod products;

pub use pool::DbPool;
pub use products::ProductRepository;
