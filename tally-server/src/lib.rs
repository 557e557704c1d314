pub use crate::{
    config::ServerConfig,
    error::ServerError,
    server::{CounterServer, table_registry},
};

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod server;
