//! entity-rest: PostgREST-style REST API generated from declared entities, over SQLite.

pub mod coerce;
pub mod config;
pub mod error;
pub mod export;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod projection;
pub mod query;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod window;

pub use coerce::{default_timestamp_parser, parse_timestamp, CoercionRegistry, TimestampParser};
pub use config::{
    load_registry, parse_entities, ColumnDescriptor, ColumnType, EntityDescriptor, EntityRegistry, Settings, ValueType,
};
pub use error::{AppError, ConfigError};
pub use migration::ensure_tables;
pub use routes::{app, common_routes, entity_routes};
pub use state::AppState;
pub use store::connect;
