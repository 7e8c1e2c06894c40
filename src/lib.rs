pub mod auth;
pub mod configuration;
pub mod error;
pub mod logger;
pub mod media;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod user;
pub mod validators;
