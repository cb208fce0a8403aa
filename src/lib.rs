pub mod clock;
pub mod config;
pub mod extractors;
pub mod logging;
pub mod monitor;
pub mod response;
pub mod routes;
pub mod state;
pub mod workers;
