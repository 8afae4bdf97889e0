//! Skyreport service: CSV export of the station archive and generated
//! plot documents for the report UI.

pub mod app_state;
pub mod archive;
pub mod config;
pub mod errors;
pub mod export;
pub mod plotgen;
pub mod routes;
