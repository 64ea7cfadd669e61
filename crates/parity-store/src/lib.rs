// Library root: persistence and read models for the parity stats server,
// exposed so the binary and integration tests share one API.

pub mod api;
pub mod config;
pub mod db;
