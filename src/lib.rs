pub mod beacon;
pub mod config;
pub mod decompress;
pub mod download;
pub mod error;
pub mod io;
pub mod matcher;
pub mod processing;
pub mod sources;
