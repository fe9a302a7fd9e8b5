pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod export;
pub mod service;
pub mod types;

pub use error::Error;
