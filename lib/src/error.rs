use displaydoc::Display;
use reqwest::StatusCode;
use thiserror::Error;

use crate::types::KlineRequestBuilderError;

#[derive(Debug, Display, Error)]
pub enum Error {
    /// Init error: {0}
    Init(#[from] Init),
    /// Config error: {0}
    Config(#[from] ConfigError),
    /// Api error: {0}
    Api(#[from] Api),
    /// Io: {0}
    File(#[from] FileIo),
    /// Year {0} cannot be represented as a UTC timestamp range
    InvalidYear(i32),
    /// Invalid kline request: {0}
    InvalidRequest(#[from] KlineRequestBuilderError),
}

#[derive(Debug, Display, Error)]
pub enum Init {
    /// Missing credential: environment variable {0} is not set
    CredentialMissing(&'static str),
    /// Failed to initialize the client: {0}
    ClientInitialization(reqwest::Error),
    /// Invalid API key: not a valid header value
    InvalidApiKey,
    /// Invalid base URL: {0}
    InvalidBaseUrl(String),
}

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    /// Failed to read config file {path}: {source}
    Read {
        path: String,
        source: std::io::Error,
    },
    /// Failed to parse config file {path} as JSON: {source}
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Display, Error)]
pub enum Api {
    /// URL is not valid: {0}
    InvalidUrl(#[from] url::ParseError),
    /// Error sending request: {0}
    SendRequest(reqwest::Error),
    /// Failed to deserialize response: {0}
    Deserialization(reqwest::Error),
    /// Unexpected status code {status}: {body}
    UnexpectedStatus { status: StatusCode, body: String },
    /// Exchange rejected the request ({status}): code {code}, {msg}
    Exchange {
        status: StatusCode,
        code: i64,
        msg: String,
    },
}

#[derive(Debug, Display, Error)]
pub enum FileIo {
    /// Error writing CSV: {0}
    Csv(#[from] csv::Error),
    /// Error writing file: {0}
    FileWrite(std::io::Error),
    /// Error creating file: {0}
    CreateFile(std::io::Error),
    /// Error creating directory: {0}
    CreateDir(std::io::Error),
}
