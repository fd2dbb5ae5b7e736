//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,
    
    #[error("Already connected")]
    AlreadyConnected,
    
    #[error("Connection timeout")]
    ConnectionTimeout,
    
    #[error("Connection closed by remote")]
    ConnectionClosed,
    
    #[error("MQTT error: {0}")]
    Mqtt(String),
    
    #[error("HTTP request failed: {0}")]
    Http(String),
    
    #[error("Webhook returned status {0}")]
    Status(u16),
    
    #[error("Request timed out")]
    Timeout,
    
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<rumqttc::ConnectionError> for Error {
    fn from(err: rumqttc::ConnectionError) -> Self {
        match err {
            rumqttc::ConnectionError::Io(e) => Error::Io(e),
            other => Error::Mqtt(other.to_string()),
        }
    }
}

impl From<rumqttc::ClientError> for Error {
    fn from(err: rumqttc::ClientError) -> Self {
        Error::Mqtt(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Http(err.to_string())
        }
    }
}
