//! Error type shared by the NetIO engine and its registries.

use pdu::{DecodeError, EncodeError, EntityTypeCode};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum NetIoError {
    #[error("Malformed PDU: {0}")]
    MalformedPdu(#[from] DecodeError),
    #[error("Failed to encode PDU: {0}")]
    Encode(#[from] EncodeError),
    #[error("PDU version {found} does not match session version {expected}")]
    UnsupportedVersion { expected: u8, found: u8 },
    #[error("No handler for PDU type {0}")]
    UnknownPduType(u8),
    #[error("No type mapping matches entity type {0}")]
    TypeUnresolved(EntityTypeCode),
    #[error("{what} is full ({capacity} entries)")]
    CapacityExceeded {
        what: &'static str,
        capacity: usize,
    },
    #[error("Invalid name format: {0:?}")]
    InvalidFormat(String),
    #[error("Entity type {0} is already mapped")]
    DuplicateMapping(EntityTypeCode),
    #[error("Registration is closed while the engine is running")]
    RegistrationClosed,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Engine is not running")]
    NotRunning,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, NetIoError>;
