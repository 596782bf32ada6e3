use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Domain name too long: {0} bytes")]
    NameTooLong(usize),

    #[error("Invalid label in '{name}': {reason}")]
    InvalidLabel { name: String, reason: &'static str },

    #[error("Character string too long: {0} bytes")]
    CharacterStringTooLong(usize),

    #[error("Record type {0} is only valid in questions")]
    QueryOnlyType(&'static str),

    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),
}
