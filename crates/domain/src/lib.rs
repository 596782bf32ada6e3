//! mdnsd Domain Layer
pub mod config;
pub mod dns_record;
pub mod errors;
pub mod interface;
pub mod lookup;
pub mod message;
pub mod name;
pub mod question;

pub use config::{
    CliOverrides, Config, ConfigError, InterfaceConfig, LogFormat, LoggingConfig, MdnsConfig,
    ServiceConfig,
};
pub use dns_record::{
    Hinfo, RData, RecordType, ResourceRecord, Srv, CLASS_FLAG, CLASS_IN, CLASS_MASK,
};
pub use errors::DomainError;
pub use interface::{InterfaceInfo, LinkState};
pub use lookup::{
    check_question, BrowseEvent, BrowseEventKind, LookupOperation, LookupReply, LookupRequest,
    RequestError, LOOKUP_TYPES,
};
pub use message::{Header, Message, FLAGS_AA, FLAGS_QR_RESPONSE, FLAGS_TC};
pub use name::{
    escape_label, names_equal, reverse_name, to_key, validate_name, MAX_LABEL_LEN, MAX_NAME_LEN,
};
pub use question::Question;
