mod mdns_engine;

pub use mdns_engine::{BrowseSubscription, MdnsEngine};
