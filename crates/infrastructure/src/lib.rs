//! mdnsd Infrastructure Layer: the mDNS protocol engine and its sockets.
pub mod mdns;
