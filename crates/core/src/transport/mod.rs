//! Transport port

pub mod ports;
