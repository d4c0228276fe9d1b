//! REST v2 data transport

pub mod envelope;
pub mod rest;

pub use envelope::parse_envelope;
pub use rest::RestTransport;
