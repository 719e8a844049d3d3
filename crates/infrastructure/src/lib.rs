//! cachedns Infrastructure Layer
pub mod dns;
