//! Compact-token claim decoding and access-token lifecycle helpers.

pub mod access;
pub mod claims;
