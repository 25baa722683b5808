//! Authenticators, their configuration, and the token models they cache.

pub mod authenticator;
pub mod basic;
pub mod bearer;
pub mod config;
pub mod iam;
pub mod noauth;
pub mod token;

pub use authenticator::*;
pub use basic::*;
pub use bearer::*;
pub use config::*;
pub use iam::*;
pub use noauth::*;
pub use token::{access::*, claims::*};
