//! Outbound request pipeline for HTTP SDKs.
//!
//! Requests pick up credentials from a pluggable authenticator that refreshes tokens ahead
//! of expiry. Optional interceptors gzip request bodies and resend calls rejected with 429.
//!
//! A [`pipeline::Pipeline`] authenticates every request through an
//! [`auth::Authenticator`], then drives it through an ordered
//! [`interceptor::Interceptor`] chain that ends at an [`http::HttpTransport`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod obs;
pub mod pipeline;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use bytes::Bytes;
	pub use parking_lot::RwLock;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use tokio_util::sync::CancellationToken;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
