//! Chain-of-responsibility interceptors wrapped around the transport.
//!
//! Each [`Interceptor`] receives the request plus a [`Next`] cursor over the rest of the
//! chain. `Next` is `Copy`, so an interceptor may run the remainder of the chain more than
//! once; the rate-limit interceptor relies on this to resend throttled requests.

pub mod gzip;
pub mod rate_limit;

pub use gzip::*;
pub use rate_limit::*;

// self
use crate::{
	_prelude::*,
	http::{HttpTransport, Request, TransportFuture},
};

/// Boxed future returned by [`Interceptor::intercept`].
pub type InterceptFuture<'a> = TransportFuture<'a>;

/// Request/response transform applied around the network call.
pub trait Interceptor
where
	Self: Send + Sync,
{
	/// Stable label used in diagnostics.
	fn name(&self) -> &'static str;

	/// Handles `request`, usually by calling [`Next::run`] one or more times.
	fn intercept<'a>(&'a self, request: Request, next: Next<'a>) -> InterceptFuture<'a>;
}

/// Cursor over the remaining interceptors and the terminal transport.
#[derive(Clone, Copy)]
pub struct Next<'a> {
	interceptors: &'a [Arc<dyn Interceptor>],
	transport: &'a dyn HttpTransport,
}
impl<'a> Next<'a> {
	/// Creates a cursor positioned at the head of `interceptors`.
	pub fn new(interceptors: &'a [Arc<dyn Interceptor>], transport: &'a dyn HttpTransport) -> Self {
		Self { interceptors, transport }
	}

	/// Runs the rest of the chain for `request`.
	pub fn run(self, request: Request) -> InterceptFuture<'a> {
		match self.interceptors.split_first() {
			Some((head, rest)) =>
				head.intercept(request, Self { interceptors: rest, transport: self.transport }),
			None => self.transport.send(request),
		}
	}
}
impl Debug for Next<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Next")
			.field(
				"interceptors",
				&self.interceptors.iter().map(|interceptor| interceptor.name()).collect::<Vec<_>>(),
			)
			.finish()
	}
}
