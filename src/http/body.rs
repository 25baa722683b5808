//! Request bodies, including the lazily compressed gzip variant.

// std
use std::io::{self, Cursor, ErrorKind, Read};
// crates.io
use flate2::{Compression, read::GzEncoder};
// self
use crate::_prelude::*;

const CHUNK_SIZE: usize = 8 * 1024;

/// Outgoing request body.
#[derive(Clone, Debug, Default)]
pub enum Body {
	/// No body.
	#[default]
	Empty,
	/// Fully buffered bytes.
	Bytes(Bytes),
	/// Buffered bytes compressed on the fly while the body is written.
	Gzip(GzipBody),
}
impl Body {
	/// Returns `true` when there is nothing to send.
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Empty => true,
			Self::Bytes(bytes) => bytes.is_empty(),
			Self::Gzip(_) => false,
		}
	}

	/// Length on the wire, or `None` when unknown ahead of time (chunked transfer).
	pub fn content_length(&self) -> Option<u64> {
		match self {
			Self::Empty => Some(0),
			Self::Bytes(bytes) => Some(bytes.len() as u64),
			Self::Gzip(_) => None,
		}
	}

	/// Buffers the body exactly as it would be written to the wire.
	pub fn to_bytes(&self) -> io::Result<Bytes> {
		match self {
			Self::Empty => Ok(Bytes::new()),
			Self::Bytes(bytes) => Ok(bytes.clone()),
			Self::Gzip(gzip) => {
				let mut buf = Vec::new();

				gzip.encoder().read_to_end(&mut buf)?;

				Ok(buf.into())
			},
		}
	}
}
impl From<Bytes> for Body {
	fn from(bytes: Bytes) -> Self {
		Self::Bytes(bytes)
	}
}
impl From<Vec<u8>> for Body {
	fn from(bytes: Vec<u8>) -> Self {
		Self::Bytes(bytes.into())
	}
}
impl From<String> for Body {
	fn from(text: String) -> Self {
		Self::Bytes(text.into())
	}
}
impl From<&'static str> for Body {
	fn from(text: &'static str) -> Self {
		Self::Bytes(Bytes::from_static(text.as_bytes()))
	}
}

/// Gzip wrapper around a buffered source body.
///
/// Compression happens while the body is read, so the compressed length is never known
/// up front. The source is retained so the body can be replayed on retries.
#[derive(Clone)]
pub struct GzipBody {
	source: Bytes,
}
impl GzipBody {
	/// Wraps an uncompressed source body.
	pub fn new(source: Bytes) -> Self {
		Self { source }
	}

	/// Returns the uncompressed source.
	pub fn source(&self) -> &Bytes {
		&self.source
	}

	/// Creates a fresh streaming encoder over the source.
	pub fn encoder(&self) -> GzEncoder<Cursor<Bytes>> {
		GzEncoder::new(Cursor::new(self.source.clone()), Compression::default())
	}

	/// Iterates over compressed chunks, suitable for streaming transports.
	pub fn chunks(&self) -> GzipChunks {
		GzipChunks { encoder: self.encoder(), done: false }
	}
}
impl Debug for GzipBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GzipBody").field("source_len", &self.source.len()).finish()
	}
}

/// Iterator yielding compressed chunks produced by [`GzipBody::chunks`].
pub struct GzipChunks {
	encoder: GzEncoder<Cursor<Bytes>>,
	done: bool,
}
impl Iterator for GzipChunks {
	type Item = io::Result<Bytes>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		let mut buf = vec![0; CHUNK_SIZE];

		loop {
			match self.encoder.read(&mut buf) {
				Ok(0) => {
					self.done = true;

					return None;
				},
				Ok(n) => {
					buf.truncate(n);

					return Some(Ok(buf.into()));
				},
				Err(e) if e.kind() == ErrorKind::Interrupted => continue,
				Err(e) => {
					self.done = true;

					return Some(Err(e));
				},
			}
		}
	}
}
impl Debug for GzipChunks {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GzipChunks").field("done", &self.done).finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use flate2::read::GzDecoder;
	// self
	use super::*;

	fn gunzip(bytes: &[u8]) -> Vec<u8> {
		let mut out = Vec::new();

		GzDecoder::new(bytes).read_to_end(&mut out).expect("Compressed body should decode.");

		out
	}

	#[test]
	fn gzip_body_reports_unknown_length() {
		let body = Body::Gzip(GzipBody::new(Bytes::from_static(b"payload")));

		assert_eq!(body.content_length(), None);
		assert!(!body.is_empty());
		assert_eq!(Body::from("abc").content_length(), Some(3));
		assert_eq!(Body::Empty.content_length(), Some(0));
		assert!(Body::from(Vec::new()).is_empty());
	}

	#[test]
	fn chunks_concatenate_to_the_compressed_stream() {
		let source = "lorem ipsum ".repeat(4096);
		let body = GzipBody::new(Bytes::from(source.clone()));
		let streamed = body
			.chunks()
			.collect::<io::Result<Vec<_>>>()
			.expect("Streaming compression should succeed.")
			.concat();

		assert_eq!(gunzip(&streamed), source.as_bytes());

		let buffered = Body::Gzip(body).to_bytes().expect("Buffered compression should succeed.");

		assert_eq!(gunzip(&buffered), source.as_bytes());
	}
}
