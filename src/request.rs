//! Request and response models crossing the interception boundary.

// std
use std::io;
// crates.io
use futures::stream::BoxStream;
// self
use crate::_prelude::*;

/// Single-consumption byte stream backing a request body.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Body variants an intercepted request may carry.
///
/// A stream may be read at most once; cloning refuses rather than buffering it, so rewrites
/// and retries must decide up front whether they need a materialized body.
pub enum RequestBody {
	/// No body.
	Empty,
	/// Fully materialized body bytes.
	Buffered(Bytes),
	/// Unread byte stream forwarded to the transport without buffering.
	Streamed(ByteStream),
}
impl RequestBody {
	/// Returns a clone when the body is replayable (empty or buffered).
	pub fn try_clone(&self) -> Option<Self> {
		match self {
			Self::Empty => Some(Self::Empty),
			Self::Buffered(bytes) => Some(Self::Buffered(bytes.clone())),
			Self::Streamed(_) => None,
		}
	}

	/// Returns the materialized bytes, if any.
	pub fn as_buffered(&self) -> Option<&Bytes> {
		match self {
			Self::Buffered(bytes) => Some(bytes),
			_ => None,
		}
	}
}
impl Default for RequestBody {
	fn default() -> Self {
		Self::Empty
	}
}
impl Debug for RequestBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Empty => f.write_str("RequestBody::Empty"),
			Self::Buffered(bytes) => write!(f, "RequestBody::Buffered({} bytes)", bytes.len()),
			Self::Streamed(_) => f.write_str("RequestBody::Streamed(..)"),
		}
	}
}

/// Fetch directives preserved verbatim when a request is rewritten.
///
/// The relay never interprets these; they ride along so the hosting transport can honor the
/// page's original credentials/caching/redirect semantics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestDirectives {
	/// Credentials mode requested by the page.
	pub credentials: Option<String>,
	/// Cache mode requested by the page.
	pub cache: Option<String>,
	/// Redirect mode requested by the page.
	pub redirect: Option<String>,
	/// Referrer the page supplied.
	pub referrer: Option<String>,
}

/// The original request captured by the interception controller.
#[derive(Debug)]
pub struct InterceptedRequest {
	/// HTTP method.
	pub method: Method,
	/// Raw request URL; classification parses it and fails open on malformed values.
	pub url: String,
	/// Request headers.
	pub headers: HeaderMap,
	/// Request body.
	pub body: RequestBody,
	/// Fetch directives carried through rewrites untouched.
	pub directives: RequestDirectives,
}
impl InterceptedRequest {
	/// Creates a bodyless request.
	pub fn new(method: Method, url: impl Into<String>) -> Self {
		Self {
			method,
			url: url.into(),
			headers: HeaderMap::new(),
			body: RequestBody::Empty,
			directives: RequestDirectives::default(),
		}
	}

	/// Replaces the headers wholesale.
	pub fn with_headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;

		self
	}

	/// Attaches a buffered body.
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = RequestBody::Buffered(body.into());

		self
	}

	/// Attaches an unread byte stream as the body.
	pub fn with_streamed_body(mut self, stream: ByteStream) -> Self {
		self.body = RequestBody::Streamed(stream);

		self
	}

	/// Attaches fetch directives.
	pub fn with_directives(mut self, directives: RequestDirectives) -> Self {
		self.directives = directives;

		self
	}

	/// Clones the request when its body is replayable.
	///
	/// Returns `None` for streamed bodies: the stream is single-consumption and a retry could
	/// never replay it.
	pub fn try_clone(&self) -> Option<Self> {
		Some(Self {
			method: self.method.clone(),
			url: self.url.clone(),
			headers: self.headers.clone(),
			body: self.body.try_clone()?,
			directives: self.directives.clone(),
		})
	}
}

/// Materialized upstream response handed back to the application.
#[derive(Clone, Debug)]
pub struct InterceptedResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// Response headers copied from upstream.
	pub headers: HeaderMap,
	/// Response body bytes.
	pub body: Bytes,
}
impl InterceptedResponse {
	/// Builds a response from its parts.
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
		Self { status, headers, body: body.into() }
	}

	/// Replaces the body, correcting `Content-Length` so the laundered payload stays coherent.
	pub fn with_replaced_body(mut self, body: impl Into<Bytes>) -> Self {
		let body = body.into();

		self.headers.insert(http::header::CONTENT_LENGTH, HeaderValue::from(body.len()));
		self.body = body;

		self
	}
}
