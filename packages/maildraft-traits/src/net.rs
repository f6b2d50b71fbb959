pub use bytes::Bytes;
pub use http::{self, HeaderMap, Method};
use std::fmt;
use std::marker::PhantomData;
pub use url::Url;

pub type SharedProvider = std::sync::Arc<dyn NetProvider>;
pub type BoxedHandler = Box<dyn NetHandler>;

/// A type that performs network requests on behalf of an editor session.
pub trait NetProvider: Send + Sync + 'static {
    fn fetch(&self, session_id: usize, request: Request, handler: BoxedHandler);
}

/// A type which accepts the settled result of a network request and sends
/// it back to the editor session (or does arbitrary things with it).
pub trait NetHandler: Send + Sync + 'static {
    fn complete(self: Box<Self>, session_id: usize, result: Result<Response, NetError>);
}

/// A request loosely representing https://fetch.spec.whatwg.org/#requests
#[derive(Debug)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub content_type: String,
    pub body: Bytes,
}

impl Request {
    /// A GET request to the specified Url with an empty body
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: HeaderMap::new(),
            content_type: String::new(),
            body: Bytes::new(),
        }
    }

    /// A POST request carrying a JSON payload
    pub fn post_json(url: Url, body: Bytes) -> Self {
        Self {
            url,
            method: Method::POST,
            headers: HeaderMap::new(),
            content_type: String::from("application/json"),
            body,
        }
    }
}

/// An HTTP response
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub enum NetError {
    /// The server answered with a non-success status code.
    Status(u16),
    /// The request never completed (DNS, connect, timeout, ...).
    Transport(String),
    /// The response body could not be interpreted.
    Decode(String),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Status(code) => write!(f, "request failed with status {code}"),
            NetError::Transport(msg) => write!(f, "transport error: {msg}"),
            NetError::Decode(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for NetError {}

/// A default noop NetProvider
pub struct DummyNetProvider(PhantomData<()>);
impl Default for DummyNetProvider {
    fn default() -> Self {
        Self(PhantomData)
    }
}
impl NetProvider for DummyNetProvider {
    fn fetch(&self, _session_id: usize, _request: Request, _handler: BoxedHandler) {}
}
