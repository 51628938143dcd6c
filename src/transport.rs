//! HTTP access to the thumbnail host.
//!
//! [`Transport`] is the seam between the fallback logic and the network. The
//! contract separates two outcomes that must never be confused: the server
//! answered but has nothing for us (`Ok(false)` / `Ok(None)`), or we could not
//! talk to the server at all (`Err`).

use std::{
    error::Error as StdError,
    io::{self, Read},
    iter,
    time::Duration,
};

use tracing::debug;

use crate::error::{BoxError, TransportError};

/// Upper bound on a retrieved image body.
pub const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

const USER_AGENT: &str = concat!("ytthumb/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: u32 = 5;

pub trait Transport {
    /// Lightweight existence check. `Ok(true)` when the server answers with a
    /// success status, `Ok(false)` for any HTTP-level failure status.
    fn probe(&self, url: &str, timeout: Duration) -> Result<bool, TransportError>;

    /// Full download. `Ok(None)` when the server answers with a failure status.
    fn retrieve(&self, url: &str, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn probe(&self, url: &str, timeout: Duration) -> Result<bool, TransportError> {
        (**self).probe(url, timeout)
    }

    fn retrieve(&self, url: &str, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        (**self).retrieve(url, timeout)
    }
}

/// Blocking HTTPS transport backed by a shared `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(USER_AGENT)
            .redirects(MAX_REDIRECTS)
            .build();
        Self { agent }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn probe(&self, url: &str, timeout: Duration) -> Result<bool, TransportError> {
        match self.agent.head(url).timeout(timeout).call() {
            Ok(response) => {
                debug!(%url, status = response.status(), "Probe succeeded");
                Ok(true)
            }
            Err(ureq::Error::Status(status, _)) => {
                debug!(%url, status, "Probe rejected");
                Ok(false)
            }
            Err(ureq::Error::Transport(transport)) => Err(classify_transport(url, transport)),
        }
    }

    fn retrieve(&self, url: &str, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        let response = match self.agent.get(url).timeout(timeout).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                debug!(%url, status, "Retrieval rejected");
                return Ok(None);
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(classify_transport(url, transport));
            }
        };

        let mut body = Vec::new();
        response
            .into_reader()
            .take(MAX_BODY_BYTES + 1)
            .read_to_end(&mut body)
            .map_err(|err| classify(url, Box::new(err), false))?;

        if body.len() as u64 > MAX_BODY_BYTES {
            return Err(TransportError::Other {
                url: url.to_owned(),
                source: format!("response body exceeds {MAX_BODY_BYTES} bytes").into(),
            });
        }

        debug!(%url, bytes = body.len(), "Retrieved body");
        Ok(Some(body))
    }
}

fn classify_transport(url: &str, transport: ureq::Transport) -> TransportError {
    let connecting = matches!(
        transport.kind(),
        ureq::ErrorKind::Dns | ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::ProxyConnect
    );
    classify(url, Box::new(transport), connecting)
}

/// Sorts a network failure into a subkind by inspecting its source chain.
fn classify(url: &str, source: BoxError, connecting: bool) -> TransportError {
    let root: &(dyn StdError + 'static) = source.as_ref();
    let chain = || iter::successors(Some(root), |err| (*err).source());

    let timed_out = chain()
        .filter_map(|err| err.downcast_ref::<io::Error>())
        .any(|err| matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock));
    // ureq's own rendering embeds the URL, and a video ID may contain "tls".
    let tls = chain().any(|err| {
        let text = match err.downcast_ref::<ureq::Transport>() {
            Some(transport) => transport.message().unwrap_or_default().to_ascii_lowercase(),
            None => err.to_string().to_ascii_lowercase(),
        };
        text.contains("tls") || text.contains("certificate") || text.contains("handshake")
    });

    let url = url.to_owned();
    if timed_out {
        TransportError::Timeout { url, source }
    } else if tls {
        TransportError::Tls { url, source }
    } else if connecting {
        TransportError::Connection { url, source }
    } else {
        TransportError::Other { url, source }
    }
}
