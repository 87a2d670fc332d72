mod error;

use std::fs::File;
use std::path::Path;
use std::time::Instant;

pub use error::{FetchError, FetchResult};

const USER_AGENT: &str = concat!("treeforge/", env!("CARGO_PKG_VERSION"));

/// A successfully fetched text resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedText {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Blocking GET of `url`, decoding the body as UTF-8 (lossy).
///
/// Any 4xx/5xx answer is a [`FetchError::Status`]; failures before a status
/// line arrives are [`FetchError::Transport`].
pub fn fetch_text(url: &str) -> FetchResult<FetchedText> {
    if url.trim().is_empty() {
        return Err(FetchError::InvalidTarget(url.to_string()));
    }

    let start = Instant::now();
    let agent = ureq::AgentBuilder::new().user_agent(USER_AGENT).build();
    let response = match agent.get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(status, _)) => {
            log::debug!(target: "net", "GET {url} -> {status}");
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: transport.to_string(),
            });
        }
    };

    let final_url = response.get_url().to_string();
    let status = response.status();
    let content_type = response.header("content-type").map(str::to_string);
    let body = tools::read_utf8(response.into_reader()).map_err(|e| FetchError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    log::debug!(
        target: "net",
        "GET {url} -> {status} ({} bytes, {:?}) in {}ms",
        body.len(),
        content_type,
        start.elapsed().as_millis()
    );

    Ok(FetchedText {
        url: final_url,
        status,
        content_type,
        body,
    })
}

/// Reads a whole file as UTF-8 (lossy).
pub fn read_text(path: &Path) -> FetchResult<String> {
    if path.as_os_str().is_empty() {
        return Err(FetchError::InvalidTarget(String::new()));
    }
    let io_error = |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let text = tools::read_utf8(file).map_err(io_error)?;
    log::trace!(target: "net", "read {} bytes from {}", text.len(), path.display());
    Ok(text)
}
