//! Blocking JSON GET on top of ureq, and the bridge onto the async runtime.

use serde::de::DeserializeOwned;

use crate::error::SourceError;

/// GET `url` and decode the body as JSON.
pub(crate) fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, SourceError> {
    get_json_with_headers(url, &[("accept", "application/json")])
}

/// GET `url` with extra request headers and decode the body as JSON.
pub(crate) fn get_json_with_headers<T: DeserializeOwned>(
    url: &str,
    headers: &[(&str, &str)],
) -> Result<T, SourceError> {
    let agent = ureq::Agent::new_with_defaults();
    let mut request = agent.get(url);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let response = request.call().map_err(|e| SourceError::http(url, e))?;

    response
        .into_body()
        .read_json::<T>()
        .map_err(|e| SourceError::parse(url, e))
}

/// Run a blocking request on the blocking pool. ureq is synchronous.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, SourceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SourceError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SourceError::Join(e.to_string()))?
}

/// Percent-encode a path segment. Chain names carry spaces ("Cosmos Hub").
pub(crate) fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_spaces_and_reserved() {
        assert_eq!(encode_segment("Cosmos Hub"), "Cosmos%20Hub");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("zkSync-Era_1.0~"), "zkSync-Era_1.0~");
    }
}
