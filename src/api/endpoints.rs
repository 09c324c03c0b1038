//! URL construction for the chat backend.
//!
//! The streaming base follows the HTTP base's transport security
//! (`http` → `ws`, `https` → `wss`) unless an explicit override is given.

use url::Url;

use crate::api::source::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    http_base: Url,
    ws_base: Url,
}

impl Endpoints {
    pub fn new(http_base: &str, ws_override: Option<&str>) -> Result<Self, ApiError> {
        let http_base = Url::parse(http_base)
            .map_err(|e| ApiError::Config(format!("invalid server URL {http_base:?}: {e}")))?;

        let ws_scheme = match http_base.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(ApiError::Config(format!(
                    "server URL must be http or https, got {other}"
                )));
            }
        };

        let ws_base = match ws_override {
            Some(raw) => {
                let url = Url::parse(raw)
                    .map_err(|e| ApiError::Config(format!("invalid socket URL {raw:?}: {e}")))?;
                if !matches!(url.scheme(), "ws" | "wss") {
                    return Err(ApiError::Config(format!(
                        "socket URL must be ws or wss, got {}",
                        url.scheme()
                    )));
                }
                url
            }
            None => {
                let mut url = http_base.clone();
                url.set_scheme(ws_scheme).map_err(|()| {
                    ApiError::Config(format!("cannot derive socket URL from {http_base}"))
                })?;
                url
            }
        };

        Ok(Self { http_base, ws_base })
    }

    pub fn http_base(&self) -> &Url {
        &self.http_base
    }

    pub fn ws_base(&self) -> &Url {
        &self.ws_base
    }

    pub fn history(&self, room: &str) -> Url {
        with_segments(&self.http_base, &["api", "conversations", room, "messages", ""])
    }

    pub fn conversations(&self) -> Url {
        with_segments(&self.http_base, &["api", "conversations", ""])
    }

    pub fn conversation(&self, name: &str) -> Url {
        with_segments(&self.http_base, &["api", "conversations", name, ""])
    }

    pub fn dashboard_stats(&self) -> Url {
        with_segments(&self.http_base, &["api", "dashboard", "stats", ""])
    }

    pub fn room_socket(&self, room: &str) -> Url {
        with_segments(&self.ws_base, &["ws", "chat", room, ""])
    }
}

/// Append path segments (percent-encoded) after any prefix already in `base`.
/// A trailing `""` segment yields a trailing slash.
fn with_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
