//! Access to the Twitch API: token lifecycle and the Helix catalog endpoints.

mod catalog;
#[cfg(test)]
pub mod fake;
mod token;

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

pub use catalog::{CatalogClient, CategoryLookup, UNKNOWN_CATEGORY};
pub use token::{TokenManager, Validation};

use crate::result::{err_msg, Error, Result};

pub const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
pub const VALIDATE_URL: &str = "https://id.twitch.tv/oauth2/validate";
pub const USERS_URL: &str = "https://api.twitch.tv/helix/users";
pub const CLIPS_URL: &str = "https://api.twitch.tv/helix/clips";
pub const GAMES_URL: &str = "https://api.twitch.tv/helix/games";

const TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP calls answering JSON.
///
/// Any non-2xx answer must be reported as [`Error::Status`].
pub trait Transport {
    fn get(&self, url: &str, query: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<Value>;

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Value>;
}

/// [`Transport`] over a shared `ureq` agent
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build();

        Self { agent }
    }

    fn into_json(url: &str, res: std::result::Result<ureq::Response, ureq::Error>) -> Result<Value> {
        match res {
            Ok(response) => {
                trace!("{url} answered {}", response.status());
                response
                    .into_json()
                    .map_err(|err| err_msg(format!("Invalid JSON answer from {url}: {err}")))
            }
            Err(ureq::Error::Status(code, response)) => Err(Error::Status {
                code,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(err) => Err(err_msg(format!("Request to {url} failed: {err}"))),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, query: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<Value> {
        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(key, value);
        }
        for (key, value) in headers {
            request = request.set(key, value);
        }

        Self::into_json(url, request.call())
    }

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Value> {
        Self::into_json(url, self.agent.post(url).send_form(form))
    }
}

/// Envelope shared by the Helix list endpoints
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    cursor: Option<String>,
}

impl<T> Page<T>
where
    T: for<'de> Deserialize<'de>,
{
    fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// The cursor for the next page, if the provider gave a usable one
    fn next_cursor(&self) -> Option<&str> {
        self.pagination.cursor.as_deref().filter(|c| !c.is_empty())
    }
}
