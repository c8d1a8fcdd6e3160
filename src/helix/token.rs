use serde::Deserialize;
use time::{
    format_description::{well_known::Rfc3339, FormatItem},
    macros::format_description,
    Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset,
};
use tracing::{debug, info, warn};

use super::{Transport, TOKEN_URL, VALIDATE_URL};
use crate::{
    result::{err_msg, Error, Result},
    settings::{ConfigStore, Credentials, Sections},
};

/// Expiry format written by older versions, in local time
const LEGACY_EXPIRY_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// How far to go when checking a stored token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Only check the stored expiry
    #[cfg_attr(not(test), allow(dead_code))]
    Local,
    /// Also ask the platform whether the token is still accepted
    Remote,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Owns the client-credentials token lifecycle: check, renew, persist.
pub struct TokenManager<'a> {
    transport: &'a dyn Transport,
    store: &'a mut ConfigStore,
}

impl<'a> TokenManager<'a> {
    pub fn new(transport: &'a dyn Transport, store: &'a mut ConfigStore) -> Self {
        Self { transport, store }
    }

    /// Whether the stored token can be used for API calls
    pub fn is_valid(&self, validation: Validation) -> bool {
        self.is_valid_at(OffsetDateTime::now_utc(), validation)
    }

    fn is_valid_at(&self, now: OffsetDateTime, validation: Validation) -> bool {
        let auth = self.store.auth();
        if auth.access_token.is_empty() {
            debug!("No access token stored");
            return false;
        }

        match parse_expiry(&auth.expires_at) {
            Some(expires_at) if expires_at > now => {}
            Some(expires_at) => {
                debug!("Access token expired at {expires_at}");
                return false;
            }
            None => {
                warn!("Invalid expiry date '{}' in the configuration", auth.expires_at);
                return false;
            }
        }

        match validation {
            Validation::Local => true,
            Validation::Remote => self.validate_remotely(&auth.access_token),
        }
    }

    fn validate_remotely(&self, token: &str) -> bool {
        let authorization = format!("Bearer {token}");
        match self
            .transport
            .get(VALIDATE_URL, &[], &[("Authorization", authorization.as_str())])
        {
            Ok(_) => true,
            Err(err) => {
                debug!("Access token refused by the platform: {err}");
                false
            }
        }
    }

    /// Exchange the client id and secret for a new access token and save it.
    ///
    /// Fails without any request if the client pair is not configured.
    pub fn renew(&mut self) -> Result<Credentials> {
        self.renew_at(OffsetDateTime::now_utc())
    }

    fn renew_at(&mut self, now: OffsetDateTime) -> Result<Credentials> {
        let mut credentials = self.store.auth().clone();
        if !credentials.has_client() {
            return Err(Error::MissingCredentials);
        }

        let answer = self
            .transport
            .post_form(
                TOKEN_URL,
                &[
                    ("client_id", credentials.client_id.as_str()),
                    ("client_secret", credentials.client_secret.as_str()),
                    ("grant_type", "client_credentials"),
                ],
            )
            .map_err(|err| err.wrap_err_with(|| "Could not renew the access token"))?;
        let token: TokenResponse = serde_json::from_value(answer)?;

        let expires_at = now
            .checked_add(Duration::seconds(token.expires_in))
            .ok_or_else(|| err_msg(format!("Invalid token lifetime of {}s", token.expires_in)))?;
        credentials.access_token = token.access_token;
        credentials.expires_at = format_expiry(expires_at);

        self.store.set_auth(credentials.clone());
        self.store.save(Sections::AUTH)?;

        info!("Access token renewed, expires at {}", credentials.expires_at);
        Ok(credentials)
    }

    /// Return usable credentials, renewing the token if needed
    pub fn ensure_valid(&mut self, validation: Validation) -> Result<Credentials> {
        if self.is_valid(validation) {
            debug!("Stored access token is valid");
            Ok(self.store.auth().clone())
        } else {
            info!("Access token is invalid or expired. Renewing it");
            self.renew()
        }
    }
}

fn parse_expiry(value: &str) -> Option<OffsetDateTime> {
    if let Ok(instant) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(instant);
    }

    let local = PrimitiveDateTime::parse(value, LEGACY_EXPIRY_FORMAT).ok()?;
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    Some(local.assume_offset(offset))
}

fn format_expiry(instant: OffsetDateTime) -> String {
    let instant = instant.to_offset(UtcOffset::UTC);
    let instant = instant.replace_nanosecond(0).unwrap_or(instant);
    instant
        .format(&Rfc3339)
        .unwrap_or_else(|_| instant.unix_timestamp().to_string())
}
