use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{Page, Transport, CLIPS_URL, GAMES_URL, USERS_URL};
use crate::{
    result::{Error, Result},
    settings::Credentials,
    types::{Clip, TimeRange},
};

/// Display name used when a category cannot be resolved
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Resolve a category id into its display name
pub trait CategoryLookup {
    /// Never fails, unknown ids resolve to [`UNKNOWN_CATEGORY`]
    fn category_name(&mut self, category_id: &str) -> String;
}

/// Category names already looked up during this run.
///
/// Failed lookups are stored as [`UNKNOWN_CATEGORY`] too, so a broken id
/// costs a single request. Entries are never invalidated.
#[derive(Debug, Default)]
pub struct CategoryCache {
    names: HashMap<String, String>,
}

impl CategoryCache {
    pub fn get_or_fetch<F>(&mut self, category_id: &str, fetch: F) -> &str
    where
        F: FnOnce() -> Option<String>,
    {
        self.names
            .entry(category_id.to_owned())
            .or_insert_with(|| fetch().unwrap_or_else(|| UNKNOWN_CATEGORY.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Category {
    name: String,
}

/// Read-only access to channels, clips and categories
pub struct CatalogClient<'a> {
    transport: &'a dyn Transport,
    client_id: String,
    authorization: String,
    categories: CategoryCache,
}

impl<'a> CatalogClient<'a> {
    pub fn new(transport: &'a dyn Transport, credentials: &Credentials) -> Self {
        Self {
            transport,
            client_id: credentials.client_id.clone(),
            authorization: format!("Bearer {}", credentials.access_token),
            categories: CategoryCache::default(),
        }
    }

    fn headers(&self) -> [(&str, &str); 2] {
        [
            ("Client-ID", self.client_id.as_str()),
            ("Authorization", self.authorization.as_str()),
        ]
    }

    /// Get the stable id of the channel with this login name
    pub fn resolve_channel_id(&self, login: &str) -> Result<String> {
        let answer = self
            .transport
            .get(USERS_URL, &[("login", login)], &self.headers())
            .map_err(|err| err.wrap_err_with(|| format!("Could not look up channel '{login}'")))?;
        let page: Page<User> = Page::from_value(answer)?;

        page.data
            .into_iter()
            .next()
            .map(|user| user.id)
            .ok_or_else(|| Error::ChannelNotFound(login.to_owned()))
    }

    /// Append to `clips` every clip of the channel created in the range,
    /// following the pagination cursor until the provider gives none.
    ///
    /// On error, the clips of the pages already received stay in `clips`.
    pub fn fetch_clips(
        &self,
        broadcaster_id: &str,
        range: &TimeRange,
        page_size: u8,
        clips: &mut Vec<Clip>,
    ) -> Result<()> {
        let first = page_size.to_string();
        let started_at = range.started_at();
        let ended_at = range.ended_at();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![
                ("broadcaster_id", broadcaster_id),
                ("first", first.as_str()),
                ("started_at", started_at.as_str()),
                ("ended_at", ended_at.as_str()),
            ];
            if let Some(after) = cursor.as_deref() {
                query.push(("after", after));
            }

            let answer = self.transport.get(CLIPS_URL, &query, &self.headers())?;
            let page: Page<Clip> = Page::from_value(answer)?;

            let received = page.data.len();
            let next = page.next_cursor().map(str::to_owned);
            clips.extend(page.data);
            debug!("Received {received} clips, {} so far", clips.len());

            match next {
                None => break,
                Some(_) if received == 0 => {
                    debug!("Empty page still carrying a cursor, stopping");
                    break;
                }
                Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                    warn!("The API returned the same cursor twice, stopping");
                    break;
                }
                Some(next) => cursor = Some(next),
            }
        }

        Ok(())
    }

    pub fn cached_categories(&self) -> usize {
        self.categories.len()
    }
}

impl CategoryLookup for CatalogClient<'_> {
    fn category_name(&mut self, category_id: &str) -> String {
        let headers = [
            ("Client-ID", self.client_id.as_str()),
            ("Authorization", self.authorization.as_str()),
        ];
        let transport = self.transport;

        self.categories
            .get_or_fetch(category_id, || {
                if category_id.is_empty() {
                    None
                } else {
                    lookup_category(transport, &headers, category_id)
                }
            })
            .to_owned()
    }
}

fn lookup_category(
    transport: &dyn Transport,
    headers: &[(&str, &str)],
    category_id: &str,
) -> Option<String> {
    let answer = transport
        .get(GAMES_URL, &[("id", category_id)], headers)
        .and_then(Page::<Category>::from_value);

    match answer {
        Ok(page) => {
            let name = page.data.into_iter().next().map(|category| category.name);
            if name.is_none() {
                debug!("No category with id {category_id}");
            }
            name
        }
        Err(err) => {
            warn!("Could not fetch the name of category {category_id}: {err}");
            None
        }
    }
}
