use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// A clip as returned by the clips endpoint.
///
/// Only `id` is guaranteed. Every other field defaults to an empty string
/// when the API leaves it out, the download step decides what is usable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Clip {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub broadcaster_name: String,
    #[serde(default, rename = "game_id")]
    pub category_id: String,
    #[serde(default)]
    pub created_at: String,
}

impl Clip {
    /// Parse the creation timestamp. `None` if missing or malformed.
    pub fn created_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.created_at, &Rfc3339).ok()
    }

    /// The `YYYY-MM-DD` part of the creation timestamp
    pub fn created_date(&self) -> Option<&str> {
        self.created_at
            .split_once('T')
            .map(|(date, _)| date)
            .filter(|date| !date.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_helix_clip() {
        let clip: Clip = serde_json::from_value(serde_json::json!({
            "id": "AwkwardHelplessSalamanderSwiftRage",
            "url": "https://clips.twitch.tv/AwkwardHelplessSalamanderSwiftRage",
            "broadcaster_name": "exampleuser",
            "creator_name": "someone",
            "game_id": "33214",
            "title": "Epic Win!! :)",
            "view_count": 10,
            "created_at": "2024-01-01T12:34:56Z"
        }))
        .unwrap();

        assert_eq!(clip.category_id, "33214");
        assert_eq!(clip.created_date(), Some("2024-01-01"));
        assert_eq!(clip.created_at().unwrap().hour(), 12);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let clip: Clip = serde_json::from_value(serde_json::json!({ "id": "x" })).unwrap();

        assert!(clip.url.is_empty());
        assert_eq!(clip.created_at(), None);
        assert_eq!(clip.created_date(), None);
    }
}
