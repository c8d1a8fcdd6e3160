//! Whole runs against the in-memory transport and the stub downloader.

use serde_json::{json, Value};
use tempfile::TempDir;

use crate::{
    batch::{self, PAGE_SIZES},
    download::{Downloader, Outcome},
    helix::{
        fake::{FakeTransport, Request},
        CatalogClient, TokenManager, Validation, CLIPS_URL, GAMES_URL, TOKEN_URL, USERS_URL,
        VALIDATE_URL,
    },
    outside::stub::StubTransfer,
    result::{Error, Result},
    settings::{ConfigStore, Credentials, Sections, UserPreferences, CONFIG_FILE},
    types::TimeRange,
};

fn clip(id: &str, title: &str, game_id: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "url": format!("https://clips.twitch.tv/{id}"),
        "title": title,
        "creator_name": "viewer_42",
        "broadcaster_name": "exampleuser",
        "game_id": game_id,
        "created_at": created_at,
    })
}

fn twitch(req: &Request) -> Result<Value> {
    match req.url.as_str() {
        TOKEN_URL => Ok(json!({
            "access_token": "fresh-token",
            "expires_in": 3600,
            "token_type": "bearer",
        })),
        VALIDATE_URL => Err(Error::Status {
            code: 401,
            body: "invalid access token".to_owned(),
        }),
        USERS_URL => match req.param("login") {
            Some("exampleuser") => Ok(json!({ "data": [{ "id": "12345", "login": "exampleuser" }] })),
            _ => Ok(json!({ "data": [] })),
        },
        CLIPS_URL => match req.param("after") {
            None => Ok(json!({
                "data": [
                    clip("SecondClip", "Clutch play?!", "509658", "2024-01-02T18:30:00Z"),
                    clip("FirstClip", "Morning stream :)", "509658", "2024-01-01T09:15:00Z"),
                ],
                "pagination": { "cursor": "page-2" },
            })),
            Some("page-2") => Ok(json!({
                "data": [clip("ThirdClip", "GG", "21779", "2024-01-02T20:00:00Z")],
                "pagination": {},
            })),
            Some(other) => panic!("unexpected cursor {other}"),
        },
        GAMES_URL => match req.param("id") {
            Some("509658") => Ok(json!({ "data": [{ "id": "509658", "name": "Just Chatting" }] })),
            Some("21779") => Ok(json!({ "data": [{ "id": "21779", "name": "League of Legends" }] })),
            _ => Ok(json!({ "data": [] })),
        },
        url => panic!("unexpected request to {url}"),
    }
}

fn configured_store(dir: &TempDir) -> ConfigStore {
    let mut store = ConfigStore::load(dir.path().join(CONFIG_FILE)).unwrap();
    store.set_user(UserPreferences {
        default_channel_name: "exampleuser".to_owned(),
        output_directory: dir.path().join("clips"),
        spacer: " ¦ ".to_owned(),
    });
    store.set_auth(Credentials {
        client_id: "client".to_owned(),
        client_secret: "secret".to_owned(),
        access_token: "stale-token".to_owned(),
        expires_at: "2020-01-01T00:00:00Z".to_owned(),
    });
    store.save(Sections::USER | Sections::AUTH).unwrap();
    store
}

#[test]
fn fetch_and_download_a_channel() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = configured_store(&dir);
    let transport = FakeTransport::new(twitch);

    let credentials = TokenManager::new(&transport, &mut store)
        .ensure_valid(Validation::Remote)
        .unwrap();
    assert_eq!(credentials.access_token, "fresh-token");
    assert_eq!(transport.count(TOKEN_URL), 1);
    // Expired locally, so the platform is never asked
    assert_eq!(transport.count(VALIDATE_URL), 0);

    let reloaded = ConfigStore::load(store.path()).unwrap();
    assert_eq!(reloaded.auth().access_token, "fresh-token");

    let mut catalog = CatalogClient::new(&transport, &credentials);
    let broadcaster_id = catalog.resolve_channel_id("exampleuser").unwrap();
    assert_eq!(broadcaster_id, "12345");

    let range = TimeRange::from_days("2024-01-01", "2024-01-02").unwrap();
    let clips = batch::fetch_all(&catalog, &broadcaster_id, &range, &PAGE_SIZES);
    let ids: Vec<&str> = clips.iter().map(|clip| clip.id.as_str()).collect();
    assert_eq!(ids, ["FirstClip", "SecondClip", "ThirdClip"]);
    // Two pages for each of the two passes
    assert_eq!(transport.count(CLIPS_URL), 4);

    let clip_requests: Vec<Request> = transport
        .requests()
        .iter()
        .filter(|req| req.url == CLIPS_URL)
        .cloned()
        .collect();
    assert!(clip_requests.iter().all(|req| {
        req.param("broadcaster_id") == Some("12345")
            && req.param("started_at") == Some("2024-01-01T00:00:00Z")
            && req.param("ended_at") == Some("2024-01-03T00:00:00Z")
            && req.header("Authorization") == Some("Bearer fresh-token")
            && req.header("Client-ID") == Some("client")
    }));

    let transfer = StubTransfer::new();
    let user = store.user();
    let report = Downloader::new(&transfer, user, false)
        .download_all(&clips, &mut catalog)
        .unwrap();

    assert_eq!(transfer.calls(), 3);
    assert_eq!(report.count(Outcome::Downloaded), 3);
    assert_eq!(
        report.paths(),
        [
            user.output_directory
                .join("2024-01-01 ¦ Just Chatting ¦ Morning stream ¦ viewer_42.mp4"),
            user.output_directory
                .join("2024-01-02 ¦ Just Chatting ¦ Clutch play ¦ viewer_42.mp4"),
            user.output_directory
                .join("2024-01-02 ¦ League of Legends ¦ GG ¦ viewer_42.mp4"),
        ]
    );
    assert!(report.paths().iter().all(|path| path.is_file()));
    assert_eq!(transport.count(GAMES_URL), 2);

    // A second run finds everything on disk
    let transfer = StubTransfer::new();
    let report = Downloader::new(&transfer, user, false)
        .download_all(&clips, &mut catalog)
        .unwrap();

    assert_eq!(transfer.calls(), 0);
    assert_eq!(report.count(Outcome::AlreadyPresent), 3);
    assert_eq!(transport.count(GAMES_URL), 2);
}

#[test]
fn unknown_channel_stops_before_fetching_clips() {
    let transport = FakeTransport::new(twitch);
    let credentials = Credentials {
        client_id: "client".to_owned(),
        client_secret: "secret".to_owned(),
        access_token: "token".to_owned(),
        expires_at: String::new(),
    };
    let catalog = CatalogClient::new(&transport, &credentials);

    let err = catalog.resolve_channel_id("nobody_here").unwrap_err();

    assert!(matches!(err, Error::ChannelNotFound(login) if login == "nobody_here"));
    assert_eq!(transport.count(CLIPS_URL), 0);
}

#[test]
fn simulated_run_leaves_the_disk_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = configured_store(&dir);
    let transport = FakeTransport::new(twitch);
    let mut catalog = CatalogClient::new(&transport, store.auth());
    let range = TimeRange::from_days("2024-01-01", "2024-01-02").unwrap();

    let clips = batch::fetch_all(&catalog, "12345", &range, &PAGE_SIZES);
    let transfer = StubTransfer::new();
    let report = Downloader::new(&transfer, store.user(), true)
        .download_all(&clips, &mut catalog)
        .unwrap();

    assert_eq!(report.count(Outcome::Simulated), 3);
    assert_eq!(transfer.calls(), 0);
    assert!(!store.user().output_directory.exists());
}
