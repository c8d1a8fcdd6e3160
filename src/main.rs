mod batch;
mod cli;
mod download;
mod helix;
#[cfg(test)]
mod integration_tests;
mod logging;
mod outside;
mod prompt;
mod result;
mod settings;
mod types;

use miette::{Context, Result};
use tracing::{debug, info, warn, Level};

use crate::{
    batch::PAGE_SIZES,
    cli::Args,
    download::Downloader,
    helix::{CatalogClient, TokenManager, UreqTransport, Validation},
    logging::init_logging,
    outside::{Player, Ytdl},
    prompt::Prompter,
    result::IntoReport,
    settings::{ConfigStore, CONFIG_FILE},
};

fn main() -> Result<()> {
    // Initialize the environment & CLI
    init_logging(Level::INFO)?;
    let args = Args::parse();

    let mut store = ConfigStore::load(CONFIG_FILE)?;
    let mut prompter = Prompter::stdio();

    if args.configure || !store.exists() {
        prompter
            .configure(&mut store)
            .into_report()
            .wrap_err("Configuration not saved")?;
        if args.configure {
            return Ok(());
        }
    }

    // Fatal preconditions, checked before any request
    let ytdl = Ytdl::new()
        .into_report()
        .wrap_err("Install yt-dlp to download clips")?;
    store
        .user()
        .validate()
        .into_report()
        .wrap_err("Run with --configure to fix it")?;

    let channel = prompter.channel_name(&store.user().default_channel_name)?;
    let range = prompter.time_range()?;

    let transport = UreqTransport::new();
    let credentials = TokenManager::new(&transport, &mut store)
        .ensure_valid(Validation::Remote)
        .into_report()
        .wrap_err("Could not get a usable access token")?;
    let user = store.user();

    let mut catalog = CatalogClient::new(&transport, &credentials);
    let broadcaster_id = catalog.resolve_channel_id(&channel)?;

    info!("Fetching clips for channel {channel}");
    let clips = batch::fetch_all(&catalog, &broadcaster_id, &range, &PAGE_SIZES);
    if clips.is_empty() {
        info!("No clips found");
        return Ok(());
    }

    if args.simulate {
        info!("{} clips found. Simulating the download", clips.len());
    } else {
        info!("{} clips found. Starting download", clips.len());
    }
    let report = Downloader::new(&ytdl, user, args.simulate).download_all(&clips, &mut catalog)?;
    info!("All clips processed: {report}");
    debug!("{} categories looked up", catalog.cached_categories());

    if !report.is_empty() && prompter.confirm("Play the clips in VLC?")? {
        let player = Player::find();
        if let Err(err) = player.play(&report.paths()) {
            warn!("Could not start {}: {err}", player.program().display());
        }
    }

    Ok(())
}
