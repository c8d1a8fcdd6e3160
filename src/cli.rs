use clap::{arg, command, ArgMatches, Command};

/// Command-line flags. Everything else is asked interactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Args {
    /// Enter or update the preferences and credentials, then exit
    pub configure: bool,

    /// Go through the whole run without transferring any clip
    pub simulate: bool,
}

fn command() -> Command {
    command!()
        .about("Download the clips of a Twitch channel for a date range")
        .arg(arg!(-c --configure "Configure the default channel, download folder and Twitch credentials"))
        .arg(arg!(-s --simulate "Do everything except downloading the clips"))
}

impl Args {
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            configure: matches.get_flag("configure"),
            simulate: matches.get_flag("simulate"),
        }
    }
}
