//! Interactive input. Everything returned from here is already validated.

use std::{
    io::{self, BufRead, StdinLock, Stdout, Write},
    path::PathBuf,
};

use owo_colors::OwoColorize;

use crate::{
    result::{bail, Result},
    settings::{ConfigStore, Credentials, Sections, UserPreferences},
    types::TimeRange,
};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print the question and read one line, without its line ending
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{} ", question.bold())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return bail("Input closed while waiting for an answer");
        }

        let len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(len);
        Ok(line)
    }

    /// Ask for a value, an empty answer keeps `current`
    fn ask_keep(&mut self, what: &str, current: &str, trim: bool) -> Result<String> {
        let question = if current.is_empty() {
            format!("Enter {what}:")
        } else {
            format!("Enter {what} or press Enter to keep '{current}':")
        };

        let answer = self.ask(&question)?;
        let answer = if trim { answer.trim().to_owned() } else { answer };
        Ok(if answer.is_empty() {
            current.to_owned()
        } else {
            answer
        })
    }

    /// Same as [`Self::ask_keep`] without echoing the current value
    fn ask_keep_secret(&mut self, what: &str, current: &str) -> Result<String> {
        let question = if current.is_empty() {
            format!("Enter {what}:")
        } else {
            format!("Enter {what} or press Enter to keep the current one:")
        };

        let answer = self.ask(&question)?.trim().to_owned();
        Ok(if answer.is_empty() {
            current.to_owned()
        } else {
            answer
        })
    }

    /// Update the preferences and credentials, then save both sections
    pub fn configure(&mut self, store: &mut ConfigStore) -> Result<()> {
        let user = store.user().clone();
        let auth = store.auth().clone();

        let default_channel_name =
            self.ask_keep("the default Twitch channel", &user.default_channel_name, true)?;

        let current_dir = if user.output_directory.as_os_str().is_empty() {
            dirs::download_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_default()
        } else {
            user.output_directory.clone()
        };
        let output_directory = PathBuf::from(self.ask_keep(
            "the download folder",
            &current_dir.to_string_lossy(),
            true,
        )?);

        let spacer = self.ask_keep("the spacer to use in file names", &user.spacer, false)?;
        let client_id = self.ask_keep("the Client ID", &auth.client_id, true)?;
        let client_secret = self.ask_keep_secret("the Client Secret", &auth.client_secret)?;

        let new_user = UserPreferences {
            default_channel_name,
            output_directory,
            spacer,
        };
        new_user.validate()?;
        if client_id.is_empty() {
            return bail("The Client ID cannot be empty");
        }
        if client_secret.is_empty() {
            return bail("The Client Secret cannot be empty");
        }

        let mut new_auth = Credentials {
            client_id,
            client_secret,
            ..auth.clone()
        };
        if new_auth.client_id != auth.client_id {
            // A token belongs to the client that requested it
            new_auth.clear_token();
        }

        store.set_user(new_user);
        store.set_auth(new_auth);
        store.save(Sections::USER | Sections::AUTH)
    }

    /// The channel to fetch clips from, empty answer selects the default
    pub fn channel_name(&mut self, default: &str) -> Result<String> {
        let question = if default.is_empty() {
            "Please enter the Twitch channel name:".to_owned()
        } else {
            format!("Please enter the Twitch channel name (Default: {default}):")
        };

        let answer = self.ask(&question)?.trim().to_owned();
        match (answer.is_empty(), default.is_empty()) {
            (false, _) => Ok(answer),
            (true, false) => Ok(default.to_owned()),
            (true, true) => bail("No channel name given and no default channel configured"),
        }
    }

    pub fn time_range(&mut self) -> Result<TimeRange> {
        let start = self.ask("Please enter the start date for the clips (YYYY-MM-DD):")?;
        let end = self.ask("Please enter the end date for the clips (YYYY-MM-DD):")?;

        TimeRange::from_days(&start, &end)
    }

    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} [y/N]"))?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}
