use std::fmt::{self, Display};

use miette::miette;

#[derive(Debug)]
pub enum Error {
    /// No account answers to this login name
    ChannelNotFound(String),

    /// The client id or the client secret is not configured
    MissingCredentials,

    /// The API answered with a non-success status code
    Status { code: u16, body: String },

    Miette(miette::Report),
}

impl From<miette::Report> for Error {
    fn from(err: miette::Report) -> Self {
        Error::Miette(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Miette(miette!("{err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Miette(miette!("Invalid JSON: {err}"))
    }
}

impl From<Error> for miette::Report {
    fn from(err: Error) -> Self {
        match err {
            Error::ChannelNotFound(login) => miette!("Channel '{login}' not found"),
            Error::MissingCredentials => miette!(
                help = "Run the program with --configure to set them",
                "Client ID or client secret not found in the configuration"
            ),
            Error::Status { code, body } => {
                miette!("Request failed with status {code}: {}", body.trim())
            }
            Error::Miette(err) => err,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ChannelNotFound(login) => write!(f, "channel '{login}' not found"),
            Error::MissingCredentials => write!(f, "missing client id or client secret"),
            Error::Status { code, body } => write!(f, "status {code}: {}", body.trim()),
            Error::Miette(report) => write!(f, "{report}"),
        }
    }
}

impl Error {
    pub fn wrap_err_with<D, F>(self, f: F) -> Error
    where
        D: Display + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match self {
            Error::Miette(report) => Error::Miette(report.wrap_err(f())),
            err => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Turn a crate result into a [`miette::Result`] to attach context to it
pub trait IntoReport<T> {
    fn into_report(self) -> miette::Result<T>;
}

impl<T> IntoReport<T> for Result<T> {
    fn into_report(self) -> miette::Result<T> {
        self.map_err(miette::Report::from)
    }
}

pub fn err_msg<D: Display>(msg: D) -> Error {
    Error::Miette(miette!("{msg}"))
}

pub fn bail<T, D: Display>(msg: D) -> Result<T> {
    Err(err_msg(msg))
}
