//! [`ClipTransfer`] recording its calls instead of running yt-dlp.

use std::{
    cell::RefCell,
    path::{Path, PathBuf},
};

use super::ClipTransfer;
use crate::result::{bail, Result};

#[derive(Debug, Default)]
pub struct StubTransfer {
    calls: RefCell<Vec<(String, PathBuf)>>,
    failing_urls: Vec<String>,
    skip_write: bool,
}

impl StubTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Downloads of this URL fail
    pub fn failing_on(mut self, url: &str) -> Self {
        self.failing_urls.push(url.to_owned());
        self
    }

    /// Report success without creating the output file
    pub fn without_writing(mut self) -> Self {
        self.skip_write = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(url, _)| url.clone()).collect()
    }
}

impl ClipTransfer for StubTransfer {
    fn download(&self, url: &str, output: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push((url.to_owned(), output.to_path_buf()));

        if self.failing_urls.iter().any(|failing| failing == url) {
            return bail(format!("{url}: HTTP Error 404: Not Found"));
        }
        if !self.skip_write {
            std::fs::write(output, url)?;
        }
        Ok(())
    }
}
