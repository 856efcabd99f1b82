use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use packhorse_config::SourceValidator;
use packhorse_engine::Fetcher;

/// Download service backed by a blocking HTTP client. Progress is drawn to
/// stderr and disappears on non-interactive terminals.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {url} failed"))?;
        if !response.status().is_success() {
            return Err(anyhow!("GET {url} returned {}", response.status()));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = fs::File::create(dest)
            .with_context(|| format!("failed to create {}", dest.display()))?;

        let progress_bar = download_progress("download", response.content_length());
        let mut writer = progress_bar.wrap_write(file);
        let copied = io::copy(&mut response, &mut writer)
            .with_context(|| format!("failed to write {}", dest.display()))?;
        progress_bar.finish_and_clear();

        debug!("fetched {copied} bytes from {url} to {}", dest.display());
        Ok(())
    }
}

fn download_progress(label: &str, total: Option<u64>) -> ProgressBar {
    let progress_bar = match total {
        Some(total) => ProgressBar::new(total.max(1)),
        None => ProgressBar::new_spinner(),
    };
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.cyan.bold} {msg:<12} [{bar:20.cyan/blue}] {bytes}/{total_bytes}",
    ) {
        progress_bar.set_style(style.progress_chars("=>-"));
    }
    progress_bar.set_message(label.to_string());
    progress_bar.enable_steady_tick(Duration::from_millis(80));
    progress_bar
}

/// Reachability probe for `source add`: one GET against the location, with a
/// short timeout. Any transport error reads as unreachable.
pub struct HttpSourceValidator {
    client: reqwest::blocking::Client,
}

impl HttpSourceValidator {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl SourceValidator for HttpSourceValidator {
    fn validate(&self, location: &str) -> bool {
        match self.client.get(location).send() {
            Ok(response) => {
                let status = response.status();
                status.is_success() || status.is_redirection()
            }
            Err(err) => {
                debug!("probe of {location} failed: {err}");
                false
            }
        }
    }
}
