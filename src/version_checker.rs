//! Update Checking Module
//!
//! Checks for new releases of the CLI by querying the GitHub API.
//!
//! The checker runs as a background task: one check right after startup, then
//! one per interval until shutdown. A release is announced at most once; the
//! same tag seen again on a later check stays quiet.
//!
//! # Mock Testing
//!
//! Checking goes through the `UpdateCheckable` trait, so tests inject a
//! `MockUpdateCheckable` (via `mockall`) instead of touching the network, and
//! drive `update_checker_task_with_interval` with a short interval.

use crate::error_classifier::LogLevel;
use crate::events::{Event, EventType};
use reqwest::{Client, ClientBuilder};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

#[cfg(test)]
use mockall::{automock, predicate::*};

// GitHub API endpoint for the latest release
const GITHUB_RELEASES_URL: &str =
    "https://api.github.com/repos/storewatch/storewatch-cli/releases/latest";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    pub name: String,
    pub published_at: String,
    pub html_url: String,
    pub prerelease: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub current_version: String,
    pub latest_version: Option<String>,
    pub update_available: bool,
    pub release_url: Option<String>,
    pub last_check: Option<Instant>,
}

impl UpdateInfo {
    pub fn new(current_version: String) -> Self {
        Self {
            current_version,
            latest_version: None,
            update_available: false,
            release_url: None,
            last_check: None,
        }
    }

    pub fn update_from_release(&mut self, release: &GitHubRelease) {
        self.latest_version = Some(release.tag_name.clone());
        self.release_url = Some(release.html_url.clone());
        self.update_available = self.is_newer_version(&release.tag_name);
        self.last_check = Some(Instant::now());
    }

    /// Compare semantic versions to determine if the latest version is newer
    fn is_newer_version(&self, latest: &str) -> bool {
        match (parse_version(&self.current_version), parse_version(latest)) {
            (Ok(current), Ok(latest_ver)) => latest_ver > current,
            _ => false, // If parsing fails, assume no update needed
        }
    }
}

/// Parse a version string, handling optional 'v' prefix
fn parse_version(version: &str) -> Result<Version, semver::Error> {
    let clean_version = version.strip_prefix('v').unwrap_or(version);
    Version::parse(clean_version)
}

/// Trait for update checking - allows for easy mocking in tests
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait UpdateCheckable: Send + Sync {
    /// Check for the latest release from the remote source
    async fn check_latest_version(
        &self,
    ) -> Result<GitHubRelease, Box<dyn std::error::Error + Send + Sync>>;

    /// Get the current version
    fn current_version(&self) -> &str;
}

/// Update checker client for making GitHub API requests
pub struct UpdateChecker {
    client: Client,
    current_version: String,
}

impl UpdateChecker {
    pub fn new(current_version: String) -> Self {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(10))
            .user_agent(format!("storewatch/{}", current_version))
            .build()
            .expect("Failed to create HTTP client for update checker");

        Self {
            client,
            current_version,
        }
    }
}

#[async_trait::async_trait]
impl UpdateCheckable for UpdateChecker {
    /// Check for the latest release from the GitHub API
    async fn check_latest_version(
        &self,
    ) -> Result<GitHubRelease, Box<dyn std::error::Error + Send + Sync>> {
        let response = self.client.get(GITHUB_RELEASES_URL).send().await?;

        if !response.status().is_success() {
            return Err(format!("GitHub API returned status: {}", response.status()).into());
        }

        let release: GitHubRelease = response.json().await?;
        Ok(release)
    }

    fn current_version(&self) -> &str {
        &self.current_version
    }
}

/// Background task that periodically checks for updates
pub async fn update_checker_task(
    update_checker: Box<dyn UpdateCheckable>,
    event_sender: mpsc::Sender<Event>,
    shutdown: broadcast::Receiver<()>,
) {
    update_checker_task_with_interval(
        update_checker,
        event_sender,
        shutdown,
        crate::consts::cli_consts::update_check::interval(),
    )
    .await;
}

/// Background task that periodically checks for updates with configurable interval
pub async fn update_checker_task_with_interval(
    update_checker: Box<dyn UpdateCheckable>,
    event_sender: mpsc::Sender<Event>,
    mut shutdown: broadcast::Receiver<()>,
    check_interval: Duration,
) {
    let mut update_info = UpdateInfo::new(update_checker.current_version().to_string());
    // Tag of the release last announced to the user, so a release is only
    // announced once even though checks repeat.
    let mut last_notified: Option<String> = None;

    // Perform the initial check immediately
    perform_update_check(
        &*update_checker,
        &mut update_info,
        &mut last_notified,
        &event_sender,
    )
    .await;

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = sleep(check_interval) => {
                perform_update_check(
                    &*update_checker,
                    &mut update_info,
                    &mut last_notified,
                    &event_sender,
                )
                .await;
            }
        }
    }
}

/// Perform a single update check and announce a newer release at most once
async fn perform_update_check(
    update_checker: &dyn UpdateCheckable,
    update_info: &mut UpdateInfo,
    last_notified: &mut Option<String>,
    event_sender: &mpsc::Sender<Event>,
) {
    match update_checker.check_latest_version().await {
        Ok(release) => {
            update_info.update_from_release(&release);

            let already_notified = last_notified.as_deref() == Some(release.tag_name.as_str());
            if update_info.update_available && !already_notified {
                let message = format!(
                    "🚀 New version {} available! Current: {} → Release: {}",
                    release.tag_name, update_info.current_version, release.html_url
                );
                let event =
                    Event::update_checker_with_level(message, EventType::Error, LogLevel::Warn);
                let _ = event_sender.send(event).await;
                *last_notified = Some(release.tag_name);
            }
        }
        Err(e) => {
            let message = format!("Failed to check for updates: {}", e);
            let event =
                Event::update_checker_with_level(message, EventType::Error, LogLevel::Debug);
            let _ = event_sender.send(event).await;
        }
    }
}

/// Spawn the background task with the real update checker
pub fn start_update_checker_task(
    current_version: String,
    event_sender: mpsc::Sender<Event>,
    shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    let update_checker = Box::new(UpdateChecker::new(current_version));
    tokio::spawn(update_checker_task(update_checker, event_sender, shutdown))
}
