//! Cloud-drive inbox.
//!
//! [`DriveInbox`] lists a watched folder, stages new files locally and
//! remembers which file ids it has handed over in
//! `<staging>/.processed_ids.json`. [`GoogleDrive`] implements [`DriveApi`]
//! against the Drive v3 REST API with a bearer access token.

use crate::domain::config::DriveConfig;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const TRACKER_FILE: &str = ".processed_ids.json";
const PAGE_SIZE: &str = "50";

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("GDRIVE_ACCESS_TOKEN is not set. Add it to the environment or the [drive] config section.")]
    MissingToken,

    #[error("GDRIVE_FOLDER_ID is not set. Add it to the environment or the [drive] config section.")]
    MissingFolder,

    #[error("failed to reach drive API {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("drive API error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("drive API returned an unexpected body: {0}")]
    InvalidBody(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub modified_time: Option<String>,
}

/// Listing and content access for one drive.
pub trait DriveApi: Send + Sync {
    /// Non-trashed files directly inside `folder_id`, newest first.
    fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, DriveError>;

    fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError>;

    /// Convert a native document to `mime_type` and return the bytes.
    fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, DriveError>;
}

/// Native documents are exported; everything else is downloaded as-is.
enum Fetch {
    Export { mime: &'static str, ext: &'static str },
    Download { ext: Option<&'static str> },
}

fn fetch_plan(mime_type: &str) -> Fetch {
    match mime_type {
        "application/vnd.google-apps.document" => Fetch::Export { mime: "text/plain", ext: ".txt" },
        "application/vnd.google-apps.spreadsheet" => Fetch::Export { mime: "text/csv", ext: ".csv" },
        "text/plain" => Fetch::Download { ext: Some(".txt") },
        "text/markdown" => Fetch::Download { ext: Some(".md") },
        "application/pdf" => Fetch::Download { ext: Some(".pdf") },
        "image/png" => Fetch::Download { ext: Some(".png") },
        "image/jpeg" => Fetch::Download { ext: Some(".jpg") },
        _ => Fetch::Download { ext: None },
    }
}

/// Local file name for a drive file. Directory parts of the remote name are dropped.
fn staged_name(name: &str, ext: Option<&str>) -> String {
    let base = Path::new(name);
    let file_name = base.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let file_name = if file_name.is_empty() { "untitled".to_string() } else { file_name };
    match ext {
        Some(ext) => {
            let stem = Path::new(&file_name).file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| file_name.clone());
            format!("{stem}{ext}")
        }
        None => file_name,
    }
}

pub struct DriveInbox<'a> {
    api: &'a dyn DriveApi,
    folder_id: String,
    staging_dir: PathBuf,
}

impl<'a> DriveInbox<'a> {
    pub fn new(api: &'a dyn DriveApi, config: &DriveConfig) -> Self {
        Self { api, folder_id: config.folder_id.clone(), staging_dir: config.staging_dir.clone() }
    }

    fn tracker(&self) -> PathBuf {
        self.staging_dir.join(TRACKER_FILE)
    }

    pub fn processed_ids(&self) -> BTreeSet<String> {
        let path = self.tracker();
        let Ok(content) = fs::read_to_string(&path) else {
            return BTreeSet::new();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "ignoring corrupt processed-id tracker: {e}");
            BTreeSet::new()
        })
    }

    pub fn mark_processed(&self, file_id: &str) -> Result<(), DriveError> {
        let mut ids = self.processed_ids();
        ids.insert(file_id.to_string());
        let path = self.tracker();
        let io = |source| DriveError::Io { path: path.display().to_string(), source };
        fs::create_dir_all(&self.staging_dir).map_err(io)?;
        let body = serde_json::to_string(&ids).map_err(|e| DriveError::InvalidBody(e.to_string()))?;
        fs::write(&path, body).map_err(io)
    }

    /// Files in the watched folder that have not been handed over yet.
    pub fn new_files(&self) -> Result<Vec<DriveFile>, DriveError> {
        if self.folder_id.trim().is_empty() {
            return Err(DriveError::MissingFolder);
        }
        let processed = self.processed_ids();
        let files = self.api.list_files(&self.folder_id)?;
        Ok(files.into_iter().filter(|f| !processed.contains(&f.id)).collect())
    }

    /// Download or export one file into the staging directory.
    pub fn stage(&self, file: &DriveFile) -> Result<PathBuf, DriveError> {
        let (bytes, ext) = match fetch_plan(&file.mime_type) {
            Fetch::Export { mime, ext } => (self.api.export(&file.id, mime)?, Some(ext)),
            Fetch::Download { ext } => (self.api.download(&file.id)?, ext),
        };
        let dest = self.staging_dir.join(staged_name(&file.name, ext));
        let io = |source| DriveError::Io { path: dest.display().to_string(), source };
        fs::create_dir_all(&self.staging_dir).map_err(io)?;
        fs::write(&dest, bytes).map_err(io)?;
        tracing::info!(name = %file.name, path = %dest.display(), "staged drive file");
        Ok(dest)
    }

    /// One poll cycle. Each staged file is passed to `on_file` and marked
    /// processed once it returns `Ok`; a file that fails to stage is skipped
    /// and retried next cycle, while an `on_file` error ends the cycle.
    pub fn poll_once(
        &self,
        on_file: &mut dyn FnMut(&DriveFile, &Path) -> anyhow::Result<()>,
    ) -> anyhow::Result<usize> {
        let files = self.new_files()?;
        if files.is_empty() {
            tracing::debug!("no new files in drive folder");
            return Ok(0);
        }
        tracing::info!(count = files.len(), "new drive files");

        let mut handled = 0;
        for file in &files {
            let local = match self.stage(file) {
                Ok(local) => local,
                Err(e) => {
                    tracing::error!(name = %file.name, "failed to download: {e}");
                    continue;
                }
            };
            on_file(file, &local)?;
            self.mark_processed(&file.id)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Poll forever, sleeping `interval` between cycles. Failed cycles are
    /// logged and the loop carries on.
    pub fn watch(&self, interval: Duration, on_file: &mut dyn FnMut(&DriveFile, &Path) -> anyhow::Result<()>) -> ! {
        tracing::info!(folder = %self.folder_id, interval_secs = interval.as_secs(), "starting drive watcher");
        loop {
            if let Err(e) = self.poll_once(on_file) {
                tracing::error!("drive poll cycle failed: {e:#}");
            }
            std::thread::sleep(interval);
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleDrive {
    access_token: String,
    base_url: String,
    timeout: Option<Duration>,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

impl GoogleDrive {
    pub fn new(config: &DriveConfig) -> Self {
        Self {
            access_token: config.access_token.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Some(Duration::from_secs(60)),
        }
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::blocking::Response, DriveError> {
        if self.access_token.trim().is_empty() {
            return Err(DriveError::MissingToken);
        }
        let url = format!("{}/drive/v3/{path}", self.base_url);

        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| DriveError::Transport { url: url.clone(), source })?;

        let resp = client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .map_err(|source| DriveError::Transport { url: url.clone(), source })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(DriveError::Http { status: status.as_u16(), body });
        }
        Ok(resp)
    }

    fn bytes(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<u8>, DriveError> {
        let url = format!("{}/drive/v3/{path}", self.base_url);
        let resp = self.get(path, query)?;
        resp.bytes().map(|b| b.to_vec()).map_err(|source| DriveError::Transport { url, source })
    }
}

impl DriveApi for GoogleDrive {
    fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>, DriveError> {
        let q = format!("'{folder_id}' in parents and trashed = false");
        let resp = self.get(
            "files",
            &[
                ("q", q.as_str()),
                ("fields", "files(id, name, mimeType, modifiedTime)"),
                ("orderBy", "modifiedTime desc"),
                ("pageSize", PAGE_SIZE),
            ],
        )?;
        let list: FileList = resp.json().map_err(|e| DriveError::InvalidBody(e.to_string()))?;
        Ok(list.files)
    }

    fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        self.bytes(&format!("files/{file_id}"), &[("alt", "media")])
    }

    fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, DriveError> {
        self.bytes(&format!("files/{file_id}/export"), &[("mimeType", mime_type)])
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Drive held in memory; `broken` ids fail to download.
    #[derive(Default)]
    pub(crate) struct FakeDrive {
        pub files: Vec<(DriveFile, Vec<u8>)>,
        pub broken: Vec<String>,
        pub exports: Mutex<Vec<(String, String)>>,
    }

    impl FakeDrive {
        pub(crate) fn with(mut self, id: &str, name: &str, mime: &str, body: &str) -> Self {
            let file = DriveFile { id: id.into(), name: name.into(), mime_type: mime.into(), modified_time: None };
            self.files.push((file, body.as_bytes().to_vec()));
            self
        }

        fn body(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
            if self.broken.iter().any(|b| b == file_id) {
                return Err(DriveError::Http { status: 500, body: "boom".into() });
            }
            self.files
                .iter()
                .find(|(f, _)| f.id == file_id)
                .map(|(_, body)| body.clone())
                .ok_or(DriveError::Http { status: 404, body: "not found".into() })
        }
    }

    impl DriveApi for FakeDrive {
        fn list_files(&self, _folder_id: &str) -> Result<Vec<DriveFile>, DriveError> {
            Ok(self.files.iter().map(|(f, _)| f.clone()).collect())
        }

        fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
            self.body(file_id)
        }

        fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, DriveError> {
            self.exports.lock().expect("lock").push((file_id.into(), mime_type.into()));
            self.body(file_id)
        }
    }

    pub(crate) fn drive_config(staging: &Path) -> DriveConfig {
        DriveConfig { folder_id: "folder".into(), staging_dir: staging.to_path_buf(), ..DriveConfig::default() }
    }

    #[test]
    fn staged_names_follow_mime_type() {
        assert_eq!(staged_name("Meeting notes", Some(".txt")), "Meeting notes.txt");
        assert_eq!(staged_name("scan.jpeg", Some(".jpg")), "scan.jpg");
        assert_eq!(staged_name("archive.zip", None), "archive.zip");
        assert_eq!(staged_name("../../etc/passwd", None), "passwd");
    }

    #[test]
    fn poll_stages_new_files_and_tracks_them() {
        let staging = TempDir::new().expect("tempdir");
        let drive = FakeDrive::default()
            .with("d1", "Plan", "application/vnd.google-apps.document", "plan text")
            .with("s1", "Budget", "application/vnd.google-apps.spreadsheet", "a,b")
            .with("p1", "photo.png", "image/png", "png");
        let inbox = DriveInbox::new(&drive, &drive_config(staging.path()));

        let mut seen = Vec::new();
        let handled = inbox
            .poll_once(&mut |file, path| {
                seen.push((file.id.clone(), path.file_name().map(|n| n.to_string_lossy().into_owned())));
                Ok(())
            })
            .expect("poll");
        assert_eq!(handled, 3);
        assert_eq!(
            seen,
            [
                ("d1".to_string(), Some("Plan.txt".to_string())),
                ("s1".to_string(), Some("Budget.csv".to_string())),
                ("p1".to_string(), Some("photo.png".to_string())),
            ]
        );
        assert_eq!(
            *drive.exports.lock().expect("lock"),
            [("d1".to_string(), "text/plain".to_string()), ("s1".to_string(), "text/csv".to_string())]
        );
        assert_eq!(fs::read_to_string(staging.path().join("Plan.txt")).expect("staged"), "plan text");

        assert_eq!(inbox.processed_ids().len(), 3);
        assert!(inbox.new_files().expect("list").is_empty());
    }

    #[test]
    fn failed_download_is_retried_next_cycle() {
        let staging = TempDir::new().expect("tempdir");
        let mut drive = FakeDrive::default().with("ok", "a.txt", "text/plain", "a").with("bad", "b.txt", "text/plain", "b");
        drive.broken.push("bad".into());
        let inbox = DriveInbox::new(&drive, &drive_config(staging.path()));

        let handled = inbox.poll_once(&mut |_, _| Ok(())).expect("poll");
        assert_eq!(handled, 1);
        let pending: Vec<String> = inbox.new_files().expect("list").into_iter().map(|f| f.id).collect();
        assert_eq!(pending, ["bad"]);
    }

    #[test]
    fn handler_error_leaves_file_unprocessed() {
        let staging = TempDir::new().expect("tempdir");
        let drive = FakeDrive::default().with("x", "x.md", "text/markdown", "# x");
        let inbox = DriveInbox::new(&drive, &drive_config(staging.path()));

        let err = inbox.poll_once(&mut |_, _| anyhow::bail!("model down")).expect_err("error");
        assert_eq!(err.to_string(), "model down");
        assert!(inbox.processed_ids().is_empty());
    }

    #[test]
    fn missing_folder_is_reported() {
        let staging = TempDir::new().expect("tempdir");
        let drive = FakeDrive::default();
        let config = DriveConfig { staging_dir: staging.path().to_path_buf(), ..DriveConfig::default() };
        let err = DriveInbox::new(&drive, &config).new_files().expect_err("error");
        assert!(matches!(err, DriveError::MissingFolder));
    }

    #[test]
    fn google_drive_requires_a_token() {
        let drive = GoogleDrive::new(&DriveConfig::default());
        assert!(matches!(drive.list_files("f"), Err(DriveError::MissingToken)));
    }
}
