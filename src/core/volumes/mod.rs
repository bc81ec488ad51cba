//! # Volumes Module
//!
//! Removable volume discovery and insertion/removal monitoring.
//!
//! Listing and ejecting volumes is platform-specific and left to
//! implementations of [`RemovableVolumeProvider`]. This module supplies the
//! camera-card heuristic and a polling [`DriveMonitor`] on top of any provider.
//!
//! ## Example
//! ```rust,ignore
//! use card_ingest::core::volumes::DriveMonitor;
//! use card_ingest::events::{Event, EventChannel, VolumeEvent};
//!
//! let (sender, receiver) = EventChannel::new();
//! let handle = DriveMonitor::new(Box::new(MyProvider)).spawn(Duration::from_secs(1), sender);
//! for event in receiver.iter() {
//!     if let Event::Volume(VolumeEvent::Inserted(volume)) = event {
//!         println!("Card inserted: {}", volume.label);
//!     }
//! }
//! handle.stop();
//! ```

use crate::error::VolumeError;
use crate::events::{Event, EventSender, VolumeEvent};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Polling interval used when the caller has no preference
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Top-level folders written by cameras
const CAMERA_FOLDERS: &[&str] = &["DCIM", "AVCHD", "PRIVATE", "MISC"];

/// A mounted removable volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Mount point
    pub path: PathBuf,
    /// Human-readable name
    pub label: String,
    /// Whether the volume looks like a camera memory card
    pub is_camera_card: bool,
}

impl Volume {
    /// Build a volume from its mount point, probing for camera folders
    pub fn from_mount(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        let path = path.into();
        let is_camera_card = looks_like_camera_card(&path);
        Self {
            path,
            label: label.into(),
            is_camera_card,
        }
    }
}

/// Lists and ejects removable volumes on the host
pub trait RemovableVolumeProvider: Send + Sync {
    /// Currently mounted removable volumes
    fn list(&self) -> Result<Vec<Volume>, VolumeError>;

    /// Safely eject the volume mounted at `path`
    fn eject(&self, path: &Path) -> Result<(), VolumeError>;
}

fn dcf_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{3}[A-Z0-9_]{4,5}$").expect("DCF pattern is valid"))
}

/// Whether a folder name is a DCF directory such as `100CANON` or `100SONY`
pub fn is_dcf_dir_name(name: &str) -> bool {
    dcf_pattern().is_match(&name.to_uppercase())
}

/// Whether the volume at `path` has camera folders at its top level
pub fn looks_like_camera_card(path: &Path) -> bool {
    let Ok(entries) = fs::read_dir(path) else {
        return false;
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_uppercase))
        .any(|name| CAMERA_FOLDERS.contains(&name.as_str()) || is_dcf_dir_name(&name))
}

/// A difference between two volume listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeChange {
    Inserted(Volume),
    Removed(PathBuf),
}

impl From<VolumeChange> for VolumeEvent {
    fn from(change: VolumeChange) -> Self {
        match change {
            VolumeChange::Inserted(volume) => VolumeEvent::Inserted(volume),
            VolumeChange::Removed(path) => VolumeEvent::Removed { path },
        }
    }
}

/// Detects inserted and removed volumes by diffing successive listings.
///
/// The first poll reports every mounted volume as inserted.
pub struct DriveMonitor {
    provider: Box<dyn RemovableVolumeProvider>,
    known: BTreeMap<PathBuf, Volume>,
}

impl DriveMonitor {
    pub fn new(provider: Box<dyn RemovableVolumeProvider>) -> Self {
        Self {
            provider,
            known: BTreeMap::new(),
        }
    }

    /// Volumes seen on the last successful poll
    pub fn volumes(&self) -> impl Iterator<Item = &Volume> {
        self.known.values()
    }

    /// List volumes once and return what changed since the last poll.
    ///
    /// On a provider error the previous snapshot is kept.
    pub fn poll(&mut self) -> Result<Vec<VolumeChange>, VolumeError> {
        let current: BTreeMap<PathBuf, Volume> = self
            .provider
            .list()?
            .into_iter()
            .map(|volume| (volume.path.clone(), volume))
            .collect();

        let mut changes: Vec<VolumeChange> = self
            .known
            .keys()
            .filter(|path| !current.contains_key(*path))
            .map(|path| VolumeChange::Removed(path.clone()))
            .collect();
        changes.extend(
            current
                .values()
                .filter(|volume| !self.known.contains_key(&volume.path))
                .map(|volume| VolumeChange::Inserted(volume.clone())),
        );

        for change in &changes {
            match change {
                VolumeChange::Inserted(volume) => info!(
                    path = %volume.path.display(),
                    label = %volume.label,
                    camera_card = volume.is_camera_card,
                    "Volume inserted"
                ),
                VolumeChange::Removed(path) => info!(path = %path.display(), "Volume removed"),
            }
        }

        self.known = current;
        Ok(changes)
    }

    /// Eject a volume through the provider
    pub fn eject(&self, path: &Path) -> Result<(), VolumeError> {
        info!(path = %path.display(), "Ejecting volume");
        self.provider.eject(path)
    }

    /// Poll on a background thread, sending [`Event::Volume`] events
    pub fn spawn(mut self, interval: Duration, events: EventSender) -> MonitorHandle {
        let (stop, stopped) = bounded::<()>(1);

        let thread = thread::spawn(move || {
            debug!(?interval, "Drive monitor started");
            loop {
                match self.poll() {
                    Ok(changes) => {
                        for change in changes {
                            events.send(Event::Volume(change.into()));
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to list volumes");
                        events.send(Event::Volume(VolumeEvent::Error {
                            message: e.to_string(),
                        }));
                    }
                }

                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            }
            debug!("Drive monitor stopped");
        });

        MonitorHandle {
            stop,
            thread: Some(thread),
        }
    }
}

/// Handle to a running [`DriveMonitor`] thread
pub struct MonitorHandle {
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stop polling and wait for the thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop.try_send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Provider returning scripted listings, repeating the last one
    struct ScriptedProvider {
        listings: Mutex<Vec<Result<Vec<Volume>, VolumeError>>>,
    }

    impl ScriptedProvider {
        fn new(listings: Vec<Result<Vec<Volume>, VolumeError>>) -> Self {
            Self {
                listings: Mutex::new(listings),
            }
        }
    }

    impl RemovableVolumeProvider for ScriptedProvider {
        fn list(&self) -> Result<Vec<Volume>, VolumeError> {
            let mut listings = self.listings.lock().unwrap();
            if listings.len() > 1 {
                listings.remove(0)
            } else {
                match listings.first() {
                    Some(Ok(volumes)) => Ok(volumes.clone()),
                    _ => Ok(Vec::new()),
                }
            }
        }

        fn eject(&self, path: &Path) -> Result<(), VolumeError> {
            if path.starts_with("/Volumes") {
                Ok(())
            } else {
                Err(VolumeError::EjectFailed {
                    path: path.to_path_buf(),
                    reason: "not mounted".to_string(),
                })
            }
        }
    }

    fn volume(path: &str) -> Volume {
        Volume {
            path: PathBuf::from(path),
            label: path.trim_start_matches("/Volumes/").to_string(),
            is_camera_card: true,
        }
    }

    #[test]
    fn camera_folders_are_detected() {
        let temp = TempDir::new().unwrap();
        assert!(!looks_like_camera_card(temp.path()));

        fs::create_dir(temp.path().join("dcim")).unwrap();
        assert!(looks_like_camera_card(temp.path()));
    }

    #[test]
    fn dcf_folder_is_detected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("100CANON")).unwrap();
        assert!(looks_like_camera_card(temp.path()));
    }

    #[test]
    fn ordinary_drive_is_not_a_camera_card() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("Documents")).unwrap();
        fs::write(temp.path().join("DCIM"), b"a file, not a folder").unwrap();
        assert!(!looks_like_camera_card(temp.path()));
        assert!(!looks_like_camera_card(Path::new("/nonexistent/volume")));
    }

    #[test]
    fn dcf_names() {
        assert!(is_dcf_dir_name("100CANON"));
        assert!(is_dcf_dir_name("101_fuji"));
        assert!(is_dcf_dir_name("100SONY"));
        assert!(is_dcf_dir_name("100pentx"));
        assert!(!is_dcf_dir_name("10CANON"));
        assert!(!is_dcf_dir_name("100ABC"));
        assert!(!is_dcf_dir_name("100CANON1"));
    }

    #[test]
    fn sony_card_is_detected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("100sony")).unwrap();
        assert!(looks_like_camera_card(temp.path()));
        assert!(Volume::from_mount(temp.path(), "SONY").is_camera_card);
    }

    #[test]
    fn poll_reports_insertions_and_removals() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec![volume("/Volumes/A")]),
            Ok(vec![volume("/Volumes/A"), volume("/Volumes/B")]),
            Ok(vec![volume("/Volumes/B")]),
        ]);
        let mut monitor = DriveMonitor::new(Box::new(provider));

        assert_eq!(
            monitor.poll().unwrap(),
            vec![VolumeChange::Inserted(volume("/Volumes/A"))]
        );
        assert_eq!(
            monitor.poll().unwrap(),
            vec![VolumeChange::Inserted(volume("/Volumes/B"))]
        );
        assert_eq!(
            monitor.poll().unwrap(),
            vec![VolumeChange::Removed(PathBuf::from("/Volumes/A"))]
        );
        assert!(monitor.poll().unwrap().is_empty());
    }

    #[test]
    fn provider_error_keeps_snapshot() {
        let provider = ScriptedProvider::new(vec![
            Ok(vec![volume("/Volumes/A")]),
            Err(VolumeError::ListFailed("busy".to_string())),
            Ok(vec![volume("/Volumes/A")]),
        ]);
        let mut monitor = DriveMonitor::new(Box::new(provider));

        monitor.poll().unwrap();
        assert!(monitor.poll().is_err());
        assert_eq!(monitor.volumes().count(), 1);
        assert!(monitor.poll().unwrap().is_empty());
    }

    #[test]
    fn eject_goes_through_provider() {
        let monitor = DriveMonitor::new(Box::new(ScriptedProvider::new(vec![])));
        assert!(monitor.eject(Path::new("/Volumes/A")).is_ok());
        assert!(matches!(
            monitor.eject(Path::new("/mnt/usb")),
            Err(VolumeError::EjectFailed { .. })
        ));
    }

    #[test]
    fn spawned_monitor_sends_events_and_stops() {
        let provider = ScriptedProvider::new(vec![Ok(vec![volume("/Volumes/EOS_DIGITAL")])]);
        let (sender, receiver) = EventChannel::new();

        let handle = DriveMonitor::new(Box::new(provider)).spawn(Duration::from_millis(10), sender);
        let event = receiver.recv().unwrap();
        handle.stop();

        match event {
            Event::Volume(VolumeEvent::Inserted(v)) => assert_eq!(v.label, "EOS_DIGITAL"),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
