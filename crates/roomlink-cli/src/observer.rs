//! Printing observer for the terminal client.

use std::{collections::HashMap, io::Write, path::PathBuf};

use roomlink_client::SessionObserver;
use roomlink_core::{ChatEvent, Participant, RoomDirectory, SessionError};
use tracing::{debug, warn};

/// Progress is reported in steps of this many percent.
const PROGRESS_STEP: u32 = 10;

/// [`SessionObserver`] that writes one line per change.
///
/// Received files are saved under the download directory when one is set.
pub struct TerminalObserver<W> {
    out: W,
    downloads: Option<PathBuf>,
    current_room: Option<String>,
    reported_progress: HashMap<String, u32>,
}

impl<W: Write + Send> TerminalObserver<W> {
    /// Observer writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out, downloads: None, current_room: None, reported_progress: HashMap::new() }
    }

    /// Save received files under `dir`.
    #[must_use]
    pub fn with_downloads(mut self, dir: impl Into<PathBuf>) -> Self {
        self.downloads = Some(dir.into());
        self
    }

    /// The underlying writer.
    pub fn writer(&self) -> &W {
        &self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(error) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            debug!(%error, "terminal write failed");
        }
    }

    fn save(&self, file_name: &str, bytes: &[u8]) -> Option<PathBuf> {
        let dir = self.downloads.as_ref()?;
        let name = std::path::Path::new(file_name).file_name()?;
        let path = dir.join(name);
        match std::fs::create_dir_all(dir).and_then(|()| std::fs::write(&path, bytes)) {
            Ok(()) => Some(path),
            Err(error) => {
                warn!(%error, path = %path.display(), "failed to save received file");
                None
            },
        }
    }
}

impl<W: Write + Send> SessionObserver for TerminalObserver<W> {
    fn on_rooms_changed(&mut self, rooms: &RoomDirectory) {
        let names: Vec<&str> = rooms.rooms().iter().map(|room| room.name.as_str()).collect();
        self.line(&format!("* rooms: {}", names.join(", ")));
    }

    fn on_roster_changed(&mut self, room_id: &str, roster: &[Participant]) {
        if self.current_room.as_deref() != Some(room_id) {
            return;
        }
        let names: Vec<&str> = roster.iter().map(|participant| participant.name.as_str()).collect();
        self.line(&format!("* online in #{room_id}: {}", names.join(", ")));
    }

    fn on_message(&mut self, event: &ChatEvent) {
        if self.current_room.as_deref() != Some(event.room_id()) {
            return;
        }
        match event {
            ChatEvent::Text(text) => self.line(&format!("<{}> {}", text.sender, text.text)),
            ChatEvent::File(file) => {
                let saved = self.save(&file.file_name, &file.file_bytes);
                let location = saved
                    .map(|path| format!(", saved to {}", path.display()))
                    .unwrap_or_default();
                self.line(&format!(
                    "* {} shared {} ({} bytes{location})",
                    file.sender,
                    file.file_name,
                    file.file_bytes.len()
                ));
            },
        }
    }

    fn on_transfer_progress(&mut self, file_name: &str, progress: f64) {
        if progress >= 1.0 {
            self.reported_progress.remove(file_name);
            self.line(&format!("* {file_name}: done"));
            return;
        }
        let percent = (progress.max(0.0) * 100.0).round() as u32;
        let step = percent.min(99) / PROGRESS_STEP * PROGRESS_STEP;
        if self.reported_progress.get(file_name) == Some(&step) {
            return;
        }
        self.reported_progress.insert(file_name.to_string(), step);
        self.line(&format!("* {file_name}: {step}%"));
    }

    fn on_current_room_changed(&mut self, room_id: &str) {
        self.current_room = Some(room_id.to_string());
        self.line(&format!("* now in #{room_id}"));
    }

    fn on_connectivity_lost(&mut self, reason: &str) {
        self.reported_progress.clear();
        self.line(&format!("* connection lost: {reason}"));
    }

    fn on_command_rejected(&mut self, error: &SessionError) {
        self.line(&format!("! {error}"));
    }
}
