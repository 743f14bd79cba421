use crate::error::TableError;
use crate::loader::load_table;
use crate::table::Table;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default idle lifetime of a session: 24 hours
pub const SESSION_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Severity of a message shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// One-shot message produced by an action and shown on the next render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// The uploaded table together with the name it was uploaded under
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub file_name: String,
    pub table: Table,
}

/// Columns currently picked for the chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSelection {
    pub x: String,
    pub y: String,
}

/// All mutable state of one browser session.
///
/// A fresh session is `SessionState::default()`: no goal, empty lists, no
/// dataset and the light theme.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub goal: Option<String>,
    pub reflections: Vec<String>,
    pub tags: Vec<String>,
    pub dataset: Option<Dataset>,
    pub chart: Option<ChartSelection>,
    pub dark_mode: bool,
    #[serde(skip)]
    notices: Vec<Notice>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(Notice {
            level,
            text: text.into(),
        });
    }

    /// Messages queued since the last render
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain the queued messages for rendering
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Save the goal, overwriting the previous one.
    ///
    /// An empty goal leaves the saved goal untouched and queues a warning.
    /// Returns whether the goal was saved.
    pub fn save_goal(&mut self, goal: &str) -> bool {
        if goal.is_empty() {
            self.notify(NoticeLevel::Warning, "Please enter a goal before saving.");
            return false;
        }
        self.goal = Some(goal.to_string());
        self.notify(NoticeLevel::Success, "Your goal has been saved!");
        true
    }

    /// Append a reflection. Empty text is rejected with a warning.
    pub fn save_reflection(&mut self, reflection: &str) -> bool {
        if reflection.is_empty() {
            self.notify(NoticeLevel::Warning, "Please write something to save.");
            return false;
        }
        self.reflections.push(reflection.to_string());
        self.notify(NoticeLevel::Success, "Reflection saved!");
        true
    }

    /// Append a tag. Duplicates are kept.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if tag.is_empty() {
            self.notify(NoticeLevel::Warning, "Please enter a tag to add.");
            return false;
        }
        self.tags.push(tag.to_string());
        self.notify(NoticeLevel::Success, format!("Tag '{}' added!", tag));
        true
    }

    /// Remove the first tag equal to `tag`; does nothing if there is none
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        match self.tags.iter().position(|t| t == tag) {
            Some(index) => {
                self.tags.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn set_dark_mode(&mut self, enabled: bool) {
        self.dark_mode = enabled;
    }

    /// Parse an uploaded file and make it the current dataset.
    ///
    /// On success the chart selection resets to the first numeric column on
    /// both axes, or is cleared with a warning when there is no numeric
    /// column. On failure an error is queued and the previous dataset and
    /// chart stay as they were.
    pub fn upload(&mut self, file_name: &str, bytes: &[u8]) -> bool {
        let table = match load_table(file_name, bytes) {
            Ok(table) => table,
            Err(e) => {
                warn!("rejected upload '{}': {}", file_name, e);
                self.notify(NoticeLevel::Error, format!("Error processing file: {}", e));
                return false;
            }
        };

        self.notify(NoticeLevel::Success, "File uploaded successfully!");

        self.chart = table.numeric_columns().first().map(|first| ChartSelection {
            x: first.to_string(),
            y: first.to_string(),
        });
        if self.chart.is_none() {
            self.notify(
                NoticeLevel::Warning,
                "No numeric columns found for visualization.",
            );
        }

        self.dataset = Some(Dataset {
            file_name: file_name.to_string(),
            table,
        });
        true
    }

    /// Numeric columns of the current dataset, empty without one
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.dataset
            .as_ref()
            .map(|d| d.table.numeric_columns())
            .unwrap_or_default()
    }

    /// Whether the X/Y selectors are usable
    pub fn chart_enabled(&self) -> bool {
        !self.numeric_columns().is_empty()
    }

    /// Pick the two columns to chart.
    ///
    /// Both names must be numeric columns of the current dataset; otherwise
    /// the selection is left unchanged and a warning is queued.
    pub fn select_chart(&mut self, x: &str, y: &str) -> bool {
        let numeric: Vec<String> = self
            .numeric_columns()
            .into_iter()
            .map(String::from)
            .collect();
        if numeric.is_empty() {
            self.notify(
                NoticeLevel::Warning,
                "Upload a file with numeric columns first.",
            );
            return false;
        }

        for name in [x, y] {
            if !numeric.iter().any(|n| n == name) {
                let text = format!("'{}' is not a numeric column of the uploaded data.", name);
                self.notify(NoticeLevel::Warning, text);
                return false;
            }
        }

        self.chart = Some(ChartSelection {
            x: x.to_string(),
            y: y.to_string(),
        });
        true
    }

    /// Queue the message for a failed conversion
    pub fn conversion_failed(&mut self, error: &TableError) {
        self.notify(NoticeLevel::Error, format!("Error converting file: {}", error));
    }

    /// Queue a message for a form that did not carry a file
    pub fn missing_file(&mut self) {
        self.notify(NoticeLevel::Error, "Please choose a CSV or Excel file first.");
    }
}

/// Shared handle to one session's state
pub type SharedSession = Arc<Mutex<SessionState>>;

struct Entry {
    state: SharedSession,
    last_seen: Instant,
}

/// In-memory map from session id to session state.
///
/// Each id owns its own state; nothing is shared between sessions. Sessions
/// idle for longer than the configured lifetime are dropped on the next
/// access to the store.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_DURATION)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a live session or start a new one
    ///
    /// # Arguments
    /// * `id` - Session id from the client's cookie, if any
    ///
    /// # Returns
    /// * `(Uuid, SharedSession, bool)` - The session id to use, its state, and
    ///   whether the session was just created
    pub fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SharedSession, bool) {
        self.purge_expired();

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = Instant::now();
                return (id, Arc::clone(&entry.state), false);
            }
        }

        let id = Uuid::new_v4();
        let state = Arc::new(Mutex::new(SessionState::new()));
        sessions.insert(
            id,
            Entry {
                state: Arc::clone(&state),
                last_seen: Instant::now(),
            },
        );
        debug!("created session {}", id);
        (id, state, true)
    }

    /// Look up a live session without creating one
    pub fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.purge_expired();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.get_mut(&id).map(|entry| {
            entry.last_seen = Instant::now();
            Arc::clone(&entry.state)
        })
    }

    /// Drop every session idle for at least the configured lifetime.
    ///
    /// Returns how many sessions were removed.
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, entry| entry.last_seen.elapsed() < ttl);

        let removed = before - sessions.len();
        if removed > 0 {
            debug!("purged {} expired session(s)", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
