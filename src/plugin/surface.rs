//! Mount points and display surfaces
//!
//! The host hands a plugin a `MountPoint`; the plugin returns a `Surface` it
//! keeps a handle to and redraws on refresh. The host renders the same
//! surface whenever it wants to show the tab.

use crate::ui::table::grid;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Host-supplied place a plugin renders into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    name: String,
}

impl MountPoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Contents of a surface at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// One-line message shown under the table (e.g. a failed action)
    pub notice: Option<String>,
}

/// Shared handle to a plugin's display
#[derive(Debug, Clone)]
pub struct Surface {
    mount: String,
    frame: Arc<Mutex<Frame>>,
}

impl Surface {
    pub fn new(mount: &MountPoint, title: impl Into<String>, headers: &[&str]) -> Self {
        let frame = Frame {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            ..Frame::default()
        };
        Self {
            mount: mount.name().to_string(),
            frame: Arc::new(Mutex::new(frame)),
        }
    }

    pub fn mount_name(&self) -> &str {
        &self.mount
    }

    // A panic while drawing leaves a stale frame, not a broken one
    fn lock(&self) -> MutexGuard<'_, Frame> {
        self.frame.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace all rows
    pub fn set_rows(&self, rows: Vec<Vec<String>>) {
        self.lock().rows = rows;
    }

    pub fn set_notice(&self, notice: Option<String>) {
        self.lock().notice = notice;
    }

    pub fn snapshot(&self) -> Frame {
        self.lock().clone()
    }

    /// Render title, table and notice as text
    pub fn render(&self) -> String {
        let frame = self.snapshot();
        let mut out = String::new();
        out.push_str(&frame.title);
        out.push('\n');
        if frame.rows.is_empty() {
            out.push_str("(no entries)\n");
        } else {
            out.push_str(&grid(&frame.headers, &frame.rows));
            out.push('\n');
        }
        if let Some(notice) = &frame.notice {
            out.push_str(notice);
            out.push('\n');
        }
        out
    }
}
