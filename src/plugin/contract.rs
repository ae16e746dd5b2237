//! Core plugin contract
//!
//! Defines the trait every display plugin implements in full, plus the small
//! value types passed across it.

use crate::Result;
use super::surface::{MountPoint, Surface};
use serde::Serialize;
use std::time::Duration;

/// Static identity of a plugin, used for display and lookup
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PluginInfo {
    /// Unique lookup name, also the tab title
    pub name: &'static str,
    /// e.g. `analysis_viewer`
    pub category: &'static str,
    /// Kind of data the plugin shows, e.g. `code_analysis`
    pub stream_type: &'static str,
    pub description: &'static str,
    pub author: &'static str,
    pub version: &'static str,
}

/// Lifecycle position of a loaded plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    /// Instantiated, `run` not called yet
    #[default]
    Loaded,
    Running,
    Stopped,
}

impl PluginState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginState::Loaded => "loaded",
            PluginState::Running => "running",
            PluginState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options passed to `Plugin::run`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Interval at which the host intends to call `update_gui`
    pub refresh_interval: Option<Duration>,
}

/// Point-in-time introspection of a plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginStatus {
    pub name: String,
    pub is_running: bool,
    pub category: String,
    pub state: PluginState,
    pub refresh_secs: Option<u64>,
}

/// Trait for display plugins
///
/// Each plugin is responsible for:
/// 1. Building its own surface on a host-supplied mount point
/// 2. Loading its data when run
/// 3. Refreshing that surface on request
/// 4. Reporting its status
///
/// There are no default methods; a plugin spells out every capability.
pub trait Plugin: Send {
    /// Identity metadata
    fn info(&self) -> &'static PluginInfo;

    /// Build the plugin's display surface on the given mount point
    fn create_gui(&mut self, mount: &MountPoint) -> Result<Surface>;

    /// Activate the plugin and perform its first data load
    fn run(&mut self, options: &RunOptions) -> Result<()>;

    /// Deactivate the plugin and drop its refresh registration
    fn stop(&mut self);

    /// Refresh the surface; safe to call any number of times
    fn update_gui(&mut self) -> Result<()>;

    fn get_status(&self) -> PluginStatus;
}

/// State shared by every plugin implementation
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: PluginState,
    refresh_interval: Option<Duration>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `Running`, from `Loaded` or `Stopped`
    pub fn start(&mut self, options: &RunOptions) {
        self.state = PluginState::Running;
        self.refresh_interval = options.refresh_interval;
    }

    /// Enter `Stopped` and release the refresh registration
    pub fn stop(&mut self) {
        self.state = PluginState::Stopped;
        self.refresh_interval = None;
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PluginState::Running
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval
    }

    pub fn status(&self, info: &PluginInfo) -> PluginStatus {
        PluginStatus {
            name: info.name.to_string(),
            is_running: self.is_running(),
            category: info.category.to_string(),
            state: self.state,
            refresh_secs: self.refresh_interval.map(|d| d.as_secs()),
        }
    }
}
