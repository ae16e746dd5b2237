//! Plugin registry
//!
//! Holds the factories the host was built with and the instances created
//! from them. Discovery is an explicit factory list; a factory that fails is
//! recorded as skipped and the rest still load.

use crate::Result;
use crate::storage::SqliteStore;
use super::contract::{Plugin, PluginStatus};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What a factory gets to build a plugin from
#[derive(Debug, Clone)]
pub struct PluginContext {
    database: PathBuf,
}

impl PluginContext {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self { database: database.into() }
    }

    pub fn database(&self) -> &Path {
        &self.database
    }

    /// Open (and initialize if needed) the shared store
    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.database)
    }
}

/// Constructor for one plugin
pub type PluginFactory = fn(&PluginContext) -> Result<Box<dyn Plugin>>;

/// A factory that did not produce a loaded plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPlugin {
    /// Known when the factory succeeded but the instance was rejected
    pub name: Option<String>,
    pub reason: String,
}

/// Registry of display plugins
pub struct PluginRegistry {
    context: PluginContext,
    factories: Vec<PluginFactory>,
    disabled: HashSet<String>,
    plugins: Vec<Box<dyn Plugin>>,
    skipped: Vec<SkippedPlugin>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new(context: PluginContext) -> Self {
        Self {
            context,
            factories: Vec::new(),
            disabled: HashSet::new(),
            plugins: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Register a factory; nothing is built until `load_plugins`
    pub fn register(&mut self, factory: PluginFactory) {
        self.factories.push(factory);
    }

    /// Plugin names to leave out on load
    pub fn with_disabled<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled.extend(names.into_iter().map(Into::into));
        self
    }

    /// Build one instance per factory, replacing anything loaded before.
    ///
    /// Returns the number of plugins loaded.
    pub fn load_plugins(&mut self) -> usize {
        self.plugins.clear();
        self.skipped.clear();

        for factory in &self.factories {
            let plugin = match factory(&self.context) {
                Ok(plugin) => plugin,
                Err(e) => {
                    warn!("Plugin factory failed: {}", e);
                    self.skipped.push(SkippedPlugin { name: None, reason: e.to_string() });
                    continue;
                }
            };

            let name = plugin.info().name;
            let reason = if name.trim().is_empty() {
                Some("plugin has an empty name".to_string())
            } else if self.plugins.iter().any(|p| p.info().name == name) {
                Some(format!("a plugin named '{}' is already loaded", name))
            } else if self.disabled.contains(name) {
                Some("disabled in configuration".to_string())
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    warn!(plugin = name, "Skipping plugin: {}", reason);
                    self.skipped.push(SkippedPlugin { name: Some(name.to_string()), reason });
                }
                None => {
                    debug!(plugin = name, "Loaded plugin");
                    self.plugins.push(plugin);
                }
            }
        }

        info!(loaded = self.plugins.len(), skipped = self.skipped.len(), "Plugins loaded");
        self.plugins.len()
    }

    /// Find a loaded plugin by name
    pub fn get_plugin(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins
            .iter()
            .find(|p| p.info().name == name)
            .map(|p| p.as_ref())
    }

    pub fn get_plugin_mut(&mut self, name: &str) -> Option<&mut (dyn Plugin + 'static)> {
        self.plugins
            .iter_mut()
            .find(|p| p.info().name == name)
            .map(|p| p.as_mut())
    }

    /// Names of loaded plugins, in load order
    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.info().name).collect()
    }

    pub fn statuses(&self) -> Vec<PluginStatus> {
        self.plugins.iter().map(|p| p.get_status()).collect()
    }

    /// Refresh every running plugin; a failing refresh is logged, not fatal
    pub fn update_all(&mut self) -> usize {
        let mut refreshed = 0;
        for plugin in self.plugins.iter_mut().filter(|p| p.get_status().is_running) {
            match plugin.update_gui() {
                Ok(()) => refreshed += 1,
                Err(e) => warn!(plugin = plugin.info().name, "Refresh failed: {}", e),
            }
        }
        refreshed
    }

    pub fn stop_all(&mut self) {
        for plugin in &mut self.plugins {
            if plugin.get_status().is_running {
                plugin.stop();
            }
        }
    }

    /// Factories skipped by the last `load_plugins`
    pub fn skipped(&self) -> &[SkippedPlugin] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Create a registry with all built-in plugins
pub fn default_registry(context: PluginContext) -> PluginRegistry {
    let mut registry = PluginRegistry::new(context);
    registry.register(super::report_viewer::ReportViewer::factory);
    registry.register(super::scan_history::ScanHistory::factory);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::plugin::contract::{Lifecycle, PluginInfo, RunOptions};
    use crate::plugin::surface::{MountPoint, Surface};
    use tempfile::TempDir;

    static FAKE: PluginInfo = PluginInfo {
        name: "Fake",
        category: "testing",
        stream_type: "none",
        description: "",
        author: "",
        version: "0.0",
    };

    static NAMELESS: PluginInfo = PluginInfo {
        name: "  ",
        category: "testing",
        stream_type: "none",
        description: "",
        author: "",
        version: "0.0",
    };

    struct FakePlugin {
        info: &'static PluginInfo,
        lifecycle: Lifecycle,
    }

    impl Plugin for FakePlugin {
        fn info(&self) -> &'static PluginInfo { self.info }
        fn create_gui(&mut self, mount: &MountPoint) -> Result<Surface> {
            Ok(Surface::new(mount, self.info.name, &["Refreshes"]))
        }
        fn run(&mut self, options: &RunOptions) -> Result<()> {
            self.lifecycle.start(options);
            Ok(())
        }
        fn stop(&mut self) { self.lifecycle.stop(); }
        fn update_gui(&mut self) -> Result<()> { Ok(()) }
        fn get_status(&self) -> PluginStatus { self.lifecycle.status(self.info) }
    }

    fn fake(_: &PluginContext) -> Result<Box<dyn Plugin>> {
        Ok(Box::new(FakePlugin { info: &FAKE, lifecycle: Lifecycle::new() }))
    }

    fn nameless(_: &PluginContext) -> Result<Box<dyn Plugin>> {
        Ok(Box::new(FakePlugin { info: &NAMELESS, lifecycle: Lifecycle::new() }))
    }

    fn broken(_: &PluginContext) -> Result<Box<dyn Plugin>> {
        Err(Error::Plugin("missing dependency".to_string()))
    }

    fn context() -> PluginContext {
        PluginContext::new("unused.db")
    }

    #[test]
    fn test_failing_factory_is_skipped() {
        let mut registry = PluginRegistry::new(context());
        registry.register(broken);
        registry.register(fake);

        assert_eq!(registry.load_plugins(), 1);
        assert!(registry.get_plugin("Fake").is_some());
        assert_eq!(registry.skipped().len(), 1);
        assert_eq!(registry.skipped()[0].name, None);
        assert!(registry.skipped()[0].reason.contains("missing dependency"));
    }

    #[test]
    fn test_duplicate_and_nameless_are_skipped() {
        let mut registry = PluginRegistry::new(context());
        registry.register(fake);
        registry.register(fake);
        registry.register(nameless);

        assert_eq!(registry.load_plugins(), 1);
        assert_eq!(registry.skipped().len(), 2);
        assert_eq!(registry.names(), vec!["Fake"]);
    }

    #[test]
    fn test_reload_replaces_instances() {
        let mut registry = PluginRegistry::new(context());
        registry.register(fake);
        registry.load_plugins();
        registry.get_plugin_mut("Fake").unwrap().run(&RunOptions::default()).unwrap();
        assert!(registry.statuses()[0].is_running);

        assert_eq!(registry.load_plugins(), 1);
        assert_eq!(registry.len(), 1);
        assert!(!registry.statuses()[0].is_running);
    }

    #[test]
    fn test_disabled_plugin_not_loaded() {
        let mut registry = PluginRegistry::new(context()).with_disabled(["Fake"]);
        registry.register(fake);

        assert_eq!(registry.load_plugins(), 0);
        assert!(registry.is_empty());
        assert_eq!(registry.skipped()[0].name.as_deref(), Some("Fake"));
        assert!(registry.get_plugin("Fake").is_none());
    }

    #[test]
    fn test_update_all_only_touches_running() {
        let mut registry = PluginRegistry::new(context());
        registry.register(fake);
        registry.load_plugins();

        assert_eq!(registry.update_all(), 0);
        registry.get_plugin_mut("Fake").unwrap().run(&RunOptions::default()).unwrap();
        assert_eq!(registry.update_all(), 1);

        registry.stop_all();
        assert_eq!(registry.update_all(), 0);
        assert!(!registry.statuses()[0].is_running);
    }

    #[test]
    fn test_default_registry_loads_builtins() {
        let dir = TempDir::new().unwrap();
        let mut registry = default_registry(PluginContext::new(dir.path().join("plugins.db")));

        assert_eq!(registry.load_plugins(), 2);
        assert!(registry.skipped().is_empty());
        let viewer = registry.get_plugin("Code Analysis Reports").unwrap();
        assert_eq!(viewer.get_status().category, "analysis_viewer");
        assert_eq!(viewer.info().stream_type, "code_analysis");
        assert!(registry.get_plugin("Scan History").is_some());
        assert!(registry.get_plugin("Nope").is_none());
    }
}
