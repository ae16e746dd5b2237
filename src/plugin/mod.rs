//! Display plugins
//!
//! A plugin renders one view of the findings store onto a host-supplied
//! mount point. The registry is built from an explicit factory list.

pub mod contract;
pub mod surface;
pub mod registry;
pub mod report_viewer;
pub mod scan_history;

pub use contract::{Lifecycle, Plugin, PluginInfo, PluginState, PluginStatus, RunOptions};
pub use registry::{default_registry, PluginContext, PluginFactory, PluginRegistry, SkippedPlugin};
pub use report_viewer::ReportViewer;
pub use scan_history::ScanHistory;
pub use surface::{Frame, MountPoint, Surface};
