//! Toolbar state shared by the viewer: exclusive toggle tools, navigation and tooltips.

pub mod navigation;
pub mod toggle;
pub mod tooltip;

pub use navigation::{NavMode, NavigationSurface, Navigator, ViewLimits};
pub use toggle::{BindContext, KeyHandler, Keymap, Relief, ToggleRegistry, ToggleTool, ToolId, ToolbarError};
pub use tooltip::Tooltip;
