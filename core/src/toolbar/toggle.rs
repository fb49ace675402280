use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

/// Failures raised by the toggle registry.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ToolbarError {
    #[error("unknown tool id {0}")]
    UnknownTool(usize),
}

/// Handle to a tool owned by a [`ToggleRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToolId(usize);

/// Widget a key binding is installed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindContext {
    Root,
    Canvas,
    Named(String),
}

/// Raised buttons are idle, sunken buttons are the active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relief {
    Raised,
    Sunken,
}

/// Handler run when a bound key is pressed; receives the UI state.
pub type KeyHandler<C> = Rc<dyn Fn(&mut C)>;
type Callback<C> = Box<dyn FnMut(&mut C)>;
type ToggleCallback<C> = Box<dyn FnMut(&mut C, bool)>;

/// Key bindings currently live on each context.
///
/// Binding a key that is already bound replaces the old handler.
pub struct Keymap<C> {
    bindings: HashMap<(BindContext, String), KeyHandler<C>>,
}

impl<C> Keymap<C> {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, context: BindContext, key: impl Into<String>, handler: KeyHandler<C>) {
        self.bindings.insert((context, key.into()), handler);
    }

    pub fn unbind(&mut self, context: &BindContext, key: &str) {
        self.bindings.remove(&(context.clone(), key.to_string()));
    }

    pub fn is_bound(&self, context: &BindContext, key: &str) -> bool {
        self.bindings
            .contains_key(&(context.clone(), key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn handler(&self, context: &BindContext, key: &str) -> Option<KeyHandler<C>> {
        self.bindings
            .get(&(context.clone(), key.to_string()))
            .cloned()
    }
}

impl<C> Default for Keymap<C> {
    fn default() -> Self {
        Self::new()
    }
}

struct Binding<C> {
    context: BindContext,
    key: String,
    handler: KeyHandler<C>,
}

/// A button that stays sunken until clicked again.
///
/// While active its key bindings are installed; leaving the active state,
/// whether by a second click or because another tool took over, removes them
/// and runs the release callback.
pub struct ToggleTool<C> {
    name: String,
    active: bool,
    bindings: Vec<Binding<C>>,
    cursor: Option<String>,
    on_release: Option<Callback<C>>,
    on_toggle: Option<ToggleCallback<C>>,
}

impl<C> ToggleTool<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: false,
            bindings: Vec::new(),
            cursor: None,
            on_release: None,
            on_toggle: None,
        }
    }

    /// Adds a key binding installed while the tool is active.
    pub fn bind<F>(mut self, context: BindContext, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut C) + 'static,
    {
        self.bindings.push(Binding {
            context,
            key: key.into(),
            handler: Rc::new(handler),
        });
        self
    }

    /// Cursor shown while the tool is active.
    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Runs whenever the tool leaves the active state.
    pub fn on_release<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut C) + 'static,
    {
        self.on_release = Some(Box::new(callback));
        self
    }

    /// Extra action run after every toggle of this tool, with the new state.
    pub fn on_toggle<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut C, bool) + 'static,
    {
        self.on_toggle = Some(Box::new(callback));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn relief(&self) -> Relief {
        if self.active {
            Relief::Sunken
        } else {
            Relief::Raised
        }
    }

    fn install(&self, keymap: &mut Keymap<C>) {
        for binding in &self.bindings {
            debug!("binding {} on {:?} for {}", binding.key, binding.context, self.name);
            keymap.bind(binding.context.clone(), binding.key.clone(), binding.handler.clone());
        }
    }

    fn release(&mut self, keymap: &mut Keymap<C>, ctx: &mut C) {
        self.active = false;
        for binding in &self.bindings {
            debug!("unbinding {} on {:?} for {}", binding.key, binding.context, self.name);
            keymap.unbind(&binding.context, &binding.key);
        }
        if let Some(callback) = self.on_release.as_mut() {
            callback(ctx);
        }
    }
}

impl<C> fmt::Debug for ToggleTool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToggleTool")
            .field("name", &self.name)
            .field("active", &self.active)
            .field("bindings", &self.bindings.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

/// Owns every toggle tool and the key map they bind into.
///
/// At most one tool is active: activating a tool first releases whichever
/// other tool was active.
pub struct ToggleRegistry<C> {
    tools: Vec<ToggleTool<C>>,
    keymap: Keymap<C>,
}

impl<C> ToggleRegistry<C> {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            keymap: Keymap::new(),
        }
    }

    pub fn register(&mut self, tool: ToggleTool<C>) -> ToolId {
        self.tools.push(tool);
        ToolId(self.tools.len() - 1)
    }

    pub fn tool(&self, id: ToolId) -> Result<&ToggleTool<C>, ToolbarError> {
        self.tools.get(id.0).ok_or(ToolbarError::UnknownTool(id.0))
    }

    pub fn find(&self, name: &str) -> Option<ToolId> {
        self.tools.iter().position(|t| t.name == name).map(ToolId)
    }

    pub fn is_active(&self, id: ToolId) -> bool {
        self.tools.get(id.0).is_some_and(|t| t.active)
    }

    pub fn relief(&self, id: ToolId) -> Result<Relief, ToolbarError> {
        self.tool(id).map(ToggleTool::relief)
    }

    pub fn active(&self) -> Option<ToolId> {
        self.tools.iter().position(|t| t.active).map(ToolId)
    }

    pub fn active_cursor(&self) -> Option<&str> {
        self.tools
            .iter()
            .find(|t| t.active)
            .and_then(|t| t.cursor.as_deref())
    }

    pub fn keymap(&self) -> &Keymap<C> {
        &self.keymap
    }

    /// Flips `id`, releasing any other active tool first.
    ///
    /// Returns the tool's new state.
    pub fn toggle(&mut self, id: ToolId, ctx: &mut C) -> Result<bool, ToolbarError> {
        if id.0 >= self.tools.len() {
            return Err(ToolbarError::UnknownTool(id.0));
        }
        let now_active = !self.tools[id.0].active;

        for (idx, other) in self.tools.iter_mut().enumerate() {
            if idx != id.0 && other.active {
                debug!("forcing {} off", other.name);
                other.release(&mut self.keymap, ctx);
            }
        }

        let tool = &mut self.tools[id.0];
        if now_active {
            tool.active = true;
            tool.install(&mut self.keymap);
        } else {
            tool.release(&mut self.keymap, ctx);
        }
        debug!("{} is now {}", tool.name, if now_active { "active" } else { "inactive" });

        if let Some(callback) = tool.on_toggle.as_mut() {
            callback(ctx, now_active);
        }
        Ok(now_active)
    }

    /// Releases the active tool, if any.
    pub fn deactivate_all(&mut self, ctx: &mut C) {
        for tool in self.tools.iter_mut().filter(|t| t.active) {
            tool.release(&mut self.keymap, ctx);
        }
    }

    /// Runs the handler bound to `key` on `context`; false when nothing is bound.
    pub fn dispatch_key(&self, context: &BindContext, key: &str, ctx: &mut C) -> bool {
        match self.keymap.handler(context, key) {
            Some(handler) => {
                handler(ctx);
                true
            }
            None => false,
        }
    }
}

impl<C> Default for ToggleRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Ui {
        released: Vec<&'static str>,
        chained: usize,
        keys: Vec<&'static str>,
    }

    fn tool(name: &'static str) -> ToggleTool<Ui> {
        ToggleTool::new(name)
            .bind(BindContext::Root, "Escape", move |ui: &mut Ui| ui.keys.push(name))
            .on_release(move |ui: &mut Ui| ui.released.push(name))
    }

    #[test]
    fn only_last_toggled_tool_stays_active() {
        let mut registry = ToggleRegistry::new();
        let mut ui = Ui::default();
        let a = registry.register(tool("a"));
        let b = registry.register(tool("b"));
        let c = registry.register(tool("c"));

        for id in [a, b, c] {
            assert!(registry.toggle(id, &mut ui).unwrap());
        }

        assert_eq!(registry.active(), Some(c));
        assert!(!registry.is_active(a));
        assert!(!registry.is_active(b));
        assert_eq!(ui.released, vec!["a", "b"]);
        assert_eq!(registry.relief(a).unwrap(), Relief::Raised);
        assert_eq!(registry.relief(c).unwrap(), Relief::Sunken);
    }

    #[test]
    fn toggling_active_tool_off_unbinds_and_releases_once() {
        let mut registry = ToggleRegistry::new();
        let mut ui = Ui::default();
        let a = registry.register(tool("a"));

        registry.toggle(a, &mut ui).unwrap();
        assert!(registry.keymap().is_bound(&BindContext::Root, "Escape"));
        assert!(!registry.toggle(a, &mut ui).unwrap());

        assert_eq!(registry.active(), None);
        assert!(registry.keymap().is_empty());
        assert_eq!(ui.released, vec!["a"]);
    }

    #[test]
    fn bindings_follow_the_active_tool() {
        let mut registry = ToggleRegistry::new();
        let mut ui = Ui::default();
        let a = registry.register(tool("a"));
        let b = registry.register(tool("b"));

        registry.toggle(a, &mut ui).unwrap();
        assert!(registry.dispatch_key(&BindContext::Root, "Escape", &mut ui));
        registry.toggle(b, &mut ui).unwrap();
        assert!(registry.dispatch_key(&BindContext::Root, "Escape", &mut ui));
        assert!(!registry.dispatch_key(&BindContext::Canvas, "Escape", &mut ui));

        assert_eq!(ui.keys, vec!["a", "b"]);
        assert_eq!(registry.keymap().len(), 1);
    }

    #[test]
    fn chained_action_runs_on_every_toggle() {
        let mut registry = ToggleRegistry::new();
        let mut ui = Ui::default();
        let zoom = registry.register(
            ToggleTool::new("zoom")
                .cursor("crosshair")
                .on_toggle(|ui: &mut Ui, _active: bool| ui.chained += 1),
        );

        registry.toggle(zoom, &mut ui).unwrap();
        assert_eq!(registry.active_cursor(), Some("crosshair"));
        registry.toggle(zoom, &mut ui).unwrap();
        assert_eq!(registry.active_cursor(), None);
        assert_eq!(ui.chained, 2);
    }

    #[test]
    fn bare_tool_only_flips_state() {
        let mut registry: ToggleRegistry<Ui> = ToggleRegistry::new();
        let mut ui = Ui::default();
        let plain = registry.register(ToggleTool::new("plain"));
        assert!(registry.toggle(plain, &mut ui).unwrap());
        assert!(registry.keymap().is_empty());
        assert!(!registry.toggle(plain, &mut ui).unwrap());
        assert!(ui.released.is_empty());
    }

    #[test]
    fn deactivate_all_releases_active_tool() {
        let mut registry = ToggleRegistry::new();
        let mut ui = Ui::default();
        let a = registry.register(tool("a"));
        registry.toggle(a, &mut ui).unwrap();
        registry.deactivate_all(&mut ui);
        registry.deactivate_all(&mut ui);
        assert_eq!(registry.active(), None);
        assert_eq!(ui.released, vec!["a"]);
    }

    #[test]
    fn unknown_tool_is_an_error() {
        let mut registry: ToggleRegistry<Ui> = ToggleRegistry::new();
        let mut ui = Ui::default();
        assert_eq!(
            registry.toggle(ToolId(3), &mut ui),
            Err(ToolbarError::UnknownTool(3))
        );
        assert!(registry.tool(ToolId(0)).is_err());
        assert_eq!(registry.find("missing"), None);
    }
}
