/// Pixel offset of the tip window from the widget's top-left corner.
pub const TIP_OFFSET: (f32, f32) = (27.0, 27.0);

/// Hover hint attached to one widget.
///
/// The host forwards the widget's enter/leave events; the tip is visible
/// between the two.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    text: String,
    visible: bool,
}

impl Tooltip {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visible: false,
        }
    }

    /// Shows the tip unless it is already up or has nothing to say.
    pub fn enter(&mut self) {
        if !self.visible && !self.text.is_empty() {
            self.visible = true;
        }
    }

    pub fn leave(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the tip window goes for a widget whose origin is at `anchor`.
    pub fn placement(&self, anchor: (f32, f32)) -> (f32, f32) {
        (anchor.0 + TIP_OFFSET.0, anchor.1 + TIP_OFFSET.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_shows_and_leave_hides() {
        let mut tip = Tooltip::new("Zoom to rectangle");
        tip.enter();
        assert!(tip.is_visible());
        tip.leave();
        assert!(!tip.is_visible());
        assert_eq!(tip.placement((10.0, 4.0)), (37.0, 31.0));
    }

    #[test]
    fn empty_text_never_shows() {
        let mut tip = Tooltip::new("");
        tip.enter();
        assert!(!tip.is_visible());
    }
}
