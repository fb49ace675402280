use serde::{Deserialize, Serialize};

/// Drags shorter than this many pixels on either axis do not zoom.
const MIN_ZOOM_PIXELS: f32 = 5.0;

/// The drawing hooks the navigator needs from whatever hosts the plot.
///
/// Positions handed to the navigator are figure coordinates: origin in the
/// bottom-left corner, y growing upwards. The rubber band is handed back in
/// surface coordinates (origin top-left).
pub trait NavigationSurface {
    /// Width and height in pixels.
    fn surface_size(&self) -> (f32, f32);
    fn draw_rubberband(&mut self, x0: f32, y0: f32, x1: f32, y1: f32);
    fn clear_rubberband(&mut self);
}

/// Data range shown by the plot. `x0`/`y0` are the left/bottom edges and may
/// exceed `x1`/`y1` when an axis runs backwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewLimits {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl ViewLimits {
    /// From an image extent `[x_start, x_end, y_min, y_max]`.
    pub fn from_extent(extent: [f64; 4]) -> Self {
        Self {
            x0: extent[0],
            x1: extent[1],
            y0: extent[2],
            y1: extent[3],
        }
    }

    fn data_at(&self, size: (f32, f32), x: f32, y: f32) -> (f64, f64) {
        let (w, h) = (size.0.max(1.0) as f64, size.1.max(1.0) as f64);
        (
            self.x0 + (x as f64 / w) * (self.x1 - self.x0),
            self.y0 + (y as f64 / h) * (self.y1 - self.y0),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavMode {
    #[default]
    None,
    Pan,
    Zoom,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    x: f32,
    y: f32,
    view: ViewLimits,
}

impl Press {
    /// The pressed view shifted so the data under the press follows the pointer.
    fn panned(&self, size: (f32, f32), x: f32, y: f32) -> ViewLimits {
        let (w, h) = (size.0.max(1.0) as f64, size.1.max(1.0) as f64);
        let dx = (x - self.x) as f64 / w * (self.view.x1 - self.view.x0);
        let dy = (y - self.y) as f64 / h * (self.view.y1 - self.view.y0);
        ViewLimits {
            x0: self.view.x0 - dx,
            x1: self.view.x1 - dx,
            y0: self.view.y0 - dy,
            y1: self.view.y1 - dy,
        }
    }
}

/// Pan/zoom state with a home/back/forward view history.
#[derive(Debug, Clone)]
pub struct Navigator {
    mode: NavMode,
    home: ViewLimits,
    view: ViewLimits,
    history: Vec<ViewLimits>,
    position: usize,
    press: Option<Press>,
}

impl Navigator {
    pub fn new(home: ViewLimits) -> Self {
        Self {
            mode: NavMode::None,
            home,
            view: home,
            history: vec![home],
            position: 0,
            press: None,
        }
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    pub fn view(&self) -> ViewLimits {
        self.view
    }

    /// Changes the interaction mode, abandoning any drag in progress.
    pub fn set_mode(&mut self, mode: NavMode) {
        self.mode = mode;
        self.press = None;
    }

    /// Data coordinates under a figure position.
    pub fn data_at<S: NavigationSurface + ?Sized>(&self, surface: &S, x: f32, y: f32) -> (f64, f64) {
        self.view.data_at(surface.surface_size(), x, y)
    }

    pub fn press(&mut self, x: f32, y: f32) {
        if self.mode != NavMode::None {
            self.press = Some(Press {
                x,
                y,
                view: self.view,
            });
        }
    }

    pub fn drag<S: NavigationSurface + ?Sized>(&mut self, surface: &mut S, x: f32, y: f32) {
        let Some(press) = self.press else { return };
        let size = surface.surface_size();
        match self.mode {
            NavMode::Zoom => {
                let height = size.1;
                surface.draw_rubberband(press.x, height - press.y, x, height - y);
            }
            NavMode::Pan => self.view = press.panned(size, x, y),
            NavMode::None => {}
        }
    }

    pub fn release<S: NavigationSurface + ?Sized>(&mut self, surface: &mut S, x: f32, y: f32) {
        let Some(press) = self.press.take() else { return };
        match self.mode {
            NavMode::Zoom => {
                surface.clear_rubberband();
                if (x - press.x).abs() < MIN_ZOOM_PIXELS || (y - press.y).abs() < MIN_ZOOM_PIXELS {
                    return;
                }
                let size = surface.surface_size();
                let (left, bottom) = press.view.data_at(size, press.x.min(x), press.y.min(y));
                let (right, top) = press.view.data_at(size, press.x.max(x), press.y.max(y));
                self.view = ViewLimits {
                    x0: left,
                    x1: right,
                    y0: bottom,
                    y1: top,
                };
                self.push_current();
            }
            NavMode::Pan => {
                self.view = press.panned(surface.surface_size(), x, y);
                self.push_current();
            }
            NavMode::None => {}
        }
    }

    /// Records the current view, dropping any forward history.
    pub fn push_current(&mut self) {
        self.history.truncate(self.position + 1);
        self.history.push(self.view);
        self.position = self.history.len() - 1;
    }

    pub fn home(&mut self) {
        self.view = self.home;
        self.push_current();
    }

    pub fn back(&mut self) {
        if self.position > 0 {
            self.position -= 1;
            self.view = self.history[self.position];
        }
    }

    pub fn forward(&mut self) {
        if self.position + 1 < self.history.len() {
            self.position += 1;
            self.view = self.history[self.position];
        }
    }

    /// Replaces the home view, e.g. after a new product is loaded.
    pub fn reset(&mut self, home: ViewLimits) {
        *self = Self {
            mode: self.mode,
            ..Self::new(home)
        };
    }
}
