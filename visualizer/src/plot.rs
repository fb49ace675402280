use calipsocore::render::ColorMap;
use calipsocore::toolbar::{NavigationSurface, ViewLimits};
use calipsocore::PlotProduct;
use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke},
    Color, Point, Rectangle, Renderer, Size, Theme,
};

pub const PLOT_WIDTH: f32 = 900.0;
pub const PLOT_HEIGHT: f32 = 480.0;

/// Rubber band and surface size handed to the navigator.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub band: Option<(f32, f32, f32, f32)>,
}

impl NavigationSurface for Overlay {
    fn surface_size(&self) -> (f32, f32) {
        (PLOT_WIDTH, PLOT_HEIGHT)
    }

    fn draw_rubberband(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        self.band = Some((x0, y0, x1, y1));
    }

    fn clear_rubberband(&mut self) {
        self.band = None;
    }
}

/// Heat map of a product seen through the current view limits.
pub struct Heatmap<'a> {
    pub product: &'a PlotProduct,
    pub colormap: &'a ColorMap,
    pub view: ViewLimits,
    pub band: Option<(f32, f32, f32, f32)>,
    pub shapes: &'a [Vec<(f64, f64)>],
    pub sketch: &'a [(f64, f64)],
}

impl Heatmap<'_> {
    fn to_screen(&self, size: Size, x: f64, y: f64) -> Point {
        let fx = (x - self.view.x0) / (self.view.x1 - self.view.x0);
        let fy = (y - self.view.y0) / (self.view.y1 - self.view.y0);
        Point::new(
            (fx * size.width as f64) as f32,
            size.height - (fy * size.height as f64) as f32,
        )
    }

    fn stroke_polyline(&self, frame: &mut Frame, points: &[(f64, f64)], closed: bool, color: Color) {
        if points.len() < 2 {
            return;
        }
        let size = frame.size();
        let path = Path::new(|builder| {
            for (i, &(x, y)) in points.iter().enumerate() {
                let p = self.to_screen(size, x, y);
                if i == 0 {
                    builder.move_to(p);
                } else {
                    builder.line_to(p);
                }
            }
            if closed {
                builder.close();
            }
        });
        frame.stroke(&path, Stroke::default().with_width(1.5).with_color(color));
    }
}

fn to_color(rgb: [u8; 3]) -> Color {
    Color::from_rgb8(rgb[0], rgb[1], rgb[2])
}

impl<Message> canvas::Program<Message> for Heatmap<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let size = bounds.size();
        frame.fill_rectangle(Point::ORIGIN, size, Color::from_rgb(0.02, 0.02, 0.04));

        let (rows, cols) = self.product.image.dim();
        let [x0, x1, z0, z1] = self.product.extent;
        let dx = (x1 - x0) / cols.max(1) as f64;
        let dz = (z1 - z0) / rows.max(1) as f64;
        for row in 0..rows {
            let top = z1 - dz * row as f64;
            for col in 0..cols {
                let left = x0 + dx * col as f64;
                let a = self.to_screen(size, left, top);
                let b = self.to_screen(size, left + dx, top - dz);
                let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
                let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
                if max_x < 0.0 || min_x > size.width || max_y < 0.0 || min_y > size.height {
                    continue;
                }
                let color = self.colormap.color_of(self.product.image.get(row, col));
                frame.fill_rectangle(
                    Point::new(min_x, min_y),
                    Size::new((max_x - min_x).max(1.0), (max_y - min_y).max(1.0)),
                    to_color(color),
                );
            }
        }

        for shape in self.shapes {
            self.stroke_polyline(&mut frame, shape, true, Color::from_rgb(0.95, 0.55, 0.2));
        }
        self.stroke_polyline(&mut frame, self.sketch, false, Color::from_rgb(0.95, 0.85, 0.3));

        if let Some((bx0, by0, bx1, by1)) = self.band {
            let band = Path::rectangle(
                Point::new(bx0.min(bx1), by0.min(by1)),
                Size::new((bx1 - bx0).abs(), (by1 - by0).abs()),
            );
            frame.stroke(&band, Stroke::default().with_width(1.0).with_color(Color::WHITE));
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calipsocore::toolbar::{NavMode, Navigator};

    #[test]
    fn overlay_tracks_zoom_rubberband() {
        let mut overlay = Overlay::default();
        let mut nav = Navigator::new(ViewLimits::from_extent([0.0, 10.0, 0.0, 20.0]));
        nav.set_mode(NavMode::Zoom);
        nav.press(10.0, 10.0);
        nav.drag(&mut overlay, 100.0, 50.0);
        assert_eq!(overlay.band, Some((10.0, PLOT_HEIGHT - 10.0, 100.0, PLOT_HEIGHT - 50.0)));
        nav.release(&mut overlay, 100.0, 50.0);
        assert!(overlay.band.is_none());
    }
}
