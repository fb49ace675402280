pub mod colormap;

pub use colormap::{ColorClass, ColorMap, Rgb};
