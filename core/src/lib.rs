//! Core of the CALIPSO lidar viewer.
//!
//! The regridding pipeline takes Level 1B backscatter profiles, averages them
//! horizontally, moves the altitude bins onto a uniform axis and produces an
//! image-ready [`product::PlotProduct`]. The [`toolbar`] module holds the UI
//! state behind the viewer's exclusive Draw/Zoom/Pan buttons.

pub mod granule;
pub mod grid;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod product;
pub mod render;
pub mod telemetry;
pub mod toolbar;

pub use grid::MaskedGrid;
pub use prelude::{RegridMethod, RegridOptions, StageError, StageResult};
pub use product::{PlotProduct, ProductBuilder, ProductConfig, ProductError, ProductMethod};
