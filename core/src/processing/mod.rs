pub mod altitude;
pub mod average;
pub mod interp2d;
pub mod mask;
pub mod regrid;

pub use altitude::{uniform_altitudes, AltitudeGrid};
pub use average::{average_profiles, decimate_coordinates};
pub use interp2d::{interpolate_field, TargetGrid};
pub use mask::mask_out_of_range;
pub use regrid::regrid_lidar;
