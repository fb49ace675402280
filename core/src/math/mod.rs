pub mod interp;
pub mod stats;

pub use interp::{bracket, linspace, Bracket};
pub use stats::{masked_mean, StatsHelper};
