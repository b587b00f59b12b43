pub mod builder;
pub mod resample;

pub use builder::{BandStack, BandStackBuilder};
pub use resample::Resampling;
