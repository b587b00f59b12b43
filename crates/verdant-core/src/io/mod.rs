pub mod export;
pub mod raster;
