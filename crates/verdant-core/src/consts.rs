/// Offset between Kelvin and degrees Celsius.
pub const KELVIN_OFFSET: f32 = 273.15;

/// Landsat Collection 2 Level-2 surface reflectance scale factor.
pub const REFLECTANCE_SCALE: f32 = 0.000_027_5;

/// Landsat Collection 2 Level-2 surface reflectance additive offset.
pub const REFLECTANCE_OFFSET: f32 = -0.2;

/// Landsat Collection 2 Level-2 surface temperature scale factor (Kelvin per DN).
pub const THERMAL_SCALE: f32 = 0.003_418_02;

/// Landsat Collection 2 Level-2 surface temperature additive offset (Kelvin).
pub const THERMAL_OFFSET: f32 = 149.0;

/// Digital number used by Level-2 products for fill pixels.
pub const FILL_DN: f32 = 0.0;

/// Largest representable QA_PIXEL value.
pub const QA_MAX: f32 = u16::MAX as f32;

/// Collection searched when none is configured.
pub const DEFAULT_COLLECTION: &str = "landsat-c2-l2";

/// Default maximum scene cloud cover, in percent.
pub const DEFAULT_CLOUD_COVER_MAX: f32 = 5.0;

/// Value range mapped onto the output pixel range when writing NDVI/NDWI rasters.
pub const NORMALIZED_INDEX_RANGE: (f32, f32) = (-1.0, 1.0);

/// Value range (degrees Celsius) mapped onto the output pixel range when writing LST rasters.
pub const LST_RANGE: (f32, f32) = (-20.0, 60.0);
