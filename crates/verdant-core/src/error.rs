use thiserror::Error;

use crate::scene::BandName;

#[derive(Error, Debug)]
pub enum VerdantError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene {scene} is missing band {band}")]
    MissingBand { scene: String, band: BandName },

    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("Empty scene stack")]
    EmptyStack,

    #[error("Invalid band data: {0}")]
    InvalidBand(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid date: {0}")]
    DateParse(String),

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, VerdantError>;
