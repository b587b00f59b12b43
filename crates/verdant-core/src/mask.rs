//! Per-pixel validity from the bit-encoded QA band.
//!
//! A pixel is unusable when any configured flag bit is raised:
//! `qa & bitmask != 0`. A QA value of zero raises no flag and is valid.

use std::str::FromStr;

use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

use crate::consts::QA_MAX;
use crate::error::{Result, VerdantError};

/// Landsat Collection 2 `QA_PIXEL` condition bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaFlag {
    Fill,
    DilatedCloud,
    Cirrus,
    Cloud,
    CloudShadow,
    Snow,
    Clear,
    Water,
}

impl QaFlag {
    pub const ALL: [QaFlag; 8] = [
        QaFlag::Fill,
        QaFlag::DilatedCloud,
        QaFlag::Cirrus,
        QaFlag::Cloud,
        QaFlag::CloudShadow,
        QaFlag::Snow,
        QaFlag::Clear,
        QaFlag::Water,
    ];

    /// Bit position within the QA word.
    pub const fn bit(self) -> u8 {
        match self {
            Self::Fill => 0,
            Self::DilatedCloud => 1,
            Self::Cirrus => 2,
            Self::Cloud => 3,
            Self::CloudShadow => 4,
            Self::Snow => 5,
            Self::Clear => 6,
            Self::Water => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::DilatedCloud => "dilated_cloud",
            Self::Cirrus => "cirrus",
            Self::Cloud => "cloud",
            Self::CloudShadow => "cloud_shadow",
            Self::Snow => "snow",
            Self::Clear => "clear",
            Self::Water => "water",
        }
    }

    /// Flags that usually make a pixel unusable for vegetation and
    /// temperature analysis.
    pub fn default_unusable() -> Vec<QaFlag> {
        vec![
            QaFlag::Fill,
            QaFlag::DilatedCloud,
            QaFlag::Cirrus,
            QaFlag::Cloud,
            QaFlag::CloudShadow,
            QaFlag::Water,
        ]
    }
}

impl std::fmt::Display for QaFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QaFlag {
    type Err = VerdantError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        QaFlag::ALL
            .into_iter()
            .find(|f| f.name() == key)
            .ok_or_else(|| VerdantError::InvalidConfig(format!("unknown QA flag '{s}'")))
    }
}

/// OR of `1 << position` over every unusable-condition bit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct QaBitmask(u16);

impl QaBitmask {
    pub fn from_flags(flags: &[QaFlag]) -> Self {
        Self(flags.iter().fold(0u16, |acc, f| acc | (1u16 << f.bit())))
    }

    /// Build from raw bit positions. Positions must be below 16.
    pub fn from_positions(positions: &[u8]) -> Result<Self> {
        let mut bits = 0u16;
        for &p in positions {
            if p >= 16 {
                return Err(VerdantError::InvalidConfig(format!(
                    "QA bit position {p} exceeds the 16-bit QA word"
                )));
            }
            bits |= 1u16 << p;
        }
        Ok(Self(bits))
    }

    pub fn union(self, other: QaBitmask) -> Self {
        Self(self.0 | other.0)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when `qa` raises any of the bits in this mask.
    pub fn rejects(self, qa: u16) -> bool {
        qa & self.0 != 0
    }
}

/// Validity of every pixel of one scene: `true` where usable.
#[derive(Clone, Debug, PartialEq)]
pub struct QualityMask {
    valid: Array2<bool>,
}

impl QualityMask {
    /// Mask from an integer QA raster.
    pub fn from_qa(qa: ArrayView2<'_, u16>, bitmask: QaBitmask) -> Self {
        Self {
            valid: qa.mapv(|v| !bitmask.rejects(v)),
        }
    }

    /// Mask from a QA raster stored as floats (as held in a band stack).
    ///
    /// Every value must be a whole number in `0..=65535`; anything else means
    /// the QA band was resampled or scaled and no longer carries bit flags.
    pub fn from_qa_values(qa: ArrayView2<'_, f32>, bitmask: QaBitmask) -> Result<Self> {
        let words = qa_words(qa)?;
        Ok(Self::from_qa(words.view(), bitmask))
    }

    /// Mask that accepts every pixel.
    pub fn all_valid(dim: (usize, usize)) -> Self {
        Self {
            valid: Array2::from_elem(dim, true),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.valid.dim()
    }

    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.valid[[row, col]]
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.valid
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    pub fn valid_fraction(&self) -> f64 {
        let total = self.valid.len();
        if total == 0 {
            return 0.0;
        }
        self.valid_count() as f64 / total as f64
    }

    /// Band values where the mask is valid and the value is finite.
    pub fn apply(&self, band: ArrayView2<'_, f32>) -> Result<Array2<Option<f32>>> {
        if band.dim() != self.valid.dim() {
            return Err(VerdantError::Alignment(format!(
                "band grid {:?} does not match mask grid {:?}",
                band.dim(),
                self.valid.dim()
            )));
        }
        let mut out = Array2::from_elem(band.dim(), None);
        Zip::from(&mut out)
            .and(&band)
            .and(&self.valid)
            .for_each(|o, &v, &ok| {
                if ok && v.is_finite() {
                    *o = Some(v);
                }
            });
        Ok(out)
    }
}

fn qa_words(qa: ArrayView2<'_, f32>) -> Result<Array2<u16>> {
    let mut words = Array2::<u16>::zeros(qa.dim());
    for (w, &v) in words.iter_mut().zip(qa.iter()) {
        if !(v.is_finite() && v >= 0.0 && v <= QA_MAX && v.fract() == 0.0) {
            return Err(VerdantError::InvalidBand(format!(
                "QA value {v} is not a 16-bit flag word"
            )));
        }
        *w = v as u16;
    }
    Ok(words)
}
