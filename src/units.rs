//! Length units. Geometry is carried in centimetres; the document backend
//! speaks twips (table and column widths, spacing) and EMU (pictures).

use serde::Deserialize;

pub const TWIPS_PER_CM: f64 = 567.0;
pub const EMU_PER_CM: f64 = 360_000.0;
pub const CM_PER_INCH: f64 = 2.54;

pub fn twips_to_cm(twips: f64) -> f64 {
    twips / TWIPS_PER_CM
}

pub fn cm_to_twips(cm: f64) -> f64 {
    cm * TWIPS_PER_CM
}

pub fn emu_to_cm(emu: f64) -> f64 {
    emu / EMU_PER_CM
}

pub fn cm_to_emu(cm: f64) -> f64 {
    cm * EMU_PER_CM
}

/// Twentieths of a point, the backend's native unit for table geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Twips(pub u32);

impl Twips {
    /// Rounds to the nearest twip; negative and non-finite inputs clamp to zero.
    pub fn from_cm(cm: f64) -> Self {
        let t = cm_to_twips(cm).round();
        if t.is_finite() && t > 0.0 {
            Twips(t.min(u32::MAX as f64) as u32)
        } else {
            Twips(0)
        }
    }

    pub fn to_cm(self) -> f64 {
        twips_to_cm(self.0 as f64)
    }
}

/// English Metric Units, the backend's native unit for picture extents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Emu(pub u64);

impl Emu {
    pub fn from_cm(cm: f64) -> Self {
        let e = cm_to_emu(cm).round();
        if e.is_finite() && e > 0.0 {
            Emu(e as u64)
        } else {
            Emu(0)
        }
    }

    pub fn to_cm(self) -> f64 {
        emu_to_cm(self.0 as f64)
    }
}
