//! Algorithm names and the static error-diffusion kernel table.
//!
//! Kernels are based on <https://tannerhelland.com/2012/12/28/dithering-eleven-algorithms-source-code.html>.
//! Offsets only point at pixels the raster scan has not visited yet: `dy >= 0`, and
//! `dx > 0` whenever `dy == 0`.

use std::fmt;
use std::str::FromStr;

use crate::error::DitherError;

/// One neighbour receiving `weight / total` of the quantization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub weight: u32,
    pub dx: i32,
    pub dy: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct DiffusionKernel {
    pub total: u32,
    pub offsets: &'static [Offset],
}

impl DiffusionKernel {
    /// Sum of the declared weights. Equal to `total` except for Atkinson.
    pub fn diffused_weight(&self) -> u32 {
        self.offsets.iter().map(|o| o.weight).sum()
    }

    pub fn weights(&self) -> Vec<u32> {
        self.offsets.iter().map(|o| o.weight).collect()
    }
}

macro_rules! kernel {($name:ident, $total:expr, [ $( ($w:expr,$dx:expr,$dy:expr) ),* $(,)? ]) => {
    const $name: DiffusionKernel = DiffusionKernel { total: $total, offsets: &[ $( Offset { weight: $w, dx: $dx, dy: $dy } ),* ] };};}

kernel!(TWO_D, 1, [(1, 1, 0)]);
kernel!(
    FLOYD_STEINBERG,
    16,
    [(7, 1, 0), (3, -1, 1), (5, 0, 1), (1, 1, 1)]
);
kernel!(
    JARVIS_JUDICE_NINKE,
    48,
    [
        (7, 1, 0),
        (5, 2, 0),
        (3, -2, 1),
        (5, -1, 1),
        (7, 0, 1),
        (5, 1, 1),
        (3, 2, 1),
        (1, -2, 2),
        (3, -1, 2),
        (5, 0, 2),
        (3, 1, 2),
        (1, 2, 2)
    ]
);
kernel!(
    STUCKI,
    42,
    [
        (8, 1, 0),
        (4, 2, 0),
        (2, -2, 1),
        (4, -1, 1),
        (8, 0, 1),
        (4, 1, 1),
        (2, 2, 1),
        (1, -2, 2),
        (2, -1, 2),
        (4, 0, 2),
        (2, 1, 2),
        (1, 2, 2)
    ]
);
// Diffuses 6/8 of the error; the remaining quarter is dropped.
kernel!(
    ATKINSON,
    8,
    [
        (1, 1, 0),
        (1, 2, 0),
        (1, -1, 1),
        (1, 0, 1),
        (1, 1, 1),
        (1, 0, 2)
    ]
);
kernel!(
    BURKES,
    32,
    [
        (8, 1, 0),
        (4, 2, 0),
        (2, -2, 1),
        (4, -1, 1),
        (8, 0, 1),
        (4, 1, 1),
        (2, 2, 1)
    ]
);
kernel!(
    SIERRA_16,
    16,
    [
        (4, 1, 0),
        (3, 2, 0),
        (1, -2, 1),
        (2, -1, 1),
        (3, 0, 1),
        (2, 1, 1),
        (1, 2, 1)
    ]
);
// Sierra Lite:
//     X 2
//   1 1
kernel!(SIERRA_4, 4, [(2, 1, 0), (1, -1, 1), (1, 0, 1)]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Bayer-style threshold matrix; `factor` is the matrix order.
    Ordered,
    TwoD,
    FloydSteinberg,
    JarvisJudiceNinke,
    Stucki,
    Atkinson,
    Burkes,
    Sierra16,
    Sierra4,
}

impl Algorithm {
    pub const ALL: [Algorithm; 9] = [
        Algorithm::Ordered,
        Algorithm::TwoD,
        Algorithm::FloydSteinberg,
        Algorithm::JarvisJudiceNinke,
        Algorithm::Stucki,
        Algorithm::Atkinson,
        Algorithm::Burkes,
        Algorithm::Sierra16,
        Algorithm::Sierra4,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Ordered => "ordered",
            Algorithm::TwoD => "2d",
            Algorithm::FloydSteinberg => "floyd_stein",
            Algorithm::JarvisJudiceNinke => "jjn",
            Algorithm::Stucki => "stucki",
            Algorithm::Atkinson => "atkinson",
            Algorithm::Burkes => "burkes",
            Algorithm::Sierra16 => "sierra16",
            Algorithm::Sierra4 => "sierra4",
        }
    }

    /// Diffusion kernel, or `None` for ordered dithering.
    pub fn kernel(self) -> Option<&'static DiffusionKernel> {
        match self {
            Algorithm::Ordered => None,
            Algorithm::TwoD => Some(&TWO_D),
            Algorithm::FloydSteinberg => Some(&FLOYD_STEINBERG),
            Algorithm::JarvisJudiceNinke => Some(&JARVIS_JUDICE_NINKE),
            Algorithm::Stucki => Some(&STUCKI),
            Algorithm::Atkinson => Some(&ATKINSON),
            Algorithm::Burkes => Some(&BURKES),
            Algorithm::Sierra16 => Some(&SIERRA_16),
            Algorithm::Sierra4 => Some(&SIERRA_4),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = DitherError;

    /// Case-insensitive; `-` and `_` are interchangeable.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let norm = name.trim().to_ascii_lowercase().replace('-', "_");
        match norm.as_str() {
            "ordered" | "bayer" => Ok(Algorithm::Ordered),
            "2d" => Ok(Algorithm::TwoD),
            "floyd_stein" | "floyd_steinberg" | "fs" => Ok(Algorithm::FloydSteinberg),
            "jjn" | "jarvis_judice_ninke" => Ok(Algorithm::JarvisJudiceNinke),
            "stucki" => Ok(Algorithm::Stucki),
            "atkinson" => Ok(Algorithm::Atkinson),
            "burkes" => Ok(Algorithm::Burkes),
            "sierra16" | "sierra_2" => Ok(Algorithm::Sierra16),
            // sierra4 is commonly called "sierra lite"
            "sierra4" | "sierra_lite" | "sierra_1" => Ok(Algorithm::Sierra4),
            _ => Err(DitherError::InvalidConfiguration(format!(
                "unknown algorithm '{name}'"
            ))),
        }
    }
}
