//! Error-diffusion and ordered dithering of floating-point RGBA buffers.
//!
//! ```
//! use dither_engine::{DitherRequest, PixelBuffer, dither_image};
//!
//! let samples = [0.1f32, 0.9, 0.4, 0.6]
//!     .iter()
//!     .flat_map(|&v| [v, v, v, 1.0])
//!     .collect();
//! let mut buf = PixelBuffer::new(2, 2, samples).unwrap();
//! let req = DitherRequest::new("floyd_stein", 1, false).unwrap();
//! dither_image(&mut buf, &req).unwrap();
//! assert_eq!(buf.red(buf.index_of(1, 0)), 1.0);
//! ```

pub mod buffer;
pub mod config;
pub mod diffusion;
pub mod dither;
pub mod error;
pub mod kernel;
pub mod ordered;
pub mod perturb;
pub mod pipeline;
pub mod sources;

pub use buffer::PixelBuffer;
pub use dither::{DitherRequest, dither_image, dither_image_with_rng};
pub use error::DitherError;
pub use kernel::Algorithm;
pub use ordered::OrderedMatrix;
