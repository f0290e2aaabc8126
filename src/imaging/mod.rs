//! Pure bitmap helpers used by the pipeline stages.
//!
//! Nothing in here holds state or mutates its input; every function returns
//! a fresh buffer.

mod codec;
mod composite;
mod resize;

pub use codec::{compression_for_quality, decode, encode_png, is_supported_upload, SUPPORTED_EXTENSIONS};
pub use composite::{composite_over, has_transparency, WHITE};
pub use resize::{fit_dimensions, fit_within, scale_by, scaled_dimensions, RESIZE_FILTER};
