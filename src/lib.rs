//! Remove the background from a photo and export it as PNG.
//!
//! [`pipeline::PipelineController`] owns one session: it decodes an upload,
//! runs a [`segmentation::BackgroundRemover`] on a bounded copy and caches
//! the cut-out, then renders PNG exports with a transparent or white
//! background at any scale and quality without touching the model again.

pub mod error;
pub mod imaging;
pub mod pipeline;
pub mod segmentation;

#[cfg(test)]
mod test_helpers;

pub use error::PipelineError;
