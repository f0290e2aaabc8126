mod preprocess;
mod types;
mod u2net;

pub use preprocess::Preprocessor;
pub use types::{BackgroundRemover, Matte};
pub use u2net::U2Net;

use anyhow::Result;
use std::path::Path;

/// Create the default background remover (U²-Net) from an ONNX file
pub fn create_default_remover<P: AsRef<Path>>(model_path: P) -> Result<Box<dyn BackgroundRemover>> {
    let remover = U2Net::new(model_path)?;
    Ok(Box::new(remover))
}
