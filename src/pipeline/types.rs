use image::{RgbImage, RgbaImage};
use std::fmt;
use std::time::Duration;

/// Lifecycle of one uploaded file.
///
/// `Exported` can be re-entered any number of times; a new upload goes back
/// through `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Empty,
    Ingested,
    Prepared,
    Segmented,
    Exported,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Ingested => "ingested",
            Self::Prepared => "prepared",
            Self::Segmented => "segmented",
            Self::Exported => "exported",
        };
        f.write_str(name)
    }
}

/// Decoded upload, RGB only. Never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage(RgbImage);

impl SourceImage {
    pub(crate) fn new(image: RgbImage) -> Self {
        Self(image)
    }

    pub fn image(&self) -> &RgbImage {
        &self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

/// Bounded copy of the source handed to the remover
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingImage(RgbImage);

impl WorkingImage {
    pub(crate) fn new(image: RgbImage) -> Self {
        Self(image)
    }

    pub fn image(&self) -> &RgbImage {
        &self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

/// Remover output with the background made transparent
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedImage(RgbaImage);

impl SegmentedImage {
    pub(crate) fn new(image: RgbaImage) -> Self {
        Self(image)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

/// Result of ingesting an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub source: (u32, u32),
    pub working: (u32, u32),
}

impl IngestReport {
    pub fn downscaled(&self) -> bool {
        self.source != self.working
    }
}

/// Result of a successful segmentation
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentReport {
    pub elapsed: Duration,
    pub estimate: Duration,
    pub dimensions: (u32, u32),
    pub memory_warning: Option<String>,
}

/// Encoded PNG ready for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub filename: String,
}

impl ExportArtifact {
    pub const MIME: &'static str = "image/png";

    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }

    /// One-line description for display next to the download
    pub fn summary(&self) -> String {
        format!(
            "Output dimensions: {}x{} px | Estimated file size: {:.2} KB",
            self.width,
            self.height,
            self.size_kb()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_uses_two_decimals() {
        let artifact = ExportArtifact {
            bytes: vec![0; 1536],
            width: 500,
            height: 250,
            filename: "a.png".into(),
        };
        assert_eq!(
            artifact.summary(),
            "Output dimensions: 500x250 px | Estimated file size: 1.50 KB"
        );
    }

    #[test]
    fn ingest_report_flags_downscale() {
        let report = IngestReport {
            source: (2000, 1000),
            working: (1000, 500),
        };
        assert!(report.downscaled());
    }
}
