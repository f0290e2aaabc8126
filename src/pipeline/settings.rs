use crate::error::{PipelineError, Result};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_FILENAME: &str = "background_removed.png";
pub const DEFAULT_SCALE_PERCENT: u8 = 100;
pub const DEFAULT_QUALITY: u8 = 95;

/// What to put behind the cut-out foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundFill {
    #[default]
    Transparent,
    White,
}

impl fmt::Display for BackgroundFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transparent => f.write_str("Transparent"),
            Self::White => f.write_str("White"),
        }
    }
}

impl FromStr for BackgroundFill {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "transparent" => Ok(Self::Transparent),
            "white" => Ok(Self::White),
            other => Err(PipelineError::InvalidSettings(format!(
                "unknown background fill '{other}', expected Transparent or White"
            ))),
        }
    }
}

/// Post-processing choices for one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub background: BackgroundFill,
    pub scale_percent: u8,
    pub quality: u8,
    pub filename: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            background: BackgroundFill::default(),
            scale_percent: DEFAULT_SCALE_PERCENT,
            quality: DEFAULT_QUALITY,
            filename: DEFAULT_FILENAME.to_string(),
        }
    }
}

impl OutputSettings {
    /// Validated settings. Scale must be 10..=100 in steps of 10, quality
    /// 10..=100 in steps of 5. The filename is coerced to a `.png` name.
    pub fn new(
        background: BackgroundFill,
        scale_percent: u8,
        quality: u8,
        filename: &str,
    ) -> Result<Self> {
        let settings = Self {
            background,
            scale_percent,
            quality,
            filename: coerce_png_filename(filename),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        check_stepped("output size", self.scale_percent, 10)?;
        check_stepped("output quality", self.quality, 5)?;
        Ok(())
    }

    /// Scale as a factor in (0, 1]
    pub fn scale_factor(&self) -> f64 {
        self.scale_percent as f64 / 100.0
    }
}

fn check_stepped(label: &str, value: u8, step: u8) -> Result<()> {
    if !(10..=100).contains(&value) || value % step != 0 {
        return Err(PipelineError::InvalidSettings(format!(
            "{label} must be between 10 and 100 in steps of {step}, got {value}"
        )));
    }
    Ok(())
}

/// Make sure a download name ends in `.png`.
///
/// The suffix check is case-insensitive, so `Result.PNG` is kept as-is.
/// A blank name falls back to the default.
pub fn coerce_png_filename(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return DEFAULT_FILENAME.to_string();
    }
    if name.to_ascii_lowercase().ends_with(".png") {
        name.to_string()
    } else {
        format!("{name}.png")
    }
}
