use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One rejected configuration option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub option: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "option {} invalid value {:?}, expected {}",
            self.option, self.value, self.expected
        )
    }
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum SheetPackerError {
    #[error("Invalid configuration: {}", join_issues(.0))]
    InvalidConfig(Vec<ConfigIssue>),
    #[error("No images found in {location}")]
    NoInput { location: String },
    #[error(
        "Sheet {file} is {width}x{height} px which does not divide into a {columns}x{rows} grid"
    )]
    Geometry {
        file: String,
        width: u32,
        height: u32,
        columns: u32,
        rows: u32,
    },
    #[error(
        "Cannot fit all images in one {max_width}x{max_height} texture with current options ({placed}/{total} placed)"
    )]
    FitFailure {
        placed: usize,
        total: usize,
        max_width: u32,
        max_height: u32,
    },
    #[error("Frame name {name} is produced by more than one image")]
    DuplicateFrame { name: String },
    #[error("Animation {name} is produced by both {first} and {second}")]
    DuplicateAnimation {
        name: String,
        first: String,
        second: String,
    },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Image error on {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("No image data available for {}", .path.display())]
    MissingSource { path: PathBuf },
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Manifest serialization error: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl SheetPackerError {
    /// True for failures raised by an injected image or filesystem service.
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Image { .. } | Self::MissingSource { .. } | Self::Encode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SheetPackerError>;
