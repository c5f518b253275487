use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapperError {
    #[cfg(feature = "image")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Nothing to map")]
    Empty,
    #[error("Invalid request #{index}: {width}x{height} (width and height must be non-zero)")]
    InvalidRequest { index: usize, width: u32, height: u32 },
    #[error("Zero-sized rectangle {width}x{height}")]
    ZeroSized { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The widest request can never fit under the canvas width ceiling.
    #[error("Cannot group images: widest image is {widest}px, maximum canvas width is {max_width}px")]
    Ungroupable { widest: u32, max_width: u32 },
    #[error("Input too large: {0}")]
    TooLarge(String),
    #[error("Search finished without producing an atlas")]
    NoAtlas,
}

pub type Result<T> = std::result::Result<T, MapperError>;
