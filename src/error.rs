// Crate error type. Every variant states *where* things went wrong.
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Creating the window failed.
    #[error("window init error: {0}")]
    WindowInit(String),

    /// Pushing the pixel buffer to the window failed.
    #[error("window update error: {0}")]
    WindowUpdate(String),

    /// Decoding a photo failed (recovered with a placeholder by the loader).
    #[error("image load error ({path}): {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Reading or parsing the tuning profile failed.
    #[error("config error: {0}")]
    Config(String),

    /// Two buffers that must share dimensions did not.
    #[error("surface error: {0}")]
    Surface(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(Error::config("x").to_string().contains("config error:"));
        assert!(Error::surface("x").to_string().contains("surface error:"));
        assert!(
            Error::WindowInit("x".into())
                .to_string()
                .contains("window init error:")
        );
    }

    #[test]
    fn image_load_names_the_path() {
        let err = Error::ImageLoad {
            path: PathBuf::from("images/cover.jpg"),
            source: image::ImageError::IoError(std::io::Error::other("missing")),
        };
        let msg = err.to_string();
        assert!(msg.contains("images/cover.jpg"));
        assert!(msg.contains("missing"));
    }
}
