use std::path::PathBuf;

/// Errors raised by the layers around the tree generator.
///
/// The generator itself never fails: degenerate metrics are clamped and a
/// zero-sized container defers drawing. Everything that touches files,
/// encoders or external processes reports through this type.
#[derive(Debug, thiserror::Error)]
pub enum BloomError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid activity JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid style file: {0}")]
    Toml(#[from] toml::de::Error),

    /// A style file that parsed but holds an unusable value.
    #[error("invalid style setting {field}: {reason}")]
    Style { field: &'static str, reason: String },

    #[error("PNG encoding failed for {}: {reason}", .path.display())]
    Png { path: PathBuf, reason: String },

    /// tiny-skia refused to allocate a pixmap of this size.
    #[error("cannot allocate a {width}x{height} drawing surface")]
    Surface { width: u32, height: u32 },

    #[error("video encoder error: {0}")]
    Encoder(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BloomError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn surface_error_names_dimensions() {
        let err = BloomError::Surface {
            width: 0,
            height: 300,
        };
        assert_eq!(err.to_string(), "cannot allocate a 0x300 drawing surface");
    }

    #[test]
    fn style_error_names_the_field() {
        let err = BloomError::Style {
            field: "growth_speed",
            reason: "must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid style setting growth_speed: must be positive"
        );
    }
}
