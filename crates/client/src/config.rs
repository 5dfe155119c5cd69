use worldsim_render::Surface;

use crate::error::ClientError;

/// Element id of the drawing surface.
pub const SURFACE_ELEMENT: &str = "world";

/// Client configuration, filled from command-line arguments by the binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Address of the snapshot source.
    pub server: String,
    /// Id of the drawing surface element.
    pub surface_element: String,
    /// Surface width in pixels.
    pub surface_width: u32,
    /// Surface height in pixels.
    pub surface_height: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        // The simulated world is 100x100 cells at 5 px per cell.
        Self {
            server: "127.0.0.1:5000".into(),
            surface_element: SURFACE_ELEMENT.into(),
            surface_width: 500,
            surface_height: 500,
        }
    }
}

impl ClientConfig {
    /// Create the drawing surface this configuration describes.
    pub fn build_surface(&self) -> Result<Surface, ClientError> {
        if self.surface_element.trim().is_empty() {
            return Err(ClientError::MissingElement(self.surface_element.clone()));
        }
        Surface::new(self.surface_width, self.surface_height).map_err(|source| {
            ClientError::Surface {
                element: self.surface_element.clone(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_world() {
        let config = ClientConfig::default();
        assert_eq!(config.surface_element, "world");
        let surface = config.build_surface().unwrap();
        assert_eq!((surface.width(), surface.height()), (500, 500));
    }

    #[test]
    fn empty_element_is_missing() {
        let config = ClientConfig {
            surface_element: "  ".into(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.build_surface(),
            Err(ClientError::MissingElement(_))
        ));
    }

    #[test]
    fn zero_size_is_rejected() {
        let config = ClientConfig {
            surface_width: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.build_surface(),
            Err(ClientError::Surface { .. })
        ));
    }
}
