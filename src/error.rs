//! # Error Handling
//!
//! Crate-wide error type built with `thiserror`. Rendering failures keep
//! their own type so callers can tell an unavailable layout engine apart
//! from bad input or storage problems.

use thiserror::Error;

/// Failure of the external graph rendering engine.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The renderer executable could not be started
    #[error("could not start renderer `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The renderer ran but reported an error
    #[error("renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// Piping the description in or the image out failed
    #[error("renderer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main error type for pixel-art operations
#[derive(Error, Debug)]
pub enum PixelError {
    /// I/O errors (database directory, image file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed figure document
    #[error("Invalid figure: {message}")]
    Figure { message: String },

    /// Malformed user list document
    #[error("Invalid user list: {message}")]
    Roster { message: String },

    /// Color string that is not `#RRGGBB`
    #[error("Invalid color: {message}")]
    Color { message: String },

    /// Gallery file could not be encoded or decoded
    #[error("Storage error: {message}")]
    Store { message: String },

    #[error("Image {id} not found")]
    NotFound { id: String },

    #[error("User {id} not found")]
    UserNotFound { id: String },

    #[error("Image {id} has already been edited")]
    AlreadyEdited { id: String },

    #[error("Unsupported filter: {name}")]
    UnsupportedFilter { name: String },

    /// Credential or session problems
    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
}

/// Type alias for Results using PixelError
pub type Result<T> = std::result::Result<T, PixelError>;

impl PixelError {
    pub fn figure(message: impl Into<String>) -> Self {
        Self::Figure {
            message: message.into(),
        }
    }

    pub fn roster(message: impl Into<String>) -> Self {
        Self::Roster {
            message: message.into(),
        }
    }

    pub fn color(message: impl Into<String>) -> Self {
        Self::Color {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}
