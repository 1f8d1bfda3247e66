use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Entity already exists: {entity_type} with id {id}")]
    AlreadyExists { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// The synthetic "All Photos" album cannot be modified
    #[error("Album is reserved: {0}")]
    ReservedAlbum(String),

    #[error("Tag cannot be empty")]
    EmptyTag,

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl LibraryError {
    /// Short message suitable for a transient on-screen notice.
    pub fn user_message(&self) -> String {
        match self {
            LibraryError::AlreadyExists { entity_type, .. } if entity_type == "Tag" => {
                "Tag already exists".to_string()
            }
            LibraryError::AlreadyExists { entity_type, .. } if entity_type == "Photo" => {
                "Photo already in album".to_string()
            }
            LibraryError::AlreadyExists { .. } => "Invalid or duplicate name".to_string(),
            LibraryError::InvalidInput { field, .. } if field == "name" => {
                "Invalid or duplicate name".to_string()
            }
            LibraryError::InvalidInput { message, .. } => message.clone(),
            LibraryError::ReservedAlbum(name) => format!("Cannot rename '{}'", name),
            LibraryError::EmptyTag => "Tag cannot be empty".to_string(),
            LibraryError::NotFound { entity_type, id } => format!("{} not found: {}", entity_type, id),
            LibraryError::Bridge(BridgeError::PermissionDenied(_)) => {
                "Permission denied. Cannot load images.".to_string()
            }
            LibraryError::Database(_) | LibraryError::Bridge(_) | LibraryError::Migration(_) => {
                "Storage error, please try again".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
