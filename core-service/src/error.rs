use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Slideshow error: {0}")]
    Slideshow(#[from] core_slideshow::SlideshowError),

    #[error("Search query is empty")]
    EmptySearch,

    #[error("No user album is selected")]
    NoCurrentAlbum,
}

impl CoreError {
    /// Short message suitable for a transient on-screen notice.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Library(e) => e.user_message(),
            CoreError::Slideshow(e) => e.user_message(),
            CoreError::EmptySearch => "Please enter a search term".to_string(),
            CoreError::NoCurrentAlbum => "Select an album to add photos".to_string(),
            CoreError::InitializationFailed(_) | CoreError::Runtime(_) => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
