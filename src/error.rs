//! Error types for mod loading operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or running a mod.
#[derive(Debug, Error)]
pub enum ModError {
    /// The path service could not resolve the mod path
    #[error("Failed to resolve mod path {path:?}: {source}")]
    PathResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The platform loader rejected the library
    #[error("Failed to load library {path:?}: {message}")]
    LibraryOpen { path: PathBuf, message: String },

    /// The platform loader failed to unload the library
    #[error("Failed to unload library {path:?}: {message}")]
    LibraryClose { path: PathBuf, message: String },

    /// A required entry point is not exported
    #[error("{symbol} function not found in: {path:?}")]
    MissingEntryPoint { path: PathBuf, symbol: &'static str },

    /// The initialize entry point reported failure
    #[error("Mod {name} failed to initialize (code {code})")]
    InitializationFailed { name: String, code: i32 },

    /// An entry point panicked and the fault was contained
    #[error("Mod {name} faulted in {entry_point}: {message}")]
    ForeignFault {
        name: String,
        entry_point: &'static str,
        message: String,
    },

    /// Enumerating the mods directory failed
    #[error("Error scanning mods directory {path:?}: {source}")]
    DirectoryScan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for mod loading operations
pub type Result<T> = std::result::Result<T, ModError>;
