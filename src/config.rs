//! Mod loader configuration.

use std::path::PathBuf;

use crate::library::library_extension;

/// Configuration for the mod host.
#[derive(Debug, Clone)]
pub struct ModLoaderConfig {
    /// Directory scanned for mod libraries
    pub mods_dir: PathBuf,

    /// File suffix a mod library must have (including the dot)
    pub extension: String,

    /// Whether configured loading runs at all
    pub enabled: bool,
}

impl ModLoaderConfig {
    /// Create a configuration for a mods directory.
    pub fn new(mods_dir: impl Into<PathBuf>) -> Self {
        Self {
            mods_dir: mods_dir.into(),
            extension: library_extension().to_string(),
            enabled: true,
        }
    }

    /// Set the mods directory.
    pub fn with_mods_dir(mut self, mods_dir: impl Into<PathBuf>) -> Self {
        self.mods_dir = mods_dir.into();
        self
    }

    /// Override the library suffix.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Enable or disable configured loading.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Ensure the mods directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.mods_dir)
    }
}

impl Default for ModLoaderConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(data_dir.join("mods"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ModLoaderConfig::default();
        assert!(config.mods_dir.ends_with("mods"));
        assert_eq!(config.extension, library_extension());
        assert!(config.enabled);
    }

    #[test]
    fn test_builders() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModLoaderConfig::default()
            .with_mods_dir(dir.path().join("res/mods"))
            .with_extension(".mod")
            .enabled(false);

        assert_eq!(config.extension, ".mod");
        assert!(!config.enabled);

        config.ensure_dirs().unwrap();
        assert!(config.mods_dir.is_dir());
    }
}
