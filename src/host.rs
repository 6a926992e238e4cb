//! Main mod host implementation.
//!
//! [`ModHost`] owns every successfully loaded mod in load order. It is used from
//! a single thread: loading, event delivery and unloading all run mod code
//! synchronously on the caller's thread.
//!
//! The host application broadcasts each [`LifecycleEvent`] after its own state
//! change has completed: the world is open before `WorldOpen`, content has
//! finished loading before `ContentLoad`, the world is still valid while
//! `WorldClosed` runs, and `EngineShutdown` is sent before [`ModHost::unload_all`].

use std::path::Path;
use std::sync::Arc;

use crate::abi::{
    GetInfoFn, HookKind, HostContext, WorldHandle, GET_INFO_SYMBOL, INITIALIZE_SYMBOL,
};
use crate::config::ModLoaderConfig;
use crate::error::{ModError, Result};
use crate::fs::{ModFileSystem, StdFileSystem};
use crate::info::ModInfo;
use crate::library::{
    has_library_extension, LibraryHandle, LibraryProvider, NativeLibraryProvider,
};
use crate::loader::{contain, lookup, EntryPoints, LoadedMod};
use crate::logger::{ModLogger, TracingLogger};

/// A host event delivered to every mod exporting the matching hook.
#[derive(Debug, Clone, Copy)]
pub enum LifecycleEvent<'a> {
    /// A world was opened for `local_player`
    WorldOpen {
        world: WorldHandle<'a>,
        local_player: i64,
    },
    /// The open world is being closed
    WorldClosed,
    /// Game content finished loading
    ContentLoad,
    /// The engine is shutting down
    EngineShutdown,
}

impl LifecycleEvent<'_> {
    /// The hook this event is delivered to.
    pub fn hook(&self) -> HookKind {
        match self {
            LifecycleEvent::WorldOpen { .. } => HookKind::WorldOpen,
            LifecycleEvent::WorldClosed => HookKind::WorldClosed,
            LifecycleEvent::ContentLoad => HookKind::ContentLoad,
            LifecycleEvent::EngineShutdown => HookKind::EngineShutdown,
        }
    }
}

/// Registry of loaded mods.
pub struct ModHost {
    config: ModLoaderConfig,
    mods: Vec<LoadedMod>,
    provider: Box<dyn LibraryProvider>,
    filesystem: Box<dyn ModFileSystem>,
    logger: Arc<dyn ModLogger>,
}

impl ModHost {
    /// Create an empty host with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ModLoaderConfig::default())
    }

    /// Create an empty host with a custom configuration.
    pub fn with_config(config: ModLoaderConfig) -> Self {
        Self {
            config,
            mods: Vec::new(),
            provider: Box::new(NativeLibraryProvider),
            filesystem: Box::new(StdFileSystem),
            logger: Arc::new(TracingLogger),
        }
    }

    /// Replace the library provider.
    pub fn with_provider(mut self, provider: impl LibraryProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    /// Replace the filesystem used for path resolution and discovery.
    pub fn with_filesystem(mut self, filesystem: impl ModFileSystem + 'static) -> Self {
        self.filesystem = Box::new(filesystem);
        self
    }

    /// Replace the logger.
    pub fn with_logger(mut self, logger: Arc<dyn ModLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &ModLoaderConfig {
        &self.config
    }

    // === Loading ===

    /// Load every mod in the configured mods directory.
    pub fn load_configured(&mut self, host: HostContext<'_>) -> usize {
        if !self.config.enabled {
            self.logger.info("mod loading is disabled");
            return 0;
        }
        let mods_dir = self.config.mods_dir.clone();
        self.load_mods(&mods_dir, host)
    }

    /// Load every mod library directly inside `mods_dir`.
    ///
    /// Returns the number of mods loaded. A missing directory is not an error.
    /// One mod failing does not stop the scan; an I/O error while listing the
    /// directory does, keeping whatever loaded before it.
    pub fn load_mods(&mut self, mods_dir: &Path, host: HostContext<'_>) -> usize {
        if !self.filesystem.is_dir(mods_dir) {
            self.logger.warn(&format!("mods directory not found: {}", mods_dir.display()));
            return 0;
        }

        self.logger.info(&format!("scanning mods directory: {}", mods_dir.display()));

        let mut loaded_count = 0;
        if let Err(source) = self.scan(mods_dir, host, &mut loaded_count) {
            let err = ModError::DirectoryScan {
                path: mods_dir.to_path_buf(),
                source,
            };
            self.logger.error(&err.to_string());
        }

        self.logger.info(&format!("loaded {} mod(s)", loaded_count));
        loaded_count
    }

    fn scan(
        &mut self,
        mods_dir: &Path,
        host: HostContext<'_>,
        loaded_count: &mut usize,
    ) -> std::io::Result<()> {
        let extension = self.config.extension.clone();

        for entry in self.filesystem.read_dir(mods_dir)? {
            let path = entry?;
            let Some(file_name) = path.file_name() else {
                continue;
            };
            if !has_library_extension(file_name, &extension) || !self.filesystem.is_file(&path) {
                continue;
            }

            if self.load_mod(&path, host).is_ok() {
                *loaded_count += 1;
            }
        }

        Ok(())
    }

    /// Load, initialize and register a single mod library.
    ///
    /// On failure nothing is retained and the library is closed again.
    pub fn load_mod(&mut self, mod_path: &Path, host: HostContext<'_>) -> Result<()> {
        let loaded = self.open_mod(mod_path, host).map_err(|e| {
            // Initialization reports its own failures.
            if !matches!(
                e,
                ModError::InitializationFailed { .. } | ModError::ForeignFault { .. }
            ) {
                self.logger.error(&e.to_string());
            }
            e
        })?;

        self.logger.info(&format!("successfully loaded mod: {}", loaded.info()));
        self.mods.push(loaded);
        Ok(())
    }

    fn open_mod(&self, mod_path: &Path, host: HostContext<'_>) -> Result<LoadedMod> {
        let resolved = self
            .filesystem
            .resolve(mod_path)
            .map_err(|source| ModError::PathResolution {
                path: mod_path.to_path_buf(),
                source,
            })?;

        self.logger.info(&format!("loading mod from: {}", resolved.display()));

        let mut library = LibraryHandle::open(&*self.provider, &resolved)?;

        let file_name = mod_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| resolved.display().to_string());

        let info = match self.read_info(&library, file_name) {
            Ok(info) => info,
            Err(e) => {
                self.release(library.close());
                return Err(e);
            }
        };

        // Safety: mods export every entry point in `crate::abi` with the
        // signature declared there.
        let entry_points = unsafe { EntryPoints::resolve(&library) };
        if entry_points.initialize.is_none() {
            self.release(library.close());
            return Err(ModError::MissingEntryPoint {
                path: resolved,
                symbol: INITIALIZE_SYMBOL,
            });
        }

        // Safety: `entry_points` were resolved from `library` above.
        let mut loaded =
            unsafe { LoadedMod::new(library, info, entry_points, self.logger.clone()) };
        if let Err(e) = loaded.initialize(host) {
            self.release(loaded.close());
            return Err(e);
        }
        Ok(loaded)
    }

    fn read_info(&self, library: &LibraryHandle, file_name: String) -> Result<ModInfo> {
        // Safety: mods export `mod_get_info` with the `GetInfoFn` signature.
        match unsafe { lookup::<GetInfoFn>(library, GET_INFO_SYMBOL) } {
            Some(get_info) => {
                let raw = contain(&*self.logger, &file_name, GET_INFO_SYMBOL, || unsafe {
                    get_info()
                })?;
                // Safety: the strings belong to the library, which is still open.
                Ok(unsafe { ModInfo::from_raw(&raw, &file_name) })
            }
            None => {
                self.logger.warn(&format!(
                    "{} not found in {}, using defaults",
                    GET_INFO_SYMBOL, file_name
                ));
                Ok(ModInfo::fallback(file_name))
            }
        }
    }

    /// Log a failed library release.
    fn release(&self, closed: Result<()>) {
        if let Err(e) = closed {
            self.logger.error(&e.to_string());
        }
    }

    // === Unloading ===

    /// Shut down every mod, last loaded first, then release all libraries.
    pub fn unload_all(&mut self) {
        if self.mods.is_empty() {
            return;
        }

        self.logger.info("unloading all mods");

        for loaded in self.mods.iter_mut().rev() {
            loaded.shutdown();
        }

        while let Some(loaded) = self.mods.pop() {
            self.release(loaded.close());
        }
    }

    // === Runtime ===

    /// Loaded mods, in load order.
    pub fn mods(&self) -> &[LoadedMod] {
        &self.mods
    }

    /// Get the number of loaded mods.
    pub fn mod_count(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// First loaded mod declaring `name`. Names are not required to be unique.
    pub fn find(&self, name: &str) -> Option<&LoadedMod> {
        self.mods.iter().find(|m| m.info().name == name)
    }

    /// Deliver `event` to every mod exporting its hook, in load order.
    ///
    /// Returns how many hooks ran to completion. A fault in one mod is logged
    /// and delivery continues with the next.
    pub fn broadcast(&self, event: LifecycleEvent<'_>) -> usize {
        let mut delivered = 0;
        for loaded in &self.mods {
            if loaded.dispatch(&event) {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn broadcast_world_open(&self, world: WorldHandle<'_>, local_player: i64) -> usize {
        self.broadcast(LifecycleEvent::WorldOpen {
            world,
            local_player,
        })
    }

    pub fn broadcast_world_closed(&self) -> usize {
        self.broadcast(LifecycleEvent::WorldClosed)
    }

    pub fn broadcast_content_load(&self) -> usize {
        self.broadcast(LifecycleEvent::ContentLoad)
    }

    pub fn broadcast_engine_shutdown(&self) -> usize {
        self.broadcast(LifecycleEvent::EngineShutdown)
    }
}

impl Default for ModHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ModHost {
    fn drop(&mut self) {
        self.unload_all();
    }
}
