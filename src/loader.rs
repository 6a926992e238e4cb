//! Loaded mods and calls into their entry points.

use std::any::Any;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use crate::abi::{
    EventFn, HookKind, HostContext, InitializeFn, ShutdownFn, WorldOpenFn, CONTENT_LOAD_SYMBOL,
    ENGINE_SHUTDOWN_SYMBOL, INITIALIZE_SYMBOL, SHUTDOWN_SYMBOL, WORLD_CLOSED_SYMBOL,
    WORLD_OPEN_SYMBOL,
};
use crate::error::{ModError, Result};
use crate::host::LifecycleEvent;
use crate::info::ModInfo;
use crate::library::LibraryHandle;
use crate::logger::ModLogger;

/// Entry points resolved from a mod library. `None` means not exported.
#[derive(Default, Clone, Copy)]
pub struct EntryPoints {
    pub initialize: Option<InitializeFn>,
    pub shutdown: Option<ShutdownFn>,
    pub on_world_open: Option<WorldOpenFn>,
    pub on_world_closed: Option<EventFn>,
    pub on_content_load: Option<EventFn>,
    pub on_engine_shutdown: Option<EventFn>,
}

impl EntryPoints {
    /// Resolve every known entry point from `library`.
    ///
    /// # Safety
    /// Each exported symbol must have the signature declared in [`crate::abi`].
    pub unsafe fn resolve(library: &LibraryHandle) -> Self {
        Self {
            initialize: lookup(library, INITIALIZE_SYMBOL),
            shutdown: lookup(library, SHUTDOWN_SYMBOL),
            on_world_open: lookup(library, WORLD_OPEN_SYMBOL),
            on_world_closed: lookup(library, WORLD_CLOSED_SYMBOL),
            on_content_load: lookup(library, CONTENT_LOAD_SYMBOL),
            on_engine_shutdown: lookup(library, ENGINE_SHUTDOWN_SYMBOL),
        }
    }

    /// Whether the mod exports the given lifecycle hook.
    pub fn has_hook(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::WorldOpen => self.on_world_open.is_some(),
            HookKind::WorldClosed => self.on_world_closed.is_some(),
            HookKind::ContentLoad => self.on_content_load.is_some(),
            HookKind::EngineShutdown => self.on_engine_shutdown.is_some(),
        }
    }
}

impl std::fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryPoints")
            .field("initialize", &self.initialize.is_some())
            .field("shutdown", &self.shutdown.is_some())
            .field("on_world_open", &self.on_world_open.is_some())
            .field("on_world_closed", &self.on_world_closed.is_some())
            .field("on_content_load", &self.on_content_load.is_some())
            .field("on_engine_shutdown", &self.on_engine_shutdown.is_some())
            .finish()
    }
}

/// Look up a symbol and reinterpret its address as the function type `F`.
///
/// # Safety
/// `F` must be a function pointer type matching the exported symbol.
pub(crate) unsafe fn lookup<F: Copy>(library: &LibraryHandle, name: &str) -> Option<F> {
    let ptr = library.symbol(name)?;
    debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<*const c_void>());
    Some(std::mem::transmute_copy::<*const c_void, F>(&ptr))
}

/// Run a call into mod code, converting a panic into [`ModError::ForeignFault`].
pub(crate) fn contain<R>(
    logger: &dyn ModLogger,
    name: &str,
    entry_point: &'static str,
    call: impl FnOnce() -> R,
) -> Result<R> {
    panic::catch_unwind(AssertUnwindSafe(call)).map_err(|payload| {
        let err = ModError::ForeignFault {
            name: name.to_string(),
            entry_point,
            message: panic_message(payload.as_ref()),
        };
        logger.error(&err.to_string());
        err
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown fault".to_string()
    }
}

/// A mod whose library is open.
///
/// Owns its [`LibraryHandle`]. A mod that is dropped while initialized is shut
/// down first, then its library is released.
pub struct LoadedMod {
    library: LibraryHandle,
    info: ModInfo,
    entry_points: EntryPoints,
    logger: Arc<dyn ModLogger>,
    initialized: bool,
}

impl LoadedMod {
    /// Wrap an opened library and the entry points resolved from it.
    ///
    /// # Safety
    ///
    /// Every entry point must be a function of the declared type exported by
    /// `library`, as produced by [`EntryPoints::resolve`]. They are called for
    /// as long as the mod lives.
    ///
    /// ```compile_fail
    /// use std::sync::Arc;
    /// use lib_mod_loader::{EntryPoints, LibraryHandle, LoadedMod, ModInfo, TracingLogger};
    ///
    /// fn wrap(library: LibraryHandle) -> LoadedMod {
    ///     LoadedMod::new(
    ///         library,
    ///         ModInfo::fallback("a.so"),
    ///         EntryPoints::default(),
    ///         Arc::new(TracingLogger),
    ///     )
    /// }
    /// ```
    pub unsafe fn new(
        library: LibraryHandle,
        info: ModInfo,
        entry_points: EntryPoints,
        logger: Arc<dyn ModLogger>,
    ) -> Self {
        Self {
            library,
            info,
            entry_points,
            logger,
            initialized: false,
        }
    }

    /// Get the mod descriptor.
    pub fn info(&self) -> &ModInfo {
        &self.info
    }

    /// Path of the mod library.
    pub fn path(&self) -> &Path {
        self.library.path()
    }

    pub fn entry_points(&self) -> &EntryPoints {
        &self.entry_points
    }

    pub fn has_hook(&self, kind: HookKind) -> bool {
        self.entry_points.has_hook(kind)
    }

    /// Check if initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialize the mod.
    ///
    /// Does nothing if already initialized. Failures are logged and returned;
    /// a panic in the mod is contained.
    pub fn initialize(&mut self, host: HostContext<'_>) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        let Some(init) = self.entry_points.initialize else {
            let err = ModError::MissingEntryPoint {
                path: self.path().to_path_buf(),
                symbol: INITIALIZE_SYMBOL,
            };
            self.logger.error(&err.to_string());
            return Err(err);
        };

        self.logger.info(&format!("initializing mod: {}", self.info.name));
        // Safety: `init` came from the library this mod still holds open.
        let code = contain(&*self.logger, &self.info.name, INITIALIZE_SYMBOL, || unsafe {
            init(host.as_ptr())
        })?;

        if code != 0 {
            let err = ModError::InitializationFailed {
                name: self.info.name.clone(),
                code,
            };
            self.logger.error(&err.to_string());
            return Err(err);
        }

        self.initialized = true;
        Ok(())
    }

    /// Shut the mod down.
    ///
    /// Does nothing unless initialized. The mod counts as shut down afterwards
    /// even if its `mod_shutdown` faulted.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }

        if let Some(shutdown) = self.entry_points.shutdown {
            self.logger.info(&format!("shutting down mod: {}", self.info.name));
            // Safety: see `initialize`.
            let _ = contain(&*self.logger, &self.info.name, SHUTDOWN_SYMBOL, || unsafe {
                shutdown()
            });
        }

        self.initialized = false;
    }

    /// Shut down and release the library, reporting unload failures.
    pub fn close(mut self) -> Result<()> {
        self.shutdown();
        self.library.close()
    }

    /// Deliver a lifecycle event.
    ///
    /// Returns `true` if the mod exports the hook and it ran to completion.
    pub(crate) fn dispatch(&self, event: &LifecycleEvent<'_>) -> bool {
        if !self.initialized {
            return false;
        }

        let entry_point = event.hook().symbol();
        match *event {
            LifecycleEvent::WorldOpen {
                world,
                local_player,
            } => {
                let Some(hook) = self.entry_points.on_world_open else {
                    return false;
                };
                // Safety: see `initialize`.
                contain(&*self.logger, &self.info.name, entry_point, || unsafe {
                    hook(world.as_ptr(), local_player)
                })
                .is_ok()
            }
            LifecycleEvent::WorldClosed => {
                self.run_event(self.entry_points.on_world_closed, entry_point)
            }
            LifecycleEvent::ContentLoad => {
                self.run_event(self.entry_points.on_content_load, entry_point)
            }
            LifecycleEvent::EngineShutdown => {
                self.run_event(self.entry_points.on_engine_shutdown, entry_point)
            }
        }
    }

    fn run_event(&self, hook: Option<EventFn>, entry_point: &'static str) -> bool {
        let Some(hook) = hook else {
            return false;
        };
        // Safety: see `initialize`.
        contain(&*self.logger, &self.info.name, entry_point, || unsafe { hook() }).is_ok()
    }
}

impl Drop for LoadedMod {
    fn drop(&mut self) {
        if self.initialized {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for LoadedMod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedMod")
            .field("info", &self.info)
            .field("library", &self.library)
            .field("entry_points", &self.entry_points)
            .field("initialized", &self.initialized)
            .finish()
    }
}
