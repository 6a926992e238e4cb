//! The binary contract between the host and a mod library.
//!
//! A mod is a native library exporting some of the symbols below with
//! `#[no_mangle]`. Only [`INITIALIZE_SYMBOL`] is required. Every entry point
//! uses the `"C-unwind"` calling convention so a panic inside a mod unwinds back
//! into the host, where it is contained and logged.
//!
//! ```rust,ignore
//! use std::ffi::c_void;
//! use lib_mod_loader::RawModInfo;
//!
//! static INFO: RawModInfo = RawModInfo::new(c"My First Mod", c"1.0.0", c"Someone", c"My first mod!");
//!
//! #[no_mangle]
//! pub extern "C-unwind" fn mod_get_info() -> RawModInfo {
//!     INFO
//! }
//!
//! #[no_mangle]
//! pub extern "C-unwind" fn mod_initialize(_host: *mut c_void) -> i32 {
//!     println!("Hello from my first mod!");
//!     0
//! }
//! ```

use std::ffi::{c_char, c_void, CStr};
use std::marker::PhantomData;

/// Version of the loader itself, for display.
pub const LOADER_VERSION: &str = "0.2.1";

/// Text a host shows to identify the loader (e.g. in a version label).
pub fn version_label() -> String {
    format!("Mod Loader v{}", LOADER_VERSION)
}

pub const GET_INFO_SYMBOL: &str = "mod_get_info";
pub const INITIALIZE_SYMBOL: &str = "mod_initialize";
pub const SHUTDOWN_SYMBOL: &str = "mod_shutdown";
pub const WORLD_OPEN_SYMBOL: &str = "mod_on_world_open";
pub const WORLD_CLOSED_SYMBOL: &str = "mod_on_world_closed";
pub const CONTENT_LOAD_SYMBOL: &str = "mod_on_content_load";
pub const ENGINE_SHUTDOWN_SYMBOL: &str = "mod_on_engine_shutdown";

/// `mod_get_info`
pub type GetInfoFn = unsafe extern "C-unwind" fn() -> RawModInfo;
/// `mod_initialize`; returns 0 on success.
pub type InitializeFn = unsafe extern "C-unwind" fn(host: *mut c_void) -> i32;
/// `mod_shutdown`
pub type ShutdownFn = unsafe extern "C-unwind" fn();
/// `mod_on_world_open`
pub type WorldOpenFn = unsafe extern "C-unwind" fn(world: *mut c_void, local_player: i64);
/// Argument-less lifecycle hooks.
pub type EventFn = unsafe extern "C-unwind" fn();

/// Mod descriptor as it crosses the library boundary.
///
/// Each field is a nul-terminated string owned by the mod, or null.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawModInfo {
    pub name: *const c_char,
    pub version: *const c_char,
    pub author: *const c_char,
    pub description: *const c_char,
}

impl RawModInfo {
    /// Build a descriptor from static strings.
    pub const fn new(
        name: &'static CStr,
        version: &'static CStr,
        author: &'static CStr,
        description: &'static CStr,
    ) -> Self {
        Self {
            name: name.as_ptr(),
            version: version.as_ptr(),
            author: author.as_ptr(),
            description: description.as_ptr(),
        }
    }
}

// Descriptors built with `new` only point at immutable statics.
unsafe impl Sync for RawModInfo {}

/// Optional lifecycle hooks a mod may export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    WorldOpen,
    WorldClosed,
    ContentLoad,
    EngineShutdown,
}

impl HookKind {
    /// Exported symbol name for this hook.
    pub fn symbol(self) -> &'static str {
        match self {
            HookKind::WorldOpen => WORLD_OPEN_SYMBOL,
            HookKind::WorldClosed => WORLD_CLOSED_SYMBOL,
            HookKind::ContentLoad => CONTENT_LOAD_SYMBOL,
            HookKind::EngineShutdown => ENGINE_SHUTDOWN_SYMBOL,
        }
    }
}

/// Opaque reference to the host application, handed to `mod_initialize`.
///
/// The loader never looks behind the pointer.
#[derive(Debug, Clone, Copy)]
pub struct HostContext<'a> {
    ptr: *mut c_void,
    _host: PhantomData<&'a mut c_void>,
}

impl<'a> HostContext<'a> {
    /// Borrow a host object for the duration of the calls made with it.
    pub fn new<T>(host: &'a mut T) -> Self {
        Self {
            ptr: (host as *mut T).cast(),
            _host: PhantomData,
        }
    }

    /// Wrap a raw pointer.
    ///
    /// # Safety
    /// The pointer must be valid for whatever mods do with it while the
    /// context is in use.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Self {
        Self {
            ptr,
            _host: PhantomData,
        }
    }

    /// A context carrying no host object.
    pub fn null() -> HostContext<'static> {
        HostContext {
            ptr: std::ptr::null_mut(),
            _host: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr
    }
}

/// Opaque reference to the world (level) being opened.
#[derive(Debug, Clone, Copy)]
pub struct WorldHandle<'a> {
    ptr: *mut c_void,
    _world: PhantomData<&'a mut c_void>,
}

impl<'a> WorldHandle<'a> {
    pub fn new<T>(world: &'a mut T) -> Self {
        Self {
            ptr: (world as *mut T).cast(),
            _world: PhantomData,
        }
    }

    /// # Safety
    /// Same contract as [`HostContext::from_raw`].
    pub unsafe fn from_raw(ptr: *mut c_void) -> Self {
        Self {
            ptr,
            _world: PhantomData,
        }
    }

    pub fn null() -> WorldHandle<'static> {
        WorldHandle {
            ptr: std::ptr::null_mut(),
            _world: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr
    }
}
