//! Host-side loader for natively compiled mods.
//!
//! Mods are shared libraries (`.so`, `.dll`, `.dylib`) placed directly in a
//! mods directory. Each exports `mod_initialize` and, optionally,
//! `mod_get_info`, `mod_shutdown` and lifecycle hooks (see [`abi`]). The host
//! loads and initializes them, forwards lifecycle events, and shuts them down
//! in reverse load order.
//!
//! Loading a mod runs its code with the full privileges of the host process.
//!
//! # Example
//!
//! ```rust,no_run
//! use lib_mod_loader::{HostContext, ModHost, ModLoaderConfig, WorldHandle};
//!
//! struct Engine;
//! struct Level;
//!
//! let mut engine = Engine;
//! let mut host = ModHost::with_config(ModLoaderConfig::new("./res/mods"));
//!
//! let loaded = host.load_configured(HostContext::new(&mut engine));
//! println!("{} ({} mods)", lib_mod_loader::version_label(), loaded);
//!
//! host.broadcast_content_load();
//!
//! let mut level = Level;
//! host.broadcast_world_open(WorldHandle::new(&mut level), 1);
//! host.broadcast_world_closed();
//!
//! host.broadcast_engine_shutdown();
//! host.unload_all();
//! ```

pub mod abi;
mod config;
mod error;
mod fs;
mod host;
mod info;
mod library;
mod loader;
mod logger;

#[cfg(test)]
mod test_support;

pub use abi::{version_label, HookKind, HostContext, RawModInfo, WorldHandle, LOADER_VERSION};
pub use config::*;
pub use error::*;
pub use fs::*;
pub use host::*;
pub use info::*;
pub use library::*;
pub use loader::{EntryPoints, LoadedMod};
pub use logger::*;
