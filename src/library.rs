//! Native library handles.
//!
//! Opening goes through a [`LibraryProvider`] so the host can substitute the
//! platform loader. [`LibraryHandle`] is the single owner of an opened library
//! and releases it exactly once.

use std::ffi::{c_void, OsStr};
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use crate::error::{ModError, Result};

/// An opened native library.
///
/// # Safety
///
/// The loader casts every address returned by [`symbol`](Self::symbol) to the
/// entry-point type that [`abi`](crate::abi) declares for that name and calls
/// it. An implementation must only return addresses of functions with exactly
/// that signature, and they must stay valid until [`close`](Self::close).
///
/// A safe implementation is rejected:
///
/// ```compile_fail
/// use std::ffi::c_void;
/// use lib_mod_loader::DynamicLibrary;
///
/// struct Lying;
///
/// impl DynamicLibrary for Lying {
///     fn symbol(&self, _name: &str) -> Option<*const c_void> {
///         Some(0x10 as *const c_void)
///     }
///
///     fn close(self: Box<Self>) -> Result<(), String> {
///         Ok(())
///     }
/// }
/// ```
pub unsafe trait DynamicLibrary {
    /// Address of an exported symbol, or `None` if it is not exported.
    fn symbol(&self, name: &str) -> Option<*const c_void>;

    /// Release the library, returning the platform diagnostic on failure.
    fn close(self: Box<Self>) -> std::result::Result<(), String>;
}

/// Opens native libraries.
///
/// # Safety
///
/// Every library returned by [`open`](Self::open) must uphold the
/// [`DynamicLibrary`] contract.
///
/// ```compile_fail
/// use std::path::Path;
/// use lib_mod_loader::{DynamicLibrary, LibraryProvider, Result};
///
/// struct Provider;
///
/// impl LibraryProvider for Provider {
///     fn open(&self, path: &Path) -> Result<Box<dyn DynamicLibrary>> {
///         unimplemented!("{}", path.display())
///     }
/// }
/// ```
pub unsafe trait LibraryProvider {
    /// Open the library at `path`.
    ///
    /// Fails with [`ModError::LibraryOpen`] carrying the platform diagnostic.
    fn open(&self, path: &Path) -> Result<Box<dyn DynamicLibrary>>;
}

/// Provider backed by the platform loader (`dlopen` / `LoadLibrary`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLibraryProvider;

// Safety: symbols come from the platform loader; matching the declared
// signatures is the mod author's side of the ABI.
unsafe impl LibraryProvider for NativeLibraryProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn DynamicLibrary>> {
        // Safety: running the library's initializers is the point of loading a
        // mod; mods are trusted with host privileges.
        let library = unsafe { Library::new(path) }.map_err(|e| ModError::LibraryOpen {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Box::new(NativeLibrary(library)))
    }
}

struct NativeLibrary(Library);

unsafe impl DynamicLibrary for NativeLibrary {
    fn symbol(&self, name: &str) -> Option<*const c_void> {
        // The symbol is only read as an address here; callers give it a type.
        let symbol: Symbol<*const c_void> = unsafe { self.0.get(name.as_bytes()) }.ok()?;
        let ptr = *symbol;
        (!ptr.is_null()).then_some(ptr)
    }

    fn close(self: Box<Self>) -> std::result::Result<(), String> {
        self.0.close().map_err(|e| e.to_string())
    }
}

/// Exclusive owner of one opened library.
///
/// Not `Clone`: two owners of one OS handle would close it twice. The library
/// is released by [`close`](Self::close) or on drop, whichever comes first.
pub struct LibraryHandle {
    path: PathBuf,
    library: Option<Box<dyn DynamicLibrary>>,
}

impl LibraryHandle {
    /// Take ownership of an opened library.
    pub fn new(path: impl Into<PathBuf>, library: Box<dyn DynamicLibrary>) -> Self {
        Self {
            path: path.into(),
            library: Some(library),
        }
    }

    /// Open `path` through `provider`.
    pub fn open(provider: &dyn LibraryProvider, path: &Path) -> Result<Self> {
        let library = provider.open(path)?;
        Ok(Self::new(path, library))
    }

    /// Path the library was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.library.is_some()
    }

    /// Look up an exported symbol. Always `None` once closed.
    pub fn symbol(&self, name: &str) -> Option<*const c_void> {
        self.library.as_ref()?.symbol(name)
    }

    /// Release the library. Does nothing if already closed.
    pub fn close(&mut self) -> Result<()> {
        match self.library.take() {
            Some(library) => library.close().map_err(|message| ModError::LibraryClose {
                path: self.path.clone(),
                message,
            }),
            None => Ok(()),
        }
    }
}

impl Drop for LibraryHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(component = "modding", "{}", e);
        }
    }
}

impl std::fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

/// File suffix of native libraries on the target platform.
pub fn library_extension() -> &'static str {
    if cfg!(windows) {
        ".dll"
    } else if cfg!(target_os = "macos") {
        ".dylib"
    } else {
        ".so"
    }
}

/// Case-sensitive suffix match against a library extension.
///
/// Compares raw OS bytes, so file names that are not valid UTF-8 still match.
pub fn has_library_extension(file_name: impl AsRef<OsStr>, extension: &str) -> bool {
    file_name
        .as_ref()
        .as_encoded_bytes()
        .ends_with(extension.as_bytes())
}
