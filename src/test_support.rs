//! Test doubles: a counting library provider, mock mod entry points and a
//! recording logger.

use std::cell::Cell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::path::Path;
use std::rc::Rc;
use std::sync::Mutex;

use crate::abi::{
    EventFn, GetInfoFn, HookKind, InitializeFn, ShutdownFn, WorldOpenFn, GET_INFO_SYMBOL,
    INITIALIZE_SYMBOL, SHUTDOWN_SYMBOL, WORLD_OPEN_SYMBOL,
};
use crate::error::{ModError, Result};
use crate::library::{DynamicLibrary, LibraryProvider};
use crate::logger::{LogLevel, ModLogger};

/// Calls made into mock mods on the current thread.
pub mod journal {
    use std::cell::RefCell;

    thread_local! {
        static ENTRIES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    pub fn record(entry: impl Into<String>) {
        ENTRIES.with(|e| e.borrow_mut().push(entry.into()));
    }

    pub fn take() -> Vec<String> {
        ENTRIES.with(|e| std::mem::take(&mut *e.borrow_mut()))
    }

    pub fn clear() {
        ENTRIES.with(|e| e.borrow_mut().clear());
    }
}

/// Generates a module of mock entry points labelled `$label`, one function per
/// listed name.
macro_rules! mock_mod {
    ($module:ident, $label:literal, [$($entry:ident),* $(,)?]) => {
        pub mod $module {
            $( mock_mod!(@entry $label, $entry); )*
        }
    };
    (@entry $label:literal, get_info) => {
        pub extern "C-unwind" fn get_info() -> crate::abi::RawModInfo {
            crate::abi::RawModInfo {
                name: concat!("Mod ", $label, "\0").as_ptr().cast(),
                version: c"1.0.0".as_ptr(),
                author: c"Test Author".as_ptr(),
                description: concat!("Mock mod ", $label, "\0").as_ptr().cast(),
            }
        }
    };
    (@entry $label:literal, get_info_panics) => {
        pub extern "C-unwind" fn get_info_panics() -> crate::abi::RawModInfo {
            panic!("info exploded")
        }
    };
    (@entry $label:literal, init) => {
        pub extern "C-unwind" fn init(_host: *mut std::ffi::c_void) -> i32 {
            super::journal::record(concat!($label, ":init"));
            0
        }
    };
    (@entry $label:literal, init_reads_host) => {
        pub extern "C-unwind" fn init_reads_host(host: *mut std::ffi::c_void) -> i32 {
            let value = unsafe { *host.cast::<u32>() };
            super::journal::record(format!("{}:init:{}", $label, value));
            0
        }
    };
    (@entry $label:literal, init_fails) => {
        pub extern "C-unwind" fn init_fails(_host: *mut std::ffi::c_void) -> i32 {
            super::journal::record(concat!($label, ":init_fails"));
            1
        }
    };
    (@entry $label:literal, init_panics) => {
        pub extern "C-unwind" fn init_panics(_host: *mut std::ffi::c_void) -> i32 {
            panic!("init exploded")
        }
    };
    (@entry $label:literal, shutdown) => {
        pub extern "C-unwind" fn shutdown() {
            super::journal::record(concat!($label, ":shutdown"));
        }
    };
    (@entry $label:literal, shutdown_panics) => {
        pub extern "C-unwind" fn shutdown_panics() {
            panic!("shutdown exploded")
        }
    };
    (@entry $label:literal, world_open) => {
        pub extern "C-unwind" fn world_open(_world: *mut std::ffi::c_void, local_player: i64) {
            super::journal::record(format!("{}:world_open:{}", $label, local_player));
        }
    };
    (@entry $label:literal, world_closed) => {
        pub extern "C-unwind" fn world_closed() {
            super::journal::record(concat!($label, ":world_closed"));
        }
    };
    (@entry $label:literal, content_load) => {
        pub extern "C-unwind" fn content_load() {
            super::journal::record(concat!($label, ":content_load"));
        }
    };
    (@entry $label:literal, content_load_panics) => {
        pub extern "C-unwind" fn content_load_panics() {
            panic!("content exploded")
        }
    };
    (@entry $label:literal, engine_shutdown) => {
        pub extern "C-unwind" fn engine_shutdown() {
            super::journal::record(concat!($label, ":engine_shutdown"));
        }
    };
}

mock_mod!(
    mod_a,
    "A",
    [get_info, init, init_reads_host, shutdown, world_open, world_closed, content_load]
);
mock_mod!(
    mod_b,
    "B",
    [
        get_info_panics,
        init,
        init_fails,
        init_panics,
        shutdown,
        shutdown_panics,
        content_load_panics,
        engine_shutdown,
    ]
);
mock_mod!(mod_c, "C", [init, shutdown, world_open, content_load]);

/// Symbols and behavior of one mock library.
#[derive(Debug, Clone, Default)]
pub struct MockSpec {
    symbols: HashMap<&'static str, *const c_void>,
    open_error: Option<String>,
    close_error: Option<String>,
}

impl MockSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// A library the platform loader refuses to open.
    pub fn broken(message: impl Into<String>) -> Self {
        Self {
            open_error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn fail_close(mut self, message: impl Into<String>) -> Self {
        self.close_error = Some(message.into());
        self
    }

    pub fn info(self, f: GetInfoFn) -> Self {
        self.export(GET_INFO_SYMBOL, f as *const c_void)
    }

    pub fn init(self, f: InitializeFn) -> Self {
        self.export(INITIALIZE_SYMBOL, f as *const c_void)
    }

    pub fn shutdown(self, f: ShutdownFn) -> Self {
        self.export(SHUTDOWN_SYMBOL, f as *const c_void)
    }

    pub fn world_open(self, f: WorldOpenFn) -> Self {
        self.export(WORLD_OPEN_SYMBOL, f as *const c_void)
    }

    /// Export one of the argument-less hooks.
    pub fn hook(self, kind: HookKind, f: EventFn) -> Self {
        assert_ne!(kind, HookKind::WorldOpen, "use world_open");
        self.export(kind.symbol(), f as *const c_void)
    }

    fn export(mut self, symbol: &'static str, ptr: *const c_void) -> Self {
        self.symbols.insert(symbol, ptr);
        self
    }
}

/// Open/close counters shared by a provider and its libraries.
#[derive(Debug, Default)]
pub struct MockStats {
    opened: Cell<usize>,
    closed: Cell<usize>,
}

impl MockStats {
    pub fn opened(&self) -> usize {
        self.opened.get()
    }

    pub fn closed(&self) -> usize {
        self.closed.get()
    }
}

/// Library provider serving [`MockSpec`]s by file name (lossily decoded).
#[derive(Debug, Default)]
pub struct MockProvider {
    libraries: HashMap<String, MockSpec>,
    stats: Rc<MockStats>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(mut self, file_name: &str, spec: MockSpec) -> Self {
        self.libraries.insert(file_name.to_string(), spec);
        self
    }

    pub fn stats(&self) -> Rc<MockStats> {
        self.stats.clone()
    }
}

// Safety: mock libraries only export functions registered through the typed
// `MockSpec` builders.
unsafe impl LibraryProvider for MockProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn DynamicLibrary>> {
        let open_error = |message: &str| ModError::LibraryOpen {
            path: path.to_path_buf(),
            message: message.to_string(),
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let spec = self
            .libraries
            .get(file_name.as_ref())
            .ok_or_else(|| {
                open_error("cannot open shared object file: No such file or directory")
            })?;
        if let Some(message) = &spec.open_error {
            return Err(open_error(message));
        }

        self.stats.opened.set(self.stats.opened.get() + 1);
        Ok(Box::new(MockLibrary {
            symbols: spec.symbols.clone(),
            close_error: spec.close_error.clone(),
            stats: self.stats.clone(),
        }))
    }
}

struct MockLibrary {
    symbols: HashMap<&'static str, *const c_void>,
    close_error: Option<String>,
    stats: Rc<MockStats>,
}

unsafe impl DynamicLibrary for MockLibrary {
    fn symbol(&self, name: &str) -> Option<*const c_void> {
        self.symbols.get(name).copied()
    }

    fn close(self: Box<Self>) -> std::result::Result<(), String> {
        self.stats.closed.set(self.stats.closed.get() + 1);
        match self.close_error {
            Some(message) => Err(message),
            None => Ok(()),
        }
    }
}

/// Logger keeping every message for inspection.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLogger {
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }

    pub fn contains_info(&self, needle: &str) -> bool {
        self.contains(LogLevel::Info, needle)
    }

    pub fn contains_warning(&self, needle: &str) -> bool {
        self.contains(LogLevel::Warn, needle)
    }

    pub fn contains_error(&self, needle: &str) -> bool {
        self.contains(LogLevel::Error, needle)
    }
}

impl ModLogger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.lock().unwrap().push((level, message.to_string()));
    }
}
