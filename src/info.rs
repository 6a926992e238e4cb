//! Mod descriptors.

use std::ffi::{c_char, CStr};
use std::fmt;

use crate::abi::RawModInfo;

/// Placeholder for descriptor fields a mod did not provide.
pub const UNKNOWN: &str = "unknown";

/// Name, version, author and description of a loaded mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModInfo {
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
}

impl ModInfo {
    /// Create a descriptor.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        author: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            author: author.into(),
            description: description.into(),
        }
    }

    /// Descriptor for a mod that does not export `mod_get_info`.
    pub fn fallback(file_name: impl Into<String>) -> Self {
        Self::new(file_name, UNKNOWN, UNKNOWN, UNKNOWN)
    }

    /// Copy a descriptor returned by a mod.
    ///
    /// Null fields fall back to the file name (for `name`) or [`UNKNOWN`].
    ///
    /// # Safety
    /// Every non-null field must point to a nul-terminated string that stays
    /// valid for the duration of this call.
    pub unsafe fn from_raw(raw: &RawModInfo, file_name: &str) -> Self {
        Self {
            name: field(raw.name).unwrap_or_else(|| file_name.to_string()),
            version: field(raw.version).unwrap_or_else(|| UNKNOWN.to_string()),
            author: field(raw.author).unwrap_or_else(|| UNKNOWN.to_string()),
            description: field(raw.description).unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

impl fmt::Display for ModInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{} by {}", self.name, self.version, self.author)
    }
}

unsafe fn field(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}
