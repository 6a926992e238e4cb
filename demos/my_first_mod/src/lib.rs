//! Minimal mod: a descriptor plus initialize and shutdown.
//!
//! Build with `cargo build -p my-first-mod` and copy the resulting
//! `libmy_first_mod.so` (`my_first_mod.dll`, `libmy_first_mod.dylib`) into the
//! host's mods directory.

use std::ffi::c_void;

use lib_mod_loader::RawModInfo;

static INFO: RawModInfo = RawModInfo::new(
    c"My First Mod",
    c"1.0.0",
    c"VoxelCoreMods",
    c"My first mod!",
);

#[no_mangle]
pub extern "C-unwind" fn mod_get_info() -> RawModInfo {
    INFO
}

#[no_mangle]
pub extern "C-unwind" fn mod_initialize(_host: *mut c_void) -> i32 {
    println!("Hello from my first mod!");
    0
}

#[no_mangle]
pub extern "C-unwind" fn mod_shutdown() {
    println!("Goodbye from my first mod!");
}
