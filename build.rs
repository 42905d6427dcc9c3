//! Build script for the confluence-gateway project
//!
//! Embeds the compilation target so the HTTP client can report it in its
//! user-agent string.

use std::env;

/// Entry point for the build script.
fn main() {
  // Store the target architecture for the user-agent header
  println!("cargo:rustc-env=TARGET={}", env::var("TARGET").unwrap_or_default());

  // Re-run when this build script is modified
  println!("cargo:rerun-if-changed=build.rs");

  // Re-run when target architecture changes during cross-compilation
  println!("cargo:rerun-if-env-changed=TARGET");
}
