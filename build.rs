//! Build script probing the system libraries the renderer links against.
//!
//! Path-plot rendering decodes and writes video through OpenCV, so this
//! script checks for an OpenCV install (and the pkg-config needed to find
//! it) and prints install hints when either is missing.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    check_opencv();
    check_pkg_config();

    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
    println!("cargo:rustc-env=BUILD_HOST={}", env::var("HOST").unwrap_or_default());
}

fn check_opencv() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    // Distributions register OpenCV 4 as either opencv4 or opencv
    for package in ["opencv4", "opencv"] {
        let output = Command::new("pkg-config").args(["--modversion", package]).output();
        if let Ok(output) = output {
            if output.status.success() {
                let version = String::from_utf8_lossy(&output.stdout);
                println!("cargo:warning=Found OpenCV version: {}", version.trim());
                return;
            }
        }
    }
    println!("cargo:warning=OpenCV not found via pkg-config. Video decoding and path-plot rendering will not build without it.");
    println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev");
    println!("cargo:warning=On macOS: brew install opencv");
    println!("cargo:warning=On NixOS: Use the provided shell.nix");
}

fn check_pkg_config() {
    let output = Command::new("pkg-config").arg("--version").output();

    match output {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            println!("cargo:warning=Found pkg-config version: {}", version.trim());
        }
        _ => {
            println!("cargo:warning=pkg-config not found. It is needed to locate the system OpenCV.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
            println!("cargo:warning=On macOS: brew install pkg-config");
            println!("cargo:warning=On NixOS: Use the provided shell.nix");
        }
    }
}
