//! Build script: embeds the git hash and runs pre-flight checks for GPU
//! feature flags before whisper-rs-sys starts its long compile.

use std::process::Command;

fn main() {
    // Embed git short hash for version string
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        && output.status.success()
    {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=GIT_HASH={}", hash);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");

    if cfg!(feature = "cuda") {
        require_tool(
            "nvcc",
            &["--version"],
            "CUDA toolkit",
            "https://developer.nvidia.com/cuda-downloads",
        );
    }
    if cfg!(feature = "vulkan") {
        require_tool(
            "vulkaninfo",
            &["--summary"],
            "Vulkan SDK",
            "https://vulkan.lunarg.com/",
        );
    }
    if cfg!(feature = "hipblas") {
        require_tool("rocminfo", &[], "ROCm", "https://rocm.docs.amd.com/");
    }
    if cfg!(feature = "openblas") {
        check_openblas();
    }
}

/// Fail fast with install instructions when a GPU toolchain probe is missing.
///
/// whisper-rs-sys surfaces missing toolkits as long, cryptic cmake errors;
/// catching the absence here keeps the message readable.
fn require_tool(binary: &str, args: &[&str], toolkit: &str, install_url: &str) {
    let found = Command::new(binary)
        .args(args)
        .output()
        .is_ok_and(|out| out.status.success());

    if !found {
        panic!(
            "\n\n`{binary}` not found — {toolkit} is not installed.\n\
             Install: {install_url}\n\
             Or build without GPU support: cargo build --release\n"
        );
    }
    println!("cargo::warning={toolkit} detected");
}

fn check_openblas() {
    let pkg_config_ok = Command::new("pkg-config")
        .args(["--exists", "openblas"])
        .status()
        .is_ok_and(|s| s.success());

    let lib_exists = || {
        [
            "/usr/lib/x86_64-linux-gnu/libopenblas.so",
            "/usr/lib/libopenblas.so",
            "/usr/lib64/libopenblas.so",
        ]
        .iter()
        .any(|p| std::path::Path::new(p).exists())
    };

    if !pkg_config_ok && !lib_exists() {
        panic!(
            "\n\nOpenBLAS not found.\n\
             Install: sudo apt install libopenblas-dev\n\
             Or build without OpenBLAS: cargo build --release\n"
        );
    }
    println!("cargo::warning=OpenBLAS detected");
}
