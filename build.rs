use std::process::Command;

/// Exposes `GIT_VERSION` to the binaries for `--version` and the startup log.
fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let described = Command::new("git")
        .args(["describe", "--always", "--dirty", "--tags"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|v| !v.is_empty());

    let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let version = match described {
        Some(git) => format!("{} ({})", pkg_version, git),
        None => pkg_version,
    };

    println!("cargo:rustc-env=GIT_VERSION={}", version);
}
