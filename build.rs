#![forbid(unsafe_code)]

// Build information logged at startup.  Builds outside a git checkout
// report "unknown" rather than failing.
fn main() {
    let branch = build_data::get_git_branch().unwrap_or_else(|_| "unknown".to_string());
    let commit = build_data::get_git_commit_short().unwrap_or_else(|_| "unknown".to_string());
    let dirty = build_data::get_git_dirty().map(|d| d.to_string()).unwrap_or_else(|_| "unknown".to_string());
    let rustc = build_data::get_rustc_version().unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_BRANCH={}", branch);
    println!("cargo:rustc-env=GIT_COMMIT_SHORT={}", commit);
    println!("cargo:rustc-env=GIT_DIRTY={}", dirty);
    println!("cargo:rustc-env=RUSTC_VERSION={}", rustc);

    // Tells cargo not to rebuild build.rs during debug builds when other files change.
    build_data::no_debug_rebuilds();
}
