use std::path::Path;
use std::process::Command;

fn git(repo_root: &Path, args: &[&str]) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .args(args)
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let repo_root = Path::new(&manifest_dir).join("..");

    let mut sha = git(&repo_root, &["rev-parse", "--short", "HEAD"])
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    if git(&repo_root, &["status", "--porcelain"]).is_some_and(|s| !s.is_empty()) {
        sha.push_str("-dirty");
    }

    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rustc-env=REDSHIFT_BUILD_SHA={sha}");
}
