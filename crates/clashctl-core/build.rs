use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env=CLASHCTL_{key}={value}");
}

fn short_hash() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    emit("GIT_HASH", &short_hash().unwrap_or_else(|| "unknown".into()));

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    emit("BUILD_TIMESTAMP", &now.to_string());

    emit(
        "BUILD_PROFILE",
        &std::env::var("PROFILE").unwrap_or_else(|_| "unknown".into()),
    );

    println!("cargo:rerun-if-changed=../../.git/HEAD");
}
