//! Embeds the build metadata reported by `logging::about_info`.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp());
    println!("cargo:rustc-env=BUILD_GIT_SHA={}", git_sha());

    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-env-changed=BACKOFFICE_GIT_SHA");
    println!("cargo:rerun-if-changed=.git/HEAD");
}

fn run(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// UTC ISO-8601. Honours `SOURCE_DATE_EPOCH` for reproducible builds.
fn build_timestamp() -> String {
    let pinned = env::var("SOURCE_DATE_EPOCH").ok();
    let at = pinned.as_deref().map(|secs| format!("@{secs}"));
    let mut args = vec!["-u"];
    if let Some(at) = at.as_deref() {
        args.extend(["-d", at]);
    }
    args.push("+%Y-%m-%dT%H:%M:%SZ");

    run("date", &args)
        .or_else(|| {
            run(
                "powershell",
                &[
                    "-Command",
                    "(Get-Date).ToUniversalTime().ToString('yyyy-MM-ddTHH:mm:ssZ')",
                ],
            )
        })
        .unwrap_or_else(|| "unknown".into())
}

/// Short commit hash; CI can pin it through `BACKOFFICE_GIT_SHA`.
fn git_sha() -> String {
    env::var("BACKOFFICE_GIT_SHA")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| run("git", &["rev-parse", "--short", "HEAD"]))
        .unwrap_or_else(|| "unknown".into())
}
