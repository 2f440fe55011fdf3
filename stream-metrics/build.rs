use std::process::Command;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=STREAM_EXPORTER_COMMIT_SHA");
    println!("cargo:rerun-if-env-changed=STREAM_EXPORTER_BUILD_DATE");
    println!("cargo:rerun-if-env-changed=STREAM_EXPORTER_RUST_VERSION");

    // Values exported by the release pipeline win over detected ones.
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    emit("STREAM_EXPORTER_RUST_VERSION", || command_output(&rustc, &["-V"]));
    emit("STREAM_EXPORTER_COMMIT_SHA", || {
        command_output("git", &["rev-parse", "HEAD"])
    });
    emit("STREAM_EXPORTER_BUILD_DATE", || {
        command_output("date", &["-u", "+%Y-%m-%dT%H:%M:%SZ"])
    });

    Ok(())
}

fn emit(name: &str, detect: impl FnOnce() -> Option<String>) {
    let value = std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(detect)
        .unwrap_or_else(|| "UNKNOWN".to_string());
    println!("cargo:rustc-env={}={}", name, value);
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8(output.stdout).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
