/// Open a path in the host's file browser.
///
/// Fire-and-forget: the browser process is spawned and not waited on, and a
/// spawn failure is logged rather than surfaced — a reveal that doesn't
/// happen must never look like a scan error.
use std::path::Path;
use std::process::Command;
use tracing::warn;

/// Reveal `path` in the platform file browser, selecting it where the
/// platform supports that.
pub fn reveal(path: &Path) {
    let result = spawn_browser(path);
    if let Err(err) = result {
        warn!(path = %path.display(), error = %err, "could not open file browser");
    }
}

#[cfg(target_os = "windows")]
fn spawn_browser(path: &Path) -> std::io::Result<()> {
    Command::new("explorer.exe")
        .arg(format!("/select,{}", path.display()))
        .spawn()
        .map(drop)
}

#[cfg(target_os = "macos")]
fn spawn_browser(path: &Path) -> std::io::Result<()> {
    Command::new("open").arg("-R").arg(path).spawn().map(drop)
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn spawn_browser(path: &Path) -> std::io::Result<()> {
    // No selection support; open the containing directory instead.
    let target = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(path)
    };
    Command::new("xdg-open").arg(target).spawn().map(drop)
}
