pub mod notify;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Popups go over the session bus. When started from a console or a service
/// manager the bus address may be missing; derive it from the runtime dir.
///
/// Must run before the async runtime or any other thread is started.
pub fn ensure_console_dbus_env() {
    let exports = missing_bus_vars(
        std::env::var_os("DBUS_SESSION_BUS_ADDRESS").is_some(),
        runtime_dir_from_env(),
        default_runtime_dir(),
    );
    for (key, value) in exports {
        // SAFETY: `main` calls this before building the tokio runtime, while
        // the process is still single-threaded.
        unsafe {
            std::env::set_var(key, value);
        }
    }
}

/// Variables to export so notify-rust can reach the session bus. Empty when
/// the bus address is already set or no bus socket exists.
fn missing_bus_vars(
    bus_address_set: bool,
    env_runtime_dir: Option<PathBuf>,
    fallback_runtime_dir: PathBuf,
) -> Vec<(&'static str, OsString)> {
    if bus_address_set {
        return Vec::new();
    }
    let env_had_runtime = env_runtime_dir.is_some();
    let Some(runtime_dir) = env_runtime_dir
        .and_then(runtime_dir_if_bus_exists)
        .or_else(|| runtime_dir_if_bus_exists(fallback_runtime_dir))
    else {
        return Vec::new();
    };

    let mut vars = Vec::new();
    if !env_had_runtime {
        vars.push(("XDG_RUNTIME_DIR", runtime_dir.clone().into_os_string()));
    }
    if let Some(addr) = build_bus_address(&runtime_dir) {
        vars.push(("DBUS_SESSION_BUS_ADDRESS", OsString::from(addr)));
    }
    vars
}

fn runtime_dir_if_bus_exists(dir: PathBuf) -> Option<PathBuf> {
    dir.join("bus").exists().then_some(dir)
}

fn runtime_dir_from_env() -> Option<PathBuf> {
    std::env::var_os("XDG_RUNTIME_DIR").map(PathBuf::from)
}

fn default_runtime_dir() -> PathBuf {
    let uid = nix::unistd::geteuid().as_raw();
    PathBuf::from(format!("/run/user/{uid}"))
}

fn build_bus_address(runtime: &Path) -> Option<String> {
    let bus = runtime.join("bus");
    bus.exists().then(|| format!("unix:path={}", bus.display()))
}
