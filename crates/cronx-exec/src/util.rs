use std::path::PathBuf;

use tokio::process::{Child, Command};

/// Build a platform shell invocation for `script` (`sh -c` / `cmd /c`).
pub fn shell_command(script: &str) -> Command {
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            // Pass the line verbatim: std's argument escaping mangles quotes for cmd.exe.
            let mut cmd = Command::new("cmd");
            cmd.raw_arg(format!("/c \"{script}\""));
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(script);
            cmd
        }
    }
}

/// Home directory of the invoking user, or the temp dir when unknown.
pub fn default_work_dir() -> PathBuf {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.is_dir())
        .unwrap_or_else(std::env::temp_dir)
}

#[cfg(unix)]
mod imp {
    use std::io;

    use tokio::process::{Child, Command};

    /// Put the child in its own process group so the whole tree can be signalled.
    pub fn isolate(cmd: &mut Command) {
        cmd.process_group(0);
    }

    pub async fn terminate_graceful(child: &mut Child) {
        if let Some(pid) = child.id() {
            let _ = signal_group(pid, libc::SIGTERM);
        }
    }

    pub async fn kill_tree(child: &mut Child) {
        if let Some(pid) = child.id() {
            kill_group(pid);
        }
        let _ = child.start_kill();
    }

    pub fn kill_group(pgid: u32) {
        let _ = signal_group(pgid, libc::SIGKILL);
    }

    fn signal_group(pid: u32, signal: libc::c_int) -> io::Result<()> {
        let pgid = pid as libc::pid_t;
        // Negative pid addresses the process group led by `pgid`.
        let rc = unsafe { libc::kill(-pgid, signal) };
        if rc != 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

#[cfg(windows)]
mod imp {
    use std::process::Stdio;

    use tokio::process::{Child, Command};

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    pub fn isolate(cmd: &mut Command) {
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    // Ask the whole tree to close while `cmd.exe` is still alive to anchor
    // the `/T` walk. Console programs usually refuse; the forced pass follows.
    pub async fn terminate_graceful(child: &mut Child) {
        if let Some(pid) = child.id() {
            taskkill(pid, false).await;
        }
    }

    pub async fn kill_tree(child: &mut Child) {
        if let Some(pid) = child.id() {
            taskkill(pid, true).await;
        }
        let _ = child.start_kill();
    }

    // Once `cmd.exe` has exited its children are no longer reachable through
    // `taskkill /T`; the caller bounds the drain instead.
    pub fn kill_group(_pid: u32) {}

    async fn taskkill(pid: u32, force: bool) {
        let mut cmd = Command::new("taskkill");
        if force {
            cmd.arg("/F");
        }
        let _ = cmd
            .args(["/T", "/PID", &pid.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .creation_flags(CREATE_NO_WINDOW)
            .status()
            .await;
    }
}

/// Detach the child from our console / process group before spawning.
pub fn isolate_process_tree(cmd: &mut Command) {
    imp::isolate(cmd);
}

/// First, polite termination step: SIGTERM to the group on Unix, a
/// non-forced `taskkill /T` on Windows. The child itself stays alive on
/// Windows if it ignores the request.
pub async fn terminate_graceful(child: &mut Child) {
    imp::terminate_graceful(child).await;
}

/// Forcefully kill the child and every process it spawned.
pub async fn kill_tree(child: &mut Child) {
    imp::kill_tree(child).await;
}

/// SIGKILL whatever is left of the process group led by `pgid`, e.g.
/// background jobs that outlived a shell which exited on SIGTERM.
pub fn kill_leftovers(pgid: u32) {
    imp::kill_group(pgid);
}
