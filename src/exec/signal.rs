// src/exec/signal.rs

//! Platform termination primitives.
//!
//! On Unix every child is started as the leader of its own process group, so
//! signals go to the whole group and reach grandchildren that still hold the
//! output pipes open. Both functions return `Ok(false)` when there was nothing
//! left to signal.

use std::io;

#[cfg(unix)]
mod imp {
    use std::io;

    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    pub fn send(pid: u32, signal: Signal) -> io::Result<bool> {
        // Group 0 is our own.
        if pid == 0 {
            return Ok(false);
        }
        match killpg(Pid::from_raw(pid as i32), signal) {
            Ok(()) => Ok(true),
            Err(Errno::ESRCH) => Ok(false),
            Err(e) => Err(io::Error::from(e)),
        }
    }

    pub fn terminate(pid: u32) -> io::Result<bool> {
        send(pid, Signal::SIGTERM)
    }

    pub fn kill(pid: u32) -> io::Result<bool> {
        send(pid, Signal::SIGKILL)
    }
}

#[cfg(not(unix))]
mod imp {
    use std::io;
    use std::process::{Command, Stdio};

    fn taskkill(pid: u32, force: bool) -> io::Result<bool> {
        let mut cmd = Command::new("taskkill");
        if force {
            cmd.args(["/F", "/T"]);
        }
        let status = cmd
            .args(["/PID", &pid.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        Ok(status.success())
    }

    pub fn terminate(pid: u32) -> io::Result<bool> {
        taskkill(pid, false)
    }

    pub fn kill(pid: u32) -> io::Result<bool> {
        taskkill(pid, true)
    }
}

/// Ask the process (group) to exit.
pub fn send_terminate(pid: u32) -> io::Result<bool> {
    imp::terminate(pid)
}

/// Unconditionally end the process (group).
pub fn send_kill(pid: u32) -> io::Result<bool> {
    imp::kill(pid)
}
