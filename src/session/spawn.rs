//! Process liveness and signaling utilities

use portable_pty::Child;

use crate::result::ExpectError;

/// Check if a child process is still alive
pub fn is_alive(child: &mut Box<dyn Child + Send>) -> Result<bool, ExpectError> {
    match child.try_wait() {
        Ok(Some(_)) => Ok(false), // Process exited
        Ok(None) => Ok(true),     // Still running
        Err(e) => Err(ExpectError::IoError(e)),
    }
}

/// Best-effort termination of the child and everything it spawned.
///
/// The child leads the pty session, so its pid doubles as the process group
/// id and the negative-pid form of `kill` reaches the whole group. `force`
/// follows up with a hard kill of the child itself.
#[cfg(unix)]
pub fn terminate_tree(child: &mut Box<dyn Child + Send>, pid: Option<u32>, force: bool) {
    if let Some(pid) = pid {
        unsafe {
            libc::kill(-(pid as libc::pid_t), libc::SIGTERM);
        }
    }
    if force {
        let _ = child.kill();
    }
}

/// Without Unix signals only the portable child killer is available.
#[cfg(not(unix))]
pub fn terminate_tree(child: &mut Box<dyn Child + Send>, _pid: Option<u32>, _force: bool) {
    let _ = child.kill();
}
