use libc::{CLOCK_MONOTONIC, clock_gettime, timespec};
use std::io;

/// Reads `CLOCK_MONOTONIC` in nanoseconds.
///
/// The value never goes backwards and is unaffected by wall-clock
/// adjustments.
pub(crate) fn sys_monotonic_nanos() -> u128 {
    let mut ts = timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };

    let rc = unsafe { clock_gettime(CLOCK_MONOTONIC, &mut ts) };
    assert_eq!(rc, 0, "clock_gettime(CLOCK_MONOTONIC) failed");

    (ts.tv_sec as u128) * 1_000_000_000 + ts.tv_nsec as u128
}

/// Sets the nice value of the calling thread.
///
/// Lower values are more urgent. Raising urgency usually requires
/// privileges; the error is returned to the caller unchanged.
#[cfg(target_os = "linux")]
pub(crate) fn sys_set_thread_priority(priority: i32) -> io::Result<()> {
    let tid = unsafe { libc::syscall(libc::SYS_gettid) };
    if tid < 0 {
        return Err(io::Error::last_os_error());
    }

    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, tid as libc::id_t, priority) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Per-thread nice values are a Linux extension; elsewhere `setpriority`
/// would change the whole process.
#[cfg(not(target_os = "linux"))]
pub(crate) fn sys_set_thread_priority(_priority: i32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "per-thread priority is not supported on this platform",
    ))
}
