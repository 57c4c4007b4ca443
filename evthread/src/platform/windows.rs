use std::io;
use std::sync::OnceLock;

use windows_sys::Win32::System::Performance::{QueryPerformanceCounter, QueryPerformanceFrequency};
use windows_sys::Win32::System::Threading::{GetCurrentThread, SetThreadPriority};

/// Performance counter frequency, fixed at boot.
fn frequency() -> u128 {
    static FREQUENCY: OnceLock<u128> = OnceLock::new();

    *FREQUENCY.get_or_init(|| {
        let mut freq: i64 = 0;
        let ok = unsafe { QueryPerformanceFrequency(&mut freq) };
        assert!(ok != 0 && freq > 0, "QueryPerformanceFrequency failed");
        freq as u128
    })
}

/// Reads the performance counter in nanoseconds.
pub(crate) fn sys_monotonic_nanos() -> u128 {
    let mut count: i64 = 0;
    let ok = unsafe { QueryPerformanceCounter(&mut count) };
    assert!(ok != 0, "QueryPerformanceCounter failed");

    (count as u128) * 1_000_000_000 / frequency()
}

/// Sets the priority of the calling thread.
///
/// `priority` follows the nice convention (lower is more urgent) and is
/// mapped onto the `THREAD_PRIORITY_LOWEST..=THREAD_PRIORITY_HIGHEST` band.
pub(crate) fn sys_set_thread_priority(priority: i32) -> io::Result<()> {
    let level = (-priority).clamp(-2, 2);

    let ok = unsafe { SetThreadPriority(GetCurrentThread(), level) };
    if ok == 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
