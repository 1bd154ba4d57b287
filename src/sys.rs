/// Number of CPUs currently online, if the host will say.
#[cfg(unix)]
pub fn online_cpus() -> Option<usize> {
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if n > 0 {
        Some(n as usize)
    } else {
        None
    }
}

#[cfg(not(unix))]
pub fn online_cpus() -> Option<usize> {
    None
}
