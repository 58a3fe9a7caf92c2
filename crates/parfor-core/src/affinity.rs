//! Best-effort worker-to-core pinning.
//!
//! Pinning only affects scheduling locality. A platform without support, or a
//! refused syscall, leaves the worker where the OS put it.

/// Hint applied by each worker before it touches its chunk.
pub trait AffinityHint: Sync {
    /// Pin the calling thread for `worker`. Returns whether it took effect.
    fn pin_current(&self, worker: usize) -> bool;
}

/// Leaves every worker unpinned.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAffinity;

impl AffinityHint for NoAffinity {
    fn pin_current(&self, _worker: usize) -> bool {
        false
    }
}

/// Pins worker `i` to logical CPU `i % cpus`.
#[derive(Clone, Copy, Debug)]
pub struct RoundRobinCores {
    cpus: usize,
}

impl RoundRobinCores {
    pub fn new() -> Self {
        Self {
            cpus: num_cpus::get().max(1),
        }
    }

    /// Logical CPU chosen for `worker`
    pub fn core_for(&self, worker: usize) -> usize {
        worker % self.cpus
    }
}

impl Default for RoundRobinCores {
    fn default() -> Self {
        Self::new()
    }
}

impl AffinityHint for RoundRobinCores {
    fn pin_current(&self, worker: usize) -> bool {
        let core = self.core_for(worker);
        let pinned = pin_to_core(core);
        if !pinned {
            tracing::warn!(worker, core, "failed to pin worker, continuing unpinned");
        }
        pinned
    }
}

#[cfg(all(target_os = "linux", feature = "affinity"))]
fn pin_to_core(core: usize) -> bool {
    // SAFETY: cpu_set_t is plain data; zeroed is a valid empty set and
    // CPU_SET bounds-checks against the set size.
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(core, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) == 0
    }
}

#[cfg(not(all(target_os = "linux", feature = "affinity")))]
fn pin_to_core(_core: usize) -> bool {
    false
}
