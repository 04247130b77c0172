/// Worker pool sizing for the analysis passes.

use anyhow::Result;
use log::info;

/// Initialize the global rayon thread pool. Leaves half of the cores to
/// the toolchain processes each request spawns.
pub fn init_thread_pool() -> Result<usize> {
    let cores = num_cpus::get();
    let workers = std::cmp::max(1, cores / 2);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("analysis-{}", i))
        .build_global()?;

    info!("[setup] thread pool: {} workers ({} cores)", workers, cores);
    Ok(workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_thread_pool() {
        // A second global initialization in the same process is an error.
        match init_thread_pool() {
            Ok(workers) => {
                assert!(workers >= 1);
                assert!(init_thread_pool().is_err());
            }
            Err(_) => assert!(rayon::current_num_threads() >= 1),
        }
    }
}
