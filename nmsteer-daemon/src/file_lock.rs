use fs2::FileExt;
use std::fs::File;
use std::path::PathBuf;

const LOCK_NAME: &str = "nmsteerd.lock";

fn lock_path() -> PathBuf {
    let mut path = dirs::runtime_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir);
    path.push(LOCK_NAME);
    path
}

/// Takes the single-instance lock. The lock is held until the file is dropped.
pub fn acquire_daemon_lock() -> Result<File, String> {
    let path = lock_path();

    let file = File::create(&path)
        .map_err(|e| format!("Failed to create lock file {}: {e}", path.display()))?;

    // Exclusive lock; fails if another instance holds it
    file.try_lock_exclusive()
        .map_err(|_| "Another instance is already running".to_string())?;

    Ok(file)
}
