// Disk texture storage constants
//
// Tunables that have a config override take their defaults from here.

/// Export queue
pub mod export {
    /// Name of the single export worker thread
    pub const WORKER_THREAD_NAME: &str = "GPU.TextureExportQueue";
}

/// Live reload
pub mod reload {
    /// A change this close (seconds) to our own write is treated as that write
    pub const GUARD_WINDOW_SECS: i64 = 5;

    /// Reads attempted before a changed file is given up on
    pub const READ_ATTEMPTS: u32 = 100;

    /// Pause between read attempts
    pub const RETRY_DELAY_MS: u64 = 10;
}

/// On-disk file extensions
pub mod files {
    pub const DDS_EXTENSION: &str = "dds";
    pub const PNG_EXTENSION: &str = "png";
}
