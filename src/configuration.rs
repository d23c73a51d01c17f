use std::path::PathBuf;

pub const DEFAULT_INTERVAL_MINUTES: u32 = 10;

pub trait Configuration: Clone + Send + Sync + 'static {
    /// Length of every generated slot, in minutes.
    fn interval_minutes(&self) -> u32;
    /// Whether bookings must carry a school and an id number.
    fn require_identity(&self) -> bool;
    fn database_url(&self) -> Option<String>;
    fn store_file(&self) -> Option<PathBuf>;
}
