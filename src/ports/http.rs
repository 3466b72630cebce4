use std::path::Path;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Progress callback: (bytes downloaded, total bytes or 0 if unknown).
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// HTTP client port for all network requests.
/// All network traffic must go through this interface.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Download a file to a specified path.
    async fn download_file(
        &self,
        url: &str,
        path: &Path,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<(), DomainError>;

    /// Check if network requests are currently blocked.
    fn is_network_blocked(&self) -> bool;
}
