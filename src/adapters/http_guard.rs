use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use parking_lot::RwLock;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use url::Url;

use crate::domain::config::PrivacyConfig;
use crate::domain::DomainError;
use crate::ports::{HttpClient, ProgressCallback};

/// Timeout for a single model download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(3600);

/// HTTP client that enforces the privacy policy on every request.
/// In local-only mode all requests are blocked; otherwise only whitelisted
/// domains (and their subdomains) are reachable.
pub struct GuardedHttpClient {
    client: Client,
    local_only: AtomicBool,
    allowed_domains: RwLock<Vec<String>>,
}

impl GuardedHttpClient {
    pub fn new(privacy: &PrivacyConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(format!("TaskIntel/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::HttpRequest(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            local_only = privacy.local_only,
            allowed_domains = ?privacy.allowed_domains,
            "Network guard initialized"
        );

        Ok(Self {
            client,
            local_only: AtomicBool::new(privacy.local_only),
            allowed_domains: RwLock::new(privacy.allowed_domains.clone()),
        })
    }

    /// Replace the policy; takes effect for the next request.
    pub fn apply(&self, privacy: &PrivacyConfig) {
        self.local_only.store(privacy.local_only, Ordering::SeqCst);
        *self.allowed_domains.write() = privacy.allowed_domains.clone();
        info!(
            local_only = privacy.local_only,
            allowed_domains = ?privacy.allowed_domains,
            "Network policy updated"
        );
    }

    fn check_url(&self, url: &str) -> Result<(), DomainError> {
        if self.local_only.load(Ordering::SeqCst) {
            warn!(url = url, "Network request blocked: local-only mode enabled");
            return Err(DomainError::NetworkBlocked {
                reason: "Local-only mode is enabled. All network requests are blocked.".to_string(),
            });
        }

        let parsed = Url::parse(url).map_err(|e| DomainError::HttpRequest(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| DomainError::HttpRequest("Invalid URL: no host".to_string()))?;

        let allowed = self
            .allowed_domains
            .read()
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{}", d)));
        if !allowed {
            warn!(url = url, host = host, "Network request blocked: domain not in whitelist");
            return Err(DomainError::NetworkBlocked {
                reason: format!("Domain '{}' is not in the allowed list", host),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl HttpClient for GuardedHttpClient {
    async fn download_file(
        &self,
        url: &str,
        path: &Path,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<(), DomainError> {
        self.check_url(url)?;

        info!(url = url, target = ?path, "Starting download");

        let response = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| DomainError::HttpRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::HttpRequest(format!("HTTP {} for {}", status, url)));
        }

        let total_size = response.content_length().unwrap_or(0);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to temp file first, then rename atomically
        let temp_path = path.with_extension("download");
        let result = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            let mut downloaded: u64 = 0;
            let mut stream = response.bytes_stream();

            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| DomainError::HttpRequest(e.to_string()))?;
                file.write_all(&chunk).await?;
                downloaded += chunk.len() as u64;

                if let Some(callback) = &progress_callback {
                    callback(downloaded, total_size);
                }
            }

            file.flush().await?;
            drop(file);
            tokio::fs::rename(&temp_path, path).await?;
            Ok::<u64, DomainError>(downloaded)
        }
        .await;

        match result {
            Ok(size) => {
                info!(path = ?path, size = size, "File downloaded successfully");
                Ok(())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                Err(e)
            }
        }
    }

    fn is_network_blocked(&self) -> bool {
        self.local_only.load(Ordering::SeqCst)
    }
}
