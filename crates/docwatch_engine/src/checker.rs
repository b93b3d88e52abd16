use docwatch_core::Token;
use docwatch_logging::watch_debug;
use url::Url;

use crate::fetch::{FetchSettings, PageFetcher};
use crate::page::{decode_page, CellScanner};
use crate::{FailureKind, FetchError};

/// One fetch and scan of the watched page.
///
/// `Err` means the answer is unknown; callers must not read it as "absent".
#[async_trait::async_trait]
pub trait PageChecker: Send + Sync {
    async fn check(&self, token: &Token) -> Result<bool, FetchError>;
}

/// Checks the configured page over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPageChecker {
    url: Url,
    fetcher: PageFetcher,
    scanner: CellScanner,
}

impl HttpPageChecker {
    pub fn new(page_url: &str, settings: FetchSettings) -> Result<Self, FetchError> {
        let url = Url::parse(page_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        Ok(Self {
            url,
            fetcher: PageFetcher::new(settings)?,
            scanner: CellScanner::new()?,
        })
    }
}

#[async_trait::async_trait]
impl PageChecker for HttpPageChecker {
    async fn check(&self, token: &Token) -> Result<bool, FetchError> {
        let page = self.fetcher.fetch(&self.url).await?;
        let html = decode_page(&page.bytes, page.content_type.as_deref())?;
        let found = self.scanner.contains(&html, token);
        watch_debug!(
            "checked {} ({} bytes) for {}: found={}",
            page.final_url,
            page.bytes.len(),
            token,
            found
        );
        Ok(found)
    }
}
