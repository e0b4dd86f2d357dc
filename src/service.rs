use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::jobboard::types::CrawlOutcome;
use crate::jobboard::JobBoardScraper;
use crate::traits::Crawler;

/// クロールリクエスト
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub listing_url: String,
    pub base_url: String,
    pub export_dir: PathBuf,
    pub headless: bool,
}

impl CrawlRequest {
    pub fn new(listing_url: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            listing_url: listing_url.into(),
            base_url: base_url.into(),
            export_dir: PathBuf::from("./exports"),
            headless: true,
        }
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

impl From<CrawlRequest> for CrawlerConfig {
    fn from(req: CrawlRequest) -> Self {
        CrawlerConfig::new(req.listing_url, req.base_url)
            .with_export_dir(req.export_dir)
            .with_headless(req.headless)
    }
}

/// tower::Serviceを実装したクローラーサービス
#[derive(Debug, Clone, Default)]
pub struct CrawlerService {
    // 将来的な拡張用（レートリミット、キャッシュなど）
}

impl CrawlerService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<CrawlRequest> for CrawlerService {
    type Response = CrawlOutcome;
    type Error = CrawlError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CrawlRequest) -> Self::Future {
        info!("Crawl request received: listing_url={}", req.listing_url);

        Box::pin(async move {
            let config: CrawlerConfig = req.into();
            let mut crawler = JobBoardScraper::new(config);

            // クロール実行
            let outcome = crawler.execute().await?;

            info!(
                "Crawl completed: {} records, {} companies, export={:?}",
                outcome.records.len(),
                outcome.companies_visited,
                outcome.export_path
            );

            Ok(outcome)
        })
    }
}
