use async_trait::async_trait;

use crate::error::CrawlError;
use crate::jobboard::types::CrawlOutcome;

#[async_trait]
pub trait Crawler: Send + Sync {
    /// ブラウザ初期化
    async fn initialize(&mut self) -> Result<(), CrawlError>;

    /// クロール実行（一覧収集 → 詳細抽出 → エクスポート）
    async fn crawl(&mut self) -> Result<CrawlOutcome, CrawlError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), CrawlError>;

    /// 一括実行（initialize → crawl → close）
    ///
    /// crawl が失敗しても close は必ず実行する。
    async fn execute(&mut self) -> Result<CrawlOutcome, CrawlError> {
        self.initialize().await?;
        let outcome = self.crawl().await;
        self.close().await?;
        outcome
    }
}
