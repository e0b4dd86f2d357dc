//! 求人ボードクローラー
//!
//! 一覧ページの遅延ロードを出し切ってから求人インデックスを収集し、
//! 各求人の詳細ページと会社ページを順に巡回してCSVへエクスポートする。

pub mod scraper;
pub mod types;

pub use scraper::JobBoardScraper;
pub use types::{
    CompanyCache, CompanyDetail, CompanyInfo, CrawlOutcome, JobRecord, NOT_AVAILABLE, SKIPPED,
};
