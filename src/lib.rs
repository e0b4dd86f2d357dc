//! 求人ボードクローラーライブラリ
//!
//! - 動的レンダリングされる求人ボードから求人レコードを抽出
//! - 会社単位・技術スタック署名単位の重複を抑止
//! - 収集結果をBOM付きUTF-8のCSVにエクスポート
//!
//! # 使用例
//!
//! ```rust,ignore
//! use jobboard_crawler::{CrawlerService, CrawlRequest};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = CrawlerService::new();
//!
//!     let request = CrawlRequest::new("http://localhost:3000/home", "http://localhost:3000")
//!         .with_export_dir("./exports")
//!         .with_headless(true);
//!
//!     let outcome = service.call(request).await.unwrap();
//!     println!("Records: {}", outcome.records.len());
//! }
//! ```
//!
//! # クローラーを直接使う例
//!
//! ```rust,ignore
//! use jobboard_crawler::{Crawler, CrawlerConfig, JobBoardScraper};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = CrawlerConfig::from_env();
//!     let mut crawler = JobBoardScraper::new(config);
//!     let outcome = crawler.execute().await.unwrap();
//!     println!("Saved to {:?}", outcome.export_path);
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod jobboard;
pub mod service;
pub mod traits;
pub mod wait;

// 主要な型をリエクスポート
pub use config::CrawlerConfig;
pub use error::CrawlError;
pub use export::{ExportRow, ExportWriter};
pub use jobboard::{
    CompanyCache, CompanyDetail, CompanyInfo, CrawlOutcome, JobBoardScraper, JobRecord,
};
pub use service::{CrawlRequest, CrawlerService};
pub use traits::Crawler;
