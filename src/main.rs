//! 求人ボードクローラーのエントリポイント
//!
//! 引数なしで起動し、環境変数（WEB_URL / BASE_WEB_URL）だけで動く。
//! 観測可能な出力はログとエクスポートファイルのみ。

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use jobboard_crawler::{Crawler, CrawlerConfig, JobBoardScraper};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,jobboard_crawler=debug")),
        )
        .init();

    let config = CrawlerConfig::from_env();
    let mut crawler = JobBoardScraper::new(config);

    match crawler.execute().await {
        Ok(outcome) => {
            info!("=== Crawl Summary ===");
            info!("Records collected: {}", outcome.records.len());
            info!("Companies visited: {}", outcome.companies_visited);
            match &outcome.export_path {
                Some(path) => info!("Export file: {}", path.display()),
                None => info!("Export file: not written"),
            }
            if outcome.timed_out {
                info!("Run stopped early on a navigation timeout");
            }
        }
        Err(e) => {
            // クロールが失敗してもプロセスは整然と終了させる
            error!("Error in script execution: {}", e);
        }
    }
}
