//! DOM待機プリミティブ
//!
//! 固定スリープではなく、セレクタの出現・DOM変化・スクロール高さの収束を
//! 条件にして待つ。タイムアウトは `CrawlError::Timeout` として区別できる。

use std::time::Duration;

use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::debug;

use crate::error::CrawlError;

/// セレクタ出現確認のポーリング間隔（ミリ秒）
const SELECTOR_POLL_INTERVAL_MS: u64 = 250;
/// スクロール1回あたりの移動量（px）
const SCROLL_DISTANCE_PX: u64 = 100;
/// スクロールの実行間隔（ミリ秒）
const SCROLL_INTERVAL_MS: u64 = 100;

/// セレクタが少なくとも1要素に解決するまで待機
///
/// 期限内に出現しなければ `Timeout` を返す。セレクタは単一引用符を
/// 含まない前提（本クレートで使うセレクタはすべて属性値に二重引用符を使う）。
pub async fn wait_for_selector(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<(), CrawlError> {
    let probe = selector_probe_script(selector);
    let start = std::time::Instant::now();

    while start.elapsed() < timeout {
        let found = page
            .evaluate(probe.as_str())
            .await
            .map_err(|e| CrawlError::JavaScript(e.to_string()))?
            .into_value::<bool>()
            .unwrap_or(false);

        if found {
            debug!("Selector {} resolved after {:?}", selector, start.elapsed());
            return Ok(());
        }

        sleep(Duration::from_millis(SELECTOR_POLL_INTERVAL_MS)).await;
    }

    Err(CrawlError::Timeout(format!(
        "セレクタ {} が {:?} 以内に出現しませんでした",
        selector, timeout
    )))
}

/// DOM変化イベント駆動で述語が真になるまで待機
///
/// `MutationObserver` を `document.body` に張り（childList + subtree）、
/// 変化のたびに述語を再評価する。購読前にも一度評価し、満たされた時点で
/// 即座に observer を切断する。元実装は無期限待機だが、本実装は期限付きで、
/// 期限切れは `Timeout` として返し呼び出し側がセンチネルへ退避できる
/// （ハングではなくフォールバックに倒す。DESIGN.md参照）。
pub async fn wait_for_mutation(
    page: &Page,
    predicate_js: &str,
    timeout: Duration,
) -> Result<(), CrawlError> {
    let script = mutation_wait_script(predicate_js, timeout.as_millis() as u64);

    let satisfied = page
        .evaluate(script.as_str())
        .await
        .map_err(|e| CrawlError::JavaScript(e.to_string()))?
        .into_value::<bool>()
        .unwrap_or(false);

    if satisfied {
        Ok(())
    } else {
        Err(CrawlError::Timeout(format!(
            "DOM条件 {} が {:?} 以内に成立しませんでした",
            predicate_js, timeout
        )))
    }
}

/// 遅延ロードを出し切るためのスクロール
///
/// 累計スクロール量がその時点のドキュメント全高に達するまで、一定間隔で
/// 一定量ずつスクロールする。全高はコンテンツ追加で伸びるため毎チックで
/// 読み直す（固定回数ではなく移動目標への収束）。戻り値は累計スクロール量。
pub async fn scroll_to_end(page: &Page) -> Result<u64, CrawlError> {
    let script = format!(
        r#"
        new Promise((resolve) => {{
            let totalHeight = 0;
            const distance = {distance};
            const timer = setInterval(() => {{
                const scrollHeight = document.body.scrollHeight;
                window.scrollBy(0, distance);
                totalHeight += distance;
                if (totalHeight >= scrollHeight) {{
                    clearInterval(timer);
                    resolve(totalHeight);
                }}
            }}, {interval});
        }})
        "#,
        distance = SCROLL_DISTANCE_PX,
        interval = SCROLL_INTERVAL_MS,
    );

    let total = page
        .evaluate(script.as_str())
        .await
        .map_err(|e| CrawlError::JavaScript(e.to_string()))?
        .into_value::<u64>()
        .unwrap_or(0);

    debug!("Scrolled {}px to exhaust lazy-loaded content", total);
    Ok(total)
}

fn selector_probe_script(selector: &str) -> String {
    format!("document.querySelector('{}') !== null", selector)
}

fn mutation_wait_script(predicate_js: &str, timeout_ms: u64) -> String {
    format!(
        r#"
        new Promise((resolve) => {{
            const satisfied = () => ({predicate});
            if (satisfied()) {{
                resolve(true);
                return;
            }}
            const observer = new MutationObserver(() => {{
                if (satisfied()) {{
                    observer.disconnect();
                    clearTimeout(timer);
                    resolve(true);
                }}
            }});
            const timer = setTimeout(() => {{
                observer.disconnect();
                resolve(false);
            }}, {timeout_ms});
            observer.observe(document.body, {{ childList: true, subtree: true }});
        }})
        "#,
        predicate = predicate_js,
        timeout_ms = timeout_ms,
    )
}
