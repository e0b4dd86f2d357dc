//! 求人ボードクローラー実装
//!
//! 一覧収集 → 1件ずつ詳細抽出 → CSVエクスポートの単一制御フローで動く。
//! ブラウザページは1枚だけを直列に使い、並行ナビゲーションは行わない。

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::export::{ExportRow, ExportWriter};
use crate::traits::Crawler;
use crate::wait::{scroll_to_end, wait_for_mutation, wait_for_selector};

use super::types::{
    normalize_tech_details, CompanyCache, CompanyDetail, CompanyInfo, CrawlOutcome, JobRecord,
    NOT_AVAILABLE, SKIPPED,
};

/// 求人一覧のカードセレクタ
const JOB_LIST_SELECTOR: &str = r#"ul[data-cy="job-list"] li.Card_Card__WdaEk"#;
/// カード内のアンカー（会社名・職種名・相対URLを属性で持つ）
const JOB_CARD_LINK_SELECTOR: &str = r#"div[data-cy="job-card"] a"#;
/// 求人詳細の技術スタック要素
const TECH_DETAILS_SELECTOR: &str = r#"[class*="wds-wcfcu3"] > span"#;
/// 求人詳細の勤務地ブロック
const LOCATION_SELECTOR: &str = r#"[class*="JobHeader__Tools__Company__Info"]"#;
/// 会社ページへのリンク
const COMPANY_LINK_SELECTOR: &str = r#"[class*="JobHeader__Tools__Company__Link"]"#;
/// 設立年の待機セレクタ（ラッパー配下の time 要素）
const FOUNDED_YEAR_WAIT_SELECTOR: &str =
    r#"[class*="CompanyInfo_CompanyInfo__FoundedYearWrapper"] time"#;
/// 設立年のラッパー
const FOUNDED_YEAR_WRAPPER_SELECTOR: &str =
    r#"[class*="CompanyInfo_CompanyInfo__FoundedYearWrapper"]"#;
/// 会社特徴タグのコンテナ
const TAG_LIST_SELECTOR: &str = r#"[class*="CompanyTagList_CompanyTagList"]"#;
/// 会社情報テーブルのラッパー
const INFO_TABLE_SELECTOR: &str = r#"[class*="CompanyInfoTable_wrapper"]"#;
/// 会社情報テーブルの定義値セル
const INFO_CELL_SELECTOR: &str = r#"[class*="CompanyInfoTable_definition__dd"]"#;

/// 平均年俸セルの位置（平坦化したセルリストの6番目）
const AVERAGE_SALARY_INDEX: usize = 5;
/// 入退社情報セルの位置（同13番目）
const TURNOVER_ENTRY_INDEX: usize = 12;

/// 求人ボードクローラー
pub struct JobBoardScraper {
    config: CrawlerConfig,
    exporter: ExportWriter,
    browser: Option<Browser>,
}

impl JobBoardScraper {
    /// 新しいクローラーを作成
    pub fn new(config: CrawlerConfig) -> Self {
        let exporter = ExportWriter::new(config.export_dir.clone());
        Self {
            config,
            exporter,
            browser: None,
        }
    }

    /// 一覧ページから求人インデックスを収集
    ///
    /// スクロールで遅延ロードを出し切ってから、カードごとの
    /// (会社名, 職種名, 相対URL) をDOM順で読み取る。属性欠落は例外に
    /// せず "N/A" に落とす。
    async fn collect_listing(&self, page: &Page) -> Result<Vec<JobRecord>, CrawlError> {
        info!("Loading job listing page: {}", self.config.listing_url);
        self.navigate(page, &self.config.listing_url).await?;

        let scrolled = scroll_to_end(page).await?;
        debug!("Lazy-load scroll finished at {}px", scrolled);

        wait_for_selector(page, JOB_LIST_SELECTOR, self.config.wait_timeout).await?;

        let script = format!(
            r#"
            (() => {{
                const cards = document.querySelectorAll('{list}');
                const rows = [];
                for (const card of cards) {{
                    const anchor = card.querySelector('{anchor}');
                    rows.push({{
                        company: anchor ? (anchor.getAttribute('data-company-name') || 'N/A') : 'N/A',
                        position: anchor ? (anchor.getAttribute('data-position-name') || 'N/A') : 'N/A',
                        href: anchor ? anchor.getAttribute('href') : null,
                    }});
                }}
                return JSON.stringify(rows);
            }})()
            "#,
            list = JOB_LIST_SELECTOR,
            anchor = JOB_CARD_LINK_SELECTOR,
        );

        let json_str = page
            .evaluate(script.as_str())
            .await
            .map_err(|e| CrawlError::JavaScript(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| CrawlError::Extraction(e.to_string()))?;

        records_from_listing_json(&json_str, &self.config.base_url)
    }

    /// 1レコードの詳細抽出（エラー方針の適用層）
    ///
    /// タイムアウト以外のエラーはここで握り潰してセンチネルに退避し、
    /// 巡回を続行させる。タイムアウトはキャッシュのスナップショットを
    /// 保存したうえで呼び出し元に伝播し、残りの巡回を打ち切らせる。
    pub async fn extract_details(
        &self,
        page: &Page,
        record: &mut JobRecord,
        cache: &mut CompanyCache,
    ) -> Result<(), CrawlError> {
        match self.enrich_record(page, record, cache).await {
            Ok(()) => Ok(()),
            Err(e) => {
                record.mark_unresolved();

                if self.config.debug {
                    self.capture_debug_screenshot(page).await;
                }

                if e.is_timeout() {
                    error!("Timeout error for {}: {}", record.url, e);
                    let rows: Vec<ExportRow> =
                        cache.entries().iter().map(ExportRow::from).collect();
                    self.exporter.save(&rows);
                    Err(e)
                } else {
                    error!("Failed to extract details for {}: {}", record.url, e);
                    Ok(())
                }
            }
        }
    }

    /// 求人詳細ページ（と必要なら会社ページ）を巡回してレコードを埋める
    async fn enrich_record(
        &self,
        page: &Page,
        record: &mut JobRecord,
        cache: &mut CompanyCache,
    ) -> Result<(), CrawlError> {
        self.navigate(page, &record.url).await?;

        // 技術スタック要素は非同期に描画されるためDOM変化で待つ。
        // 期限切れは致命ではなく、読み取り側の "N/A" フォールバックに任せる。
        let tech_probe = format!("document.querySelector('{}') !== null", TECH_DETAILS_SELECTOR);
        if let Err(e) = wait_for_mutation(page, &tech_probe, self.config.wait_timeout).await {
            if e.is_timeout() {
                warn!("Tech stack element did not appear for {}: {}", record.url, e);
            } else {
                return Err(e);
            }
        }

        let mut tech_details = self.read_tech_details(page).await;
        let location = self.read_location(page).await;

        // 技術スタック署名の重複判定は会社の重複とは独立
        if cache.contains_tech_details(&tech_details) {
            tech_details = SKIPPED.to_string();
        }

        let info = if cache.contains_company(&record.company) {
            info!("Skipping {}, already processed.", record.company);
            CompanyInfo::skipped()
        } else if let Ok(link) = page.find_element(COMPANY_LINK_SELECTOR).await {
            self.click_through(page, &link).await?;
            let info = self.extract_company_info(page).await;
            cache.insert(CompanyDetail {
                company_name: record.company.clone(),
                tech_details: tech_details.clone(),
                info: info.clone(),
            });
            info
        } else {
            // 会社リンクが無い求人。キャッシュには載せない
            CompanyInfo::default()
        };

        record.tech_details = tech_details;
        record.location = location;
        record.founded_year = info.founded_year;
        record.features = info.features;
        record.average_salary = info.average_salary;
        record.turnover_entry = info.turnover_entry;

        Ok(())
    }

    /// 技術スタックテキストを読み取り、正規化して返す（欠落は "N/A"）
    async fn read_tech_details(&self, page: &Page) -> String {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector('{}');
                return el ? el.innerText : null;
            }})()
            "#,
            TECH_DETAILS_SELECTOR
        );

        let raw: Option<String> = page
            .evaluate(script.as_str())
            .await
            .ok()
            .and_then(|v| v.into_value::<Option<String>>().ok())
            .flatten();

        match raw {
            Some(text) => normalize_tech_details(&text),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    /// 勤務地ブロックを読み取る（欠落は "N/A"）
    async fn read_location(&self, page: &Page) -> String {
        let script = format!(
            r#"
            (() => {{
                const elements = document.querySelectorAll('{}');
                return elements.length > 0 ? elements[0].innerText.trim() : 'N/A';
            }})()
            "#,
            LOCATION_SELECTOR
        );

        page.evaluate(script.as_str())
            .await
            .ok()
            .and_then(|v| v.into_value::<String>().ok())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// 会社ページから4フィールドを抽出
    ///
    /// 各フィールドは独立に待機・読み取りし、ひとつの失敗が他の取得を
    /// 妨げない。待機の期限切れも "N/A" のままにするだけで致命にしない。
    async fn extract_company_info(&self, page: &Page) -> CompanyInfo {
        let mut info = CompanyInfo::default();

        match wait_for_selector(page, FOUNDED_YEAR_WAIT_SELECTOR, self.config.wait_timeout).await {
            Ok(()) => info.founded_year = self.read_founded_year(page).await,
            Err(e) => warn!("Founded year element not found: {}", e),
        }

        match wait_for_selector(page, TAG_LIST_SELECTOR, self.config.wait_timeout).await {
            Ok(()) => info.features = self.read_features(page).await,
            Err(e) => warn!("Company tag list not found: {}", e),
        }

        match self.wait_for_info_table(page).await {
            Ok(()) => {
                let (average_salary, turnover_entry) = self.read_info_table(page).await;
                info.average_salary = average_salary;
                info.turnover_entry = turnover_entry;
            }
            Err(e) => warn!("Company info table not populated: {}", e),
        }

        info
    }

    /// 設立年（time要素のdatetime属性）を読み取る
    async fn read_founded_year(&self, page: &Page) -> String {
        let script = format!(
            r#"
            (() => {{
                const wrapper = document.querySelector('{}');
                if (wrapper) {{
                    const timeElement = wrapper.querySelector('time');
                    if (timeElement) {{
                        return timeElement.getAttribute('datetime') || 'N/A';
                    }}
                }}
                return 'N/A';
            }})()
            "#,
            FOUNDED_YEAR_WRAPPER_SELECTOR
        );

        page.evaluate(script.as_str())
            .await
            .ok()
            .and_then(|v| v.into_value::<String>().ok())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// 特徴タグを " / " 連結で読み取る
    async fn read_features(&self, page: &Page) -> String {
        let script = format!(
            r#"
            (() => {{
                const container = document.querySelector('{}');
                if (container) {{
                    const tags = container.querySelectorAll('div, button');
                    const joined = Array.from(tags)
                        .map((el) => el.innerText.trim())
                        .filter(Boolean)
                        .join(' / ');
                    return joined || 'N/A';
                }}
                return 'N/A';
            }})()
            "#,
            TAG_LIST_SELECTOR
        );

        page.evaluate(script.as_str())
            .await
            .ok()
            .and_then(|v| v.into_value::<String>().ok())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// 情報テーブルがセルを持つまで待つ
    ///
    /// ラッパーの出現時点ではテーブルが空のことがあるため、セレクタ待機の
    /// 後にDOM変化ベースでセルの充填を確認する。
    async fn wait_for_info_table(&self, page: &Page) -> Result<(), CrawlError> {
        wait_for_selector(page, INFO_TABLE_SELECTOR, self.config.wait_timeout).await?;
        let populated = format!(
            "document.querySelectorAll('{}').length > 0",
            INFO_CELL_SELECTOR
        );
        wait_for_mutation(page, &populated, self.config.wait_timeout).await
    }

    /// 定義テーブルの固定位置参照
    ///
    /// セルに安定した識別子がないため、平坦化したセルリストの
    /// 6番目/13番目を位置で読む。サイトのテーブル構造が変わったら
    /// この関数だけを直せばよい。
    async fn read_info_table(&self, page: &Page) -> (String, String) {
        let script = format!(
            r#"
            (() => {{
                const cells = Array.from(document.querySelectorAll('{cells}'));
                const pick = (i) => (cells[i] ? cells[i].innerText : null);
                return JSON.stringify([pick({salary}), pick({turnover})]);
            }})()
            "#,
            cells = INFO_CELL_SELECTOR,
            salary = AVERAGE_SALARY_INDEX,
            turnover = TURNOVER_ENTRY_INDEX,
        );

        let json_str = page
            .evaluate(script.as_str())
            .await
            .ok()
            .and_then(|v| v.into_value::<String>().ok())
            .unwrap_or_else(|| "[null,null]".to_string());

        let cells: Vec<Option<String>> =
            serde_json::from_str(&json_str).unwrap_or_else(|_| vec![None, None]);

        let average_salary = cells
            .first()
            .cloned()
            .flatten()
            .map(|raw| clean_salary(&raw))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let turnover_entry = cells
            .get(1)
            .cloned()
            .flatten()
            .map(|raw| clean_turnover(&raw))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        (average_salary, turnover_entry)
    }

    /// URLへナビゲートし、完了まで期限付きで待つ
    async fn navigate(&self, page: &Page, url: &str) -> Result<(), CrawlError> {
        let nav = async {
            page.goto(url)
                .await
                .map_err(|e| CrawlError::Navigation(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| CrawlError::Navigation(e.to_string()))?;
            Ok::<(), CrawlError>(())
        };

        match tokio::time::timeout(self.config.navigation_timeout, nav).await {
            Ok(result) => result,
            Err(_) => Err(CrawlError::Timeout(format!(
                "{} へのナビゲーションが {:?} を超過しました",
                url, self.config.navigation_timeout
            ))),
        }
    }

    /// 要素をクリックして遷移完了まで期限付きで待つ
    async fn click_through(&self, page: &Page, element: &Element) -> Result<(), CrawlError> {
        let nav = async {
            element
                .click()
                .await
                .map_err(|e| CrawlError::Navigation(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| CrawlError::Navigation(e.to_string()))?;
            Ok::<(), CrawlError>(())
        };

        match tokio::time::timeout(self.config.navigation_timeout, nav).await {
            Ok(result) => result,
            Err(_) => Err(CrawlError::Timeout(format!(
                "会社ページへの遷移が {:?} を超過しました",
                self.config.navigation_timeout
            ))),
        }
    }

    /// デバッグ用フルページスクリーンショット（失敗してもログのみ）
    async fn capture_debug_screenshot(&self, page: &Page) {
        match page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
        {
            Ok(screenshot) => {
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(&screenshot);
                debug!(
                    "Extraction failure screenshot: data:image/png;base64,{}",
                    encoded
                );
            }
            Err(e) => debug!("Failed to capture debug screenshot: {}", e),
        }
    }
}

#[async_trait]
impl Crawler for JobBoardScraper {
    async fn initialize(&mut self) -> Result<(), CrawlError> {
        info!("Initializing browser for job board crawler...");

        // ユニークなユーザーデータディレクトリを生成
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = std::env::temp_dir().join(format!("jobboard-{}", unique_id));

        // Chrome パスを取得
        let chrome_path = std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .unwrap_or_else(|_| "chromium".to_string());

        // ブラウザ設定を構築
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(&user_data_dir)
            .window_size(1280, 800);

        if !self.config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if self.config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder
            .build()
            .map_err(|e| CrawlError::BrowserInit(e.to_string()))?;

        // ブラウザを起動
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CrawlError::BrowserInit(e.to_string()))?;

        // ハンドラータスクを起動
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        self.browser = Some(browser);
        info!("Browser initialized successfully");

        Ok(())
    }

    async fn crawl(&mut self) -> Result<CrawlOutcome, CrawlError> {
        info!("Starting job board crawl...");

        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| CrawlError::BrowserInit("Browser not initialized".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlError::BrowserInit(e.to_string()))?;

        let mut cache = CompanyCache::new();

        // 一覧収集の失敗は空のレコード列で続行（後段のエクスポートは必ず走る）
        let mut records = match self.collect_listing(&page).await {
            Ok(records) => records,
            Err(e) => {
                error!("Error during job list extraction: {}", e);
                Vec::new()
            }
        };
        info!("Collected {} job listings", records.len());

        let extractor = PageDetailExtractor {
            scraper: self,
            page: &page,
        };
        let (export_path, timed_out) =
            run_traversal(&extractor, &mut records, &mut cache, &self.exporter).await;

        // ページを閉じる
        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }

        info!(
            "Crawl finished: {} records, {} companies visited, timed_out={}",
            records.len(),
            cache.len(),
            timed_out
        );

        Ok(CrawlOutcome {
            companies_visited: cache.len(),
            records,
            export_path,
            timed_out,
        })
    }

    async fn close(&mut self) -> Result<(), CrawlError> {
        self.browser = None;
        Ok(())
    }
}

/// 詳細抽出の差し替えシーム
///
/// 巡回ループの打ち切り・続行判定をブラウザなしで検証できるよう、
/// 1レコード分の抽出をトレイト越しに呼び出す。
#[async_trait]
trait DetailExtractor: Sync {
    async fn extract(
        &self,
        record: &mut JobRecord,
        cache: &mut CompanyCache,
    ) -> Result<(), CrawlError>;
}

/// 実ページに対する詳細抽出
struct PageDetailExtractor<'a> {
    scraper: &'a JobBoardScraper,
    page: &'a Page,
}

#[async_trait]
impl DetailExtractor for PageDetailExtractor<'_> {
    async fn extract(
        &self,
        record: &mut JobRecord,
        cache: &mut CompanyCache,
    ) -> Result<(), CrawlError> {
        self.scraper.extract_details(self.page, record, cache).await
    }
}

/// レコード巡回と最終エクスポートの合成
///
/// 収集順にレコードを抽出へ渡し、タイムアウトが返ったら残りの巡回を
/// 打ち切る。それ以外のエラーはログだけ残して続行する。打ち切りの
/// 有無にかかわらず、その時点のレコード列を必ずエクスポートする。
/// 戻り値は (エクスポートパス, タイムアウトで打ち切ったか)。
async fn run_traversal<E: DetailExtractor>(
    extractor: &E,
    records: &mut [JobRecord],
    cache: &mut CompanyCache,
    exporter: &ExportWriter,
) -> (Option<PathBuf>, bool) {
    let mut timed_out = false;

    for record in records.iter_mut() {
        match extractor.extract(record, cache).await {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                // 残りのレコード巡回を打ち切り、収集済みデータの保存へ進む
                timed_out = true;
                break;
            }
            Err(e) => {
                error!("Unexpected extraction error for {}: {}", record.url, e);
            }
        }
    }

    let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();
    let export_path = exporter.save(&rows);

    (export_path, timed_out)
}

/// 一覧抽出スクリプトが返すカード1件分
#[derive(Debug, Deserialize)]
struct ListingCard {
    company: String,
    position: String,
    href: Option<String>,
}

/// 一覧抽出スクリプトのJSONをレコード列に変換
///
/// 相対URLはベースURLに連結して解決し、href欠落は "N/A" のURLにする。
fn records_from_listing_json(json: &str, base_url: &str) -> Result<Vec<JobRecord>, CrawlError> {
    let cards: Vec<ListingCard> =
        serde_json::from_str(json).map_err(|e| CrawlError::Extraction(e.to_string()))?;

    Ok(cards
        .into_iter()
        .map(|card| {
            let url = match card.href {
                Some(href) => format!("{}{}", base_url, href),
                None => NOT_AVAILABLE.to_string(),
            };
            JobRecord::from_listing(card.company, card.position, url)
        })
        .collect())
}

/// 平均年俸テキストの整形（改行除去と「만원」単位サフィックスの除去）
fn clean_salary(raw: &str) -> String {
    raw.trim().replace('\n', "").replacen("만원", "", 1)
}

/// 入退社情報テキストの整形（改行・復帰の除去）
fn clean_turnover(raw: &str) -> String {
    raw.replace(['\n', '\r'], "").trim().to_string()
}
