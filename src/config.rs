use std::path::PathBuf;
use std::time::Duration;

/// 求人一覧ページのデフォルトURL（ローカルインスタンス想定）
pub const DEFAULT_WEB_URL: &str = "http://localhost:3000/home";
/// 相対リンク解決用ベースURLのデフォルト
pub const DEFAULT_BASE_WEB_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// 求人一覧ページのURL
    pub listing_url: String,
    /// 相対リンク解決用のベースURL
    pub base_url: String,
    /// CSVエクスポート先ディレクトリ
    pub export_dir: PathBuf,
    /// ヘッドレスモード
    pub headless: bool,
    /// デバッグモード（失敗時スクリーンショットなど）
    pub debug: bool,
    /// ナビゲーションのタイムアウト
    pub navigation_timeout: Duration,
    /// セレクタ/DOM変化待機のタイムアウト
    pub wait_timeout: Duration,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_WEB_URL.to_string(),
            base_url: DEFAULT_BASE_WEB_URL.to_string(),
            export_dir: PathBuf::from("./exports"),
            headless: true,
            debug: false,
            navigation_timeout: Duration::from_secs(30),
            wait_timeout: Duration::from_secs(30),
        }
    }
}

impl CrawlerConfig {
    pub fn new(listing_url: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            listing_url: listing_url.into(),
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// 環境変数から設定を構築（WEB_URL / BASE_WEB_URL、未設定時はデフォルト）
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("WEB_URL") {
            config.listing_url = url;
        }
        if let Ok(url) = std::env::var("BASE_WEB_URL") {
            config.base_url = url;
        }
        config
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }
}
