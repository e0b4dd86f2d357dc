use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("JavaScript実行エラー: {0}")]
    JavaScript(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("抽出エラー: {0}")]
    Extraction(String),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("CSV出力エラー: {0}")]
    Csv(#[from] csv::Error),
}

impl CrawlError {
    /// タイムアウト起因のエラーか判定
    ///
    /// ナビゲーションやセレクタ待機の期限超過は残りのレコード巡回を
    /// 打ち切る必要があるため、呼び出し側で他のエラーと区別する。
    pub fn is_timeout(&self) -> bool {
        matches!(self, CrawlError::Timeout(_))
    }
}
