//! 求人クロール関連の型定義

use std::path::PathBuf;

/// 未解決フィールドのセンチネル値
pub const NOT_AVAILABLE: &str = "N/A";
/// 重複により意図的にスキップしたフィールドのセンチネル値
pub const SKIPPED: &str = "-";

/// 技術スタックテキストの保持上限（文字数）
pub const TECH_DETAILS_MAX_CHARS: usize = 100;

/// 求人レコード（エクスポートの1行分）
///
/// 全フィールドが常に値を持つ。欠損は `"N/A"`、重複スキップは `"-"` で
/// 表現し、未設定状態を作らない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub company: String,
    pub position: String,
    pub url: String,
    pub tech_details: String,
    pub location: String,
    pub founded_year: String,
    pub features: String,
    pub average_salary: String,
    pub turnover_entry: String,
}

impl JobRecord {
    /// 一覧ページから取れる3フィールドだけを埋めてレコードを作成
    pub fn from_listing(
        company: impl Into<String>,
        position: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            position: position.into(),
            url: url.into(),
            tech_details: NOT_AVAILABLE.to_string(),
            location: NOT_AVAILABLE.to_string(),
            founded_year: NOT_AVAILABLE.to_string(),
            features: NOT_AVAILABLE.to_string(),
            average_salary: NOT_AVAILABLE.to_string(),
            turnover_entry: NOT_AVAILABLE.to_string(),
        }
    }

    /// 詳細抽出に失敗したレコードの6フィールドを "N/A" に戻す
    pub fn mark_unresolved(&mut self) {
        self.tech_details = NOT_AVAILABLE.to_string();
        self.location = NOT_AVAILABLE.to_string();
        self.founded_year = NOT_AVAILABLE.to_string();
        self.features = NOT_AVAILABLE.to_string();
        self.average_salary = NOT_AVAILABLE.to_string();
        self.turnover_entry = NOT_AVAILABLE.to_string();
    }
}

/// 会社ページから抽出する4フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyInfo {
    pub founded_year: String,
    pub features: String,
    pub average_salary: String,
    pub turnover_entry: String,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            founded_year: NOT_AVAILABLE.to_string(),
            features: NOT_AVAILABLE.to_string(),
            average_salary: NOT_AVAILABLE.to_string(),
            turnover_entry: NOT_AVAILABLE.to_string(),
        }
    }
}

impl CompanyInfo {
    /// 重複会社用。「未知」ではなく「再取得しない」ことを示す "-" で埋める
    pub fn skipped() -> Self {
        Self {
            founded_year: SKIPPED.to_string(),
            features: SKIPPED.to_string(),
            average_salary: SKIPPED.to_string(),
            turnover_entry: SKIPPED.to_string(),
        }
    }
}

/// 重複チェックキャッシュのエントリ
///
/// 会社ページの訪問に成功した時点で作成され、以後変更されない。
/// 後続レコードの再訪問を抑止する存在チェック専用で、値の再利用はしない。
#[derive(Debug, Clone)]
pub struct CompanyDetail {
    pub company_name: String,
    pub tech_details: String,
    pub info: CompanyInfo,
}

/// 会社重複チェックキャッシュ（1回のクロールにスコープ）
///
/// 訪問済み会社と技術スタック署名の membership を記録する。
/// 挿入順はレコード巡回順と一致し、「最初の出現が勝つ」が成立する。
#[derive(Debug, Default)]
pub struct CompanyCache {
    entries: Vec<CompanyDetail>,
}

impl CompanyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 会社名が既に処理済みか
    pub fn contains_company(&self, company_name: &str) -> bool {
        self.entries
            .iter()
            .any(|detail| detail.company_name == company_name)
    }

    /// 同一の技術スタック署名が既に記録されているか（バイト一致）
    pub fn contains_tech_details(&self, tech_details: &str) -> bool {
        self.entries
            .iter()
            .any(|detail| detail.tech_details == tech_details)
    }

    pub fn insert(&mut self, detail: CompanyDetail) {
        self.entries.push(detail);
    }

    pub fn entries(&self) -> &[CompanyDetail] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// クロール結果のサマリ
#[derive(Debug)]
pub struct CrawlOutcome {
    /// 収集した求人レコード（収集順のまま）
    pub records: Vec<JobRecord>,
    /// 会社ページまで訪問した会社数
    pub companies_visited: usize,
    /// エクスポートファイルのパス（書き込み失敗時は None）
    pub export_path: Option<PathBuf>,
    /// ナビゲーションタイムアウトで巡回を打ち切ったか
    pub timed_out: bool,
}

/// 技術スタックテキストの正規化
///
/// トリム後、改行を空白に潰して先頭100文字に切り詰める。
/// この値がそのまま重複判定の署名になる。
pub fn normalize_tech_details(raw: &str) -> String {
    raw.trim()
        .replace('\n', " ")
        .chars()
        .take(TECH_DETAILS_MAX_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_listing_fills_all_fields() {
        let record = JobRecord::from_listing("Acme", "Backend Engineer", "http://x/jobs/1");
        assert_eq!(record.company, "Acme");
        assert_eq!(record.position, "Backend Engineer");
        assert_eq!(record.url, "http://x/jobs/1");
        // 未エンリッチのフィールドも必ずセンチネルで埋まる
        assert_eq!(record.tech_details, NOT_AVAILABLE);
        assert_eq!(record.location, NOT_AVAILABLE);
        assert_eq!(record.founded_year, NOT_AVAILABLE);
        assert_eq!(record.features, NOT_AVAILABLE);
        assert_eq!(record.average_salary, NOT_AVAILABLE);
        assert_eq!(record.turnover_entry, NOT_AVAILABLE);
    }

    #[test]
    fn test_mark_unresolved_resets_enriched_fields() {
        let mut record = JobRecord::from_listing("Acme", "Dev", "http://x/jobs/1");
        record.tech_details = "Rust / Tokio".to_string();
        record.location = "Seoul".to_string();
        record.founded_year = "2015-01-01".to_string();
        record.mark_unresolved();

        assert_eq!(record.tech_details, NOT_AVAILABLE);
        assert_eq!(record.location, NOT_AVAILABLE);
        assert_eq!(record.founded_year, NOT_AVAILABLE);
        // 一覧由来の3フィールドは保持される
        assert_eq!(record.company, "Acme");
        assert_eq!(record.position, "Dev");
        assert_eq!(record.url, "http://x/jobs/1");
    }

    #[test]
    fn test_company_cache_membership() {
        let mut cache = CompanyCache::new();
        assert!(!cache.contains_company("Acme"));

        cache.insert(CompanyDetail {
            company_name: "Acme".to_string(),
            tech_details: "Rust Kubernetes AWS".to_string(),
            info: CompanyInfo::default(),
        });

        assert!(cache.contains_company("Acme"));
        assert!(!cache.contains_company("Globex"));
        assert!(cache.contains_tech_details("Rust Kubernetes AWS"));
        assert!(!cache.contains_tech_details("Rust Kubernetes"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_company_info_skipped() {
        let info = CompanyInfo::skipped();
        assert_eq!(info.founded_year, SKIPPED);
        assert_eq!(info.features, SKIPPED);
        assert_eq!(info.average_salary, SKIPPED);
        assert_eq!(info.turnover_entry, SKIPPED);
    }

    #[test]
    fn test_normalize_tech_details_truncates() {
        let raw = "a".repeat(250);
        let normalized = normalize_tech_details(&raw);
        assert_eq!(normalized.chars().count(), TECH_DETAILS_MAX_CHARS);
    }

    #[test]
    fn test_normalize_tech_details_collapses_newlines() {
        let normalized = normalize_tech_details("  Rust\nTokio\nKubernetes  ");
        assert_eq!(normalized, "Rust Tokio Kubernetes");
        assert!(!normalized.contains('\n'));
    }

    #[test]
    fn test_normalize_tech_details_short_input() {
        assert_eq!(normalize_tech_details("Rust"), "Rust");
        assert_eq!(normalize_tech_details(""), "");
    }
}
