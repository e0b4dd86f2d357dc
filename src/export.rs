//! CSVエクスポート
//!
//! 9列固定スキーマのCSVを、タイムスタンプ付きパスへBOM付きUTF-8で書き出す。
//! エクスポートは常にベストエフォートで、失敗してもクロールを落とさない。

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{error, info};

use crate::error::CrawlError;
use crate::jobboard::types::{CompanyDetail, JobRecord};

/// UTF-8 バイトオーダーマーク
///
/// 非UTF-8ロケールの表計算ソフトでも非ASCII文字が化けないよう先頭に付与する。
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// ヘッダ行（この順序で固定）
pub const CSV_HEADERS: [&str; 9] = [
    "Company",
    "Position",
    "URL",
    "Tech Details",
    "Location",
    "Founded Year",
    "Features",
    "Average Salary",
    "Turnover Entry",
];

/// エクスポートの1行分
///
/// 入力側の型が何であれ、この構造体への変換で列順を固定する。
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
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

impl From<&JobRecord> for ExportRow {
    fn from(record: &JobRecord) -> Self {
        Self {
            company: record.company.clone(),
            position: record.position.clone(),
            url: record.url.clone(),
            tech_details: record.tech_details.clone(),
            location: record.location.clone(),
            founded_year: record.founded_year.clone(),
            features: record.features.clone(),
            average_salary: record.average_salary.clone(),
            turnover_entry: record.turnover_entry.clone(),
        }
    }
}

/// キャッシュスナップショット用。会社ページ由来の列だけが埋まる
impl From<&CompanyDetail> for ExportRow {
    fn from(detail: &CompanyDetail) -> Self {
        Self {
            company: detail.company_name.clone(),
            position: String::new(),
            url: String::new(),
            tech_details: detail.tech_details.clone(),
            location: String::new(),
            founded_year: detail.info.founded_year.clone(),
            features: detail.info.features.clone(),
            average_salary: detail.info.average_salary.clone(),
            turnover_entry: detail.info.turnover_entry.clone(),
        }
    }
}

/// CSVエクスポートライタ
#[derive(Debug, Clone)]
pub struct ExportWriter {
    export_dir: PathBuf,
}

impl Default for ExportWriter {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("./exports"),
        }
    }
}

impl ExportWriter {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    /// ベストエフォートのエクスポート
    ///
    /// 失敗はログに残すだけで呼び出し元へは伝播させない。
    pub fn save(&self, rows: &[ExportRow]) -> Option<PathBuf> {
        match self.write_rows(rows) {
            Ok(path) => {
                info!("Job data saved to {}", path.display());
                Some(path)
            }
            Err(e @ CrawlError::Csv(_)) => {
                error!("Error generating CSV output: {}", e);
                None
            }
            Err(e) => {
                error!("Error while saving CSV data: {}", e);
                None
            }
        }
    }

    /// ヘッダ + 全行をBOM付きで書き込み、出力パスを返す
    ///
    /// 0行でもヘッダ行は必ず書く。
    pub fn write_rows(&self, rows: &[ExportRow]) -> Result<PathBuf, CrawlError> {
        std::fs::create_dir_all(&self.export_dir)?;
        let path = self.export_dir.join(timestamped_filename(&Local::now()));

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(CSV_HEADERS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        let csv_bytes = writer
            .into_inner()
            .map_err(|e| CrawlError::Extraction(e.to_string()))?;

        let mut file_bytes = Vec::with_capacity(UTF8_BOM.len() + csv_bytes.len());
        file_bytes.extend_from_slice(UTF8_BOM);
        file_bytes.extend_from_slice(&csv_bytes);
        std::fs::write(&path, file_bytes)?;

        Ok(path)
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }
}

/// 分単位のタイムスタンプを含むファイル名（job_list_YYYYMMDD_HHMM.csv）
fn timestamped_filename(now: &DateTime<Local>) -> String {
    format!("job_list_{}.csv", now.format("%Y%m%d_%H%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::jobboard::types::{CompanyInfo, NOT_AVAILABLE, SKIPPED};

    /// テスト間で衝突しないエクスポート先を作る
    fn unique_export_dir(label: &str) -> PathBuf {
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        std::env::temp_dir().join(format!("jobboard-export-{}-{}", label, unique_id))
    }

    fn sample_record() -> JobRecord {
        let mut record = JobRecord::from_listing("Acme", "백엔드 엔지니어", "http://x/jobs/1");
        record.tech_details = "Rust / Tokio".to_string();
        record.location = "서울".to_string();
        record.founded_year = "2015-01-01".to_string();
        record.features = "재택근무 / 스톡옵션".to_string();
        record.average_salary = "5000".to_string();
        record.turnover_entry = "입사 12 / 퇴사 3".to_string();
        record
    }

    #[test]
    fn test_file_starts_with_bom_and_header() {
        let dir = unique_export_dir("bom");
        let writer = ExportWriter::new(&dir);
        let rows = vec![ExportRow::from(&sample_record())];

        let path = writer.write_rows(&rows).expect("write failed");
        let bytes = std::fs::read(&path).expect("read failed");

        assert_eq!(&bytes[..3], UTF8_BOM);
        let text = String::from_utf8(bytes[3..].to_vec()).expect("invalid utf8");
        let header = text.lines().next().expect("empty file");
        assert_eq!(
            header,
            "Company,Position,URL,Tech Details,Location,Founded Year,Features,Average Salary,Turnover Entry"
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_header_written_even_for_zero_rows() {
        let dir = unique_export_dir("empty");
        let writer = ExportWriter::new(&dir);

        let path = writer.write_rows(&[]).expect("write failed");
        let bytes = std::fs::read(&path).expect("read failed");
        let text = String::from_utf8(bytes[3..].to_vec()).expect("invalid utf8");

        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Company,"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_row_values_follow_header_order() {
        let dir = unique_export_dir("order");
        let writer = ExportWriter::new(&dir);
        let rows = vec![ExportRow::from(&sample_record())];

        let path = writer.write_rows(&rows).expect("write failed");
        let bytes = std::fs::read(&path).expect("read failed");
        let text = String::from_utf8(bytes[3..].to_vec()).expect("invalid utf8");
        let data_line = text.lines().nth(1).expect("missing data row");

        assert!(data_line.starts_with("Acme,백엔드 엔지니어,http://x/jobs/1,Rust / Tokio,서울,"));
        assert!(data_line.ends_with("입사 12 / 퇴사 3"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_swallows_write_failure() {
        // 通常ファイルをディレクトリとして指定し、create_dir_all を失敗させる
        let base = unique_export_dir("fail");
        std::fs::create_dir_all(&base).expect("setup failed");
        let blocker = base.join("not-a-dir");
        std::fs::write(&blocker, b"x").expect("setup failed");

        let writer = ExportWriter::new(&blocker);
        assert!(writer.save(&[]).is_none());

        std::fs::remove_dir_all(&base).ok();
    }

    #[test]
    fn test_export_row_from_company_detail() {
        let detail = CompanyDetail {
            company_name: "Acme".to_string(),
            tech_details: "Rust Kubernetes".to_string(),
            info: CompanyInfo {
                founded_year: "2015-01-01".to_string(),
                features: "재택근무".to_string(),
                average_salary: "5000".to_string(),
                turnover_entry: NOT_AVAILABLE.to_string(),
            },
        };

        let row = ExportRow::from(&detail);
        assert_eq!(row.company, "Acme");
        assert_eq!(row.position, "");
        assert_eq!(row.url, "");
        assert_eq!(row.location, "");
        assert_eq!(row.tech_details, "Rust Kubernetes");
        assert_eq!(row.founded_year, "2015-01-01");
        assert_eq!(row.turnover_entry, NOT_AVAILABLE);
    }

    #[test]
    fn test_export_row_preserves_sentinels() {
        let mut record = sample_record();
        record.tech_details = SKIPPED.to_string();
        record.founded_year = SKIPPED.to_string();

        let row = ExportRow::from(&record);
        assert_eq!(row.tech_details, SKIPPED);
        assert_eq!(row.founded_year, SKIPPED);
    }

    #[test]
    fn test_timestamped_filename_format() {
        let at = Local.with_ymd_and_hms(2026, 8, 28, 9, 5, 30).unwrap();
        assert_eq!(timestamped_filename(&at), "job_list_20260828_0905.csv");
    }
}
