use anyhow::{Context, Result};
use std::path::Path;

use daletou_db::codec::{HEADER, decode};
use daletou_db::db::HistoryStore;
use daletou_db::reconcile::Reconciler;

use crate::advisor::AnalysisService;

pub struct ImportResult {
    pub total_lines: usize,
    pub parsed: usize,
    pub malformed: usize,
    pub rejected: usize,
    pub added: usize,
    pub total: usize,
}

fn data_lines(text: &str) -> usize {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with(HEADER[0]))
        .count()
}

pub fn import_csv<S: HistoryStore>(reconciler: &mut Reconciler<S>, path: &Path) -> Result<ImportResult> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let total_lines = data_lines(&text);
    let records = decode(&text);
    let parsed = records.len();
    let summary = reconciler.apply(records)?;

    Ok(ImportResult {
        total_lines,
        parsed,
        malformed: total_lines.saturating_sub(parsed),
        rejected: summary.rejected,
        added: summary.added,
        total: summary.total,
    })
}

/// Import d'un texte libre : le service d'analyse en extrait les tirages,
/// qui passent ensuite par la même validation qu'un fichier CSV.
pub async fn import_text<S, A>(reconciler: &mut Reconciler<S>, service: &A, path: &Path) -> Result<ImportResult>
where
    S: HistoryStore,
    A: AnalysisService + ?Sized,
{
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let total_lines = text.lines().filter(|l| !l.trim().is_empty()).count();

    let records = service
        .parse_history(&text)
        .await
        .context("Le service n'a pas pu interpréter le texte")?;
    let parsed = records.len();
    let summary = reconciler.apply(records)?;

    Ok(ImportResult {
        total_lines,
        parsed,
        malformed: total_lines.saturating_sub(parsed),
        rejected: summary.rejected,
        added: summary.added,
        total: summary.total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use async_trait::async_trait;
    use daletou_db::db::MemoryStore;
    use daletou_db::models::{DrawRecord, make_test_record};

    use crate::advisor::{AdvisorError, Analysis};

    /// Service qui renvoie toujours les mêmes tirages, quel que soit le texte.
    struct CannedParser(Vec<DrawRecord>);

    #[async_trait]
    impl AnalysisService for CannedParser {
        async fn analyze(&self, _: &[DrawRecord], _: u32) -> Result<Analysis, AdvisorError> {
            Ok(Analysis::fallback())
        }

        async fn parse_history(&self, _: &str) -> Result<Vec<DrawRecord>, AdvisorError> {
            if self.0.is_empty() {
                return Err(AdvisorError::Empty);
            }
            Ok(self.0.clone())
        }
    }

    fn pasted_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "第25002期 2025-01-03 前区 03 09 17 22 30 后区 04 11\n\
             第25001期 2025-01-01 前区 01 02 03 04 40 后区 01 02\n"
        )
        .unwrap();
        file
    }

    #[test]
    fn test_import_counts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "id,date,f1,f2,f3,f4,f5,b1,b2\n\
             25003,2025-01-06,1,2,3,4,5,1,2\n\
             25002,2025-01-03,1,2,3,4,40,1,2\n\
             25001,2025-01-01,1,2,3\n"
        )
        .unwrap();

        let mut reconciler = Reconciler::bootstrap(MemoryStore::default(), Vec::new()).unwrap();
        let seeded = reconciler.history().len();
        let result = import_csv(&mut reconciler, file.path()).unwrap();

        assert_eq!(result.total_lines, 3);
        assert_eq!(result.parsed, 2);
        assert_eq!(result.malformed, 1);
        assert_eq!(result.rejected, 1);
        assert_eq!(result.added, 1);
        assert_eq!(result.total, seeded + 1);
        assert!(reconciler.history().get("25003").is_some());
    }

    #[tokio::test]
    async fn test_import_text_validates_parsed_records() {
        let service = CannedParser(vec![
            make_test_record("25002", [3, 9, 17, 22, 30], [4, 11]),
            make_test_record("25001", [1, 2, 3, 4, 40], [1, 2]),
        ]);
        let file = pasted_file();
        let mut reconciler = Reconciler::bootstrap(MemoryStore::default(), Vec::new()).unwrap();
        let seeded = reconciler.history().len();

        let result = import_text(&mut reconciler, &service, file.path()).await.unwrap();

        assert_eq!(result.total_lines, 2);
        assert_eq!(result.parsed, 2);
        assert_eq!(result.rejected, 1);
        assert_eq!(result.added, 1);
        assert_eq!(result.total, seeded + 1);
        assert!(reconciler.history().get("25002").is_some());
        assert!(reconciler.history().get("25001").is_none());
    }

    #[tokio::test]
    async fn test_import_text_service_failure_keeps_history() {
        let file = pasted_file();
        let mut reconciler = Reconciler::bootstrap(MemoryStore::default(), Vec::new()).unwrap();
        let before = reconciler.history().clone();

        assert!(import_text(&mut reconciler, &CannedParser(Vec::new()), file.path()).await.is_err());
        assert_eq!(reconciler.history(), &before);
    }

    #[test]
    fn test_import_missing_file() {
        let mut reconciler = Reconciler::bootstrap(MemoryStore::default(), Vec::new()).unwrap();
        assert!(import_csv(&mut reconciler, Path::new("/nonexistent.csv")).is_err());
    }
}
