use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use daletou_db::codec::decode;
use daletou_db::models::DrawRecord;

/// Un chemin relatif absent du répertoire courant est cherché à côté de l'exécutable.
pub fn resolve_static_path(path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(path)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Lit le jeu de données embarqué. Toute erreur de lecture donne un résultat vide.
pub async fn read_static(path: &Path) -> Vec<DrawRecord> {
    let path = resolve_static_path(path);
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => {
            let records = decode(&text);
            debug!("{} tirages lus depuis {:?}", records.len(), path);
            records
        }
        Err(e) => {
            warn!("Lecture de {:?} impossible, jeu statique ignoré : {}", path, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_static_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "id,date,f1,f2,f3,f4,f5,b1,b2\n24002,2024-01-03,3,9,17,22,30,4,11\nbroken line\n24001,2024-01-01,1,2,3,4,5,1,2\n"
        )
        .unwrap();

        let records = read_static(file.path()).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_str(), "24002");
        assert_eq!(records[0].front, [3, 9, 17, 22, 30]);
    }

    #[tokio::test]
    async fn test_bundled_dataset() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../assets/history.csv");
        let records = read_static(&path).await;
        assert!(records.len() > 100);
        assert!(records.iter().all(|r| r.validate().is_ok()));
        assert!(records.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[test]
    fn test_resolve_keeps_existing_and_unknown_paths() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(resolve_static_path(file.path()), file.path());

        let missing = Path::new("nulle-part/history.csv");
        assert_eq!(resolve_static_path(missing), missing);
    }

    #[tokio::test]
    async fn test_read_static_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let records = read_static(&dir.path().join("absent.csv")).await;
        assert!(records.is_empty());
    }
}
