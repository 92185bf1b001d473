//! Texts read from a local directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::hebrew;
use crate::provider::{
    BOOKS, Edition, ProviderError, SAMPLE_SOURCE, TORAH_SOURCE, TextProvider, find_book,
};

/// Leningrad layout: chapters of verses.
#[derive(Debug, Deserialize)]
struct LeningradText {
    text: Vec<Vec<String>>,
}

/// Provider reading book files (and any `<id>.txt`) from a directory.
pub struct LocalTextProvider {
    root: PathBuf,
    edition: Edition,
}

impl LocalTextProvider {
    /// Create a provider rooted at the given texts directory.
    #[must_use]
    pub fn new(root: PathBuf, edition: Edition) -> Self {
        Self { root, edition }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, path: &Path) -> Result<String, ProviderError> {
        fs::read_to_string(path)
            .map_err(|e| ProviderError::ReadError(format!("{}: {e}", path.display())))
    }

    fn load_book(&self, file_name: &str) -> Result<String, ProviderError> {
        let path = self.root.join(file_name);
        let contents = self.read(&path)?;

        match self.edition {
            Edition::Koren => Ok(contents.trim().to_string()),
            Edition::Leningrad => {
                let parsed: LeningradText = serde_json::from_str(&contents)
                    .map_err(|e| ProviderError::ParseError(format!("{}: {e}", path.display())))?;
                let verses: Vec<String> = parsed.text.into_iter().flatten().collect();
                Ok(verses.join(" "))
            }
        }
    }

    /// Path of a free-standing `<id>.txt` text, if the id is a plain name.
    fn custom_path(&self, source_id: &str) -> Option<PathBuf> {
        let plain = !source_id.is_empty()
            && source_id
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
        plain.then(|| self.root.join(format!("{source_id}.txt")))
    }
}

impl TextProvider for LocalTextProvider {
    fn load_text(&self, source_id: &str) -> Result<String, ProviderError> {
        if source_id == SAMPLE_SOURCE {
            return Ok(hebrew::sample_text().to_string());
        }

        if let Some(book) = find_book(source_id) {
            return self.load_book(book.file_name(self.edition));
        }

        if source_id == TORAH_SOURCE {
            let books = BOOKS
                .iter()
                .map(|book| self.load_book(book.file_name(self.edition)))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(books.join(" "));
        }

        match self.custom_path(source_id) {
            Some(path) if path.exists() => Ok(self.read(&path)?.trim().to_string()),
            _ => Err(ProviderError::UnknownSource(source_id.to_string())),
        }
    }

    fn sources(&self) -> Vec<String> {
        let mut ids = vec![SAMPLE_SOURCE.to_string()];
        ids.extend(BOOKS.iter().map(|book| book.id.to_string()));
        ids.push(TORAH_SOURCE.to_string());

        if let Ok(entries) = fs::read_dir(&self.root) {
            let mut custom: Vec<String> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
                .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
                .filter(|id| {
                    let file = format!("{id}.txt");
                    !BOOKS.iter().any(|b| b.koren_file == file)
                })
                .collect();
            custom.sort();
            ids.extend(custom);
        }

        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_leningrad(dir: &Path, file: &str, chapters: &[&[&str]]) {
        let json = serde_json::json!({ "text": chapters });
        fs::write(dir.join(file), json.to_string()).unwrap();
    }

    #[test]
    fn leningrad_book_joins_verses() {
        let dir = TempDir::new().unwrap();
        write_leningrad(
            dir.path(),
            "text_leningrad_1genesis.json",
            &[&["בְּרֵאשִׁית בָּרָא", "אֱלֹהִים"], &["וְהָאָרֶץ"]],
        );

        let provider = LocalTextProvider::new(dir.path().to_path_buf(), Edition::Leningrad);
        let text = provider.load_text("genesis").unwrap();
        assert_eq!(hebrew::normalize(&text), "בראשיתבראאלהיםוהארץ");
    }

    #[test]
    fn koren_book_is_plain_text() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("text_koren_2exodus.txt"), "  ואלה שמות  \n").unwrap();

        let provider = LocalTextProvider::new(dir.path().to_path_buf(), Edition::Koren);
        assert_eq!(provider.load_text("exodus").unwrap(), "ואלה שמות");
    }

    #[test]
    fn torah_concatenates_books() {
        let dir = TempDir::new().unwrap();
        for (i, book) in BOOKS.iter().enumerate() {
            let letter = ["א", "ב", "ג", "ד", "ה"][i];
            fs::write(dir.path().join(book.koren_file), letter).unwrap();
        }

        let provider = LocalTextProvider::new(dir.path().to_path_buf(), Edition::Koren);
        assert_eq!(provider.load_text(TORAH_SOURCE).unwrap(), "א ב ג ד ה");
    }

    #[test]
    fn torah_fails_when_a_book_is_missing() {
        let dir = TempDir::new().unwrap();
        let provider = LocalTextProvider::new(dir.path().to_path_buf(), Edition::Koren);
        assert!(matches!(
            provider.load_text(TORAH_SOURCE),
            Err(ProviderError::ReadError(_))
        ));
    }

    #[test]
    fn missing_book_is_read_error() {
        let dir = TempDir::new().unwrap();
        let provider = LocalTextProvider::new(dir.path().to_path_buf(), Edition::Leningrad);
        assert!(matches!(
            provider.load_text("genesis"),
            Err(ProviderError::ReadError(_))
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("text_leningrad_3leviticus.json"), "not json").unwrap();
        let provider = LocalTextProvider::new(dir.path().to_path_buf(), Edition::Leningrad);
        assert!(matches!(
            provider.load_text("leviticus"),
            Err(ProviderError::ParseError(_))
        ));
    }

    #[test]
    fn custom_text_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("psalms.txt"), "מזמור לדוד").unwrap();

        let provider = LocalTextProvider::new(dir.path().to_path_buf(), Edition::Leningrad);
        assert_eq!(provider.load_text("psalms").unwrap(), "מזמור לדוד");
        assert!(provider.sources().contains(&"psalms".to_string()));
    }

    #[test]
    fn path_like_ids_are_unknown() {
        let dir = TempDir::new().unwrap();
        let provider = LocalTextProvider::new(dir.path().to_path_buf(), Edition::Leningrad);
        assert!(matches!(
            provider.load_text("../secret"),
            Err(ProviderError::UnknownSource(_))
        ));
        assert!(matches!(
            provider.load_text("nothing"),
            Err(ProviderError::UnknownSource(_))
        ));
    }

    #[test]
    fn sample_needs_no_files() {
        let provider = LocalTextProvider::new(PathBuf::from("/nonexistent"), Edition::Leningrad);
        assert!(provider.load_text(SAMPLE_SOURCE).is_ok());
        assert_eq!(provider.sources()[0], SAMPLE_SOURCE);
    }
}
