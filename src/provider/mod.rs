//! Text provider trait and built-in providers.
//!
//! The engine only needs raw, un-normalized text for a source identifier.
//! This module defines that contract, the catalog of known sources, and two
//! in-process providers; [`local`] reads texts from a directory on disk.

pub mod local;

use std::collections::HashMap;

use serde::Deserialize;

use crate::hebrew;

/// Identifier of the built-in sample text.
pub const SAMPLE_SOURCE: &str = "sample";

/// Identifier of the five books concatenated.
pub const TORAH_SOURCE: &str = "torah";

/// Errors that can occur while loading a text.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Unknown text source: {0}")]
    UnknownSource(String),

    #[error("Failed to read: {0}")]
    ReadError(String),

    #[error("Failed to parse: {0}")]
    ParseError(String),
}

/// Supplier of raw source text (books, combined corpora, fixtures).
pub trait TextProvider: Send + Sync {
    /// Load the raw text of `source_id`.
    ///
    /// Repeated calls for the same identifier must return equivalent text;
    /// the engine caches by identifier alone.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the source is unknown or cannot be read.
    fn load_text(&self, source_id: &str) -> Result<String, ProviderError>;

    /// Identifiers this provider can resolve.
    fn sources(&self) -> Vec<String>;
}

/// Published edition a book file follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    /// Leningrad Codex, JSON chapters of verses.
    #[default]
    Leningrad,
    /// Koren edition, plain text.
    Koren,
}

/// A book of the Torah and its file names in each edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Book {
    pub id: &'static str,
    pub hebrew_name: &'static str,
    pub english_name: &'static str,
    pub number: u8,
    pub koren_file: &'static str,
    pub leningrad_file: &'static str,
}

impl Book {
    #[must_use]
    pub fn file_name(&self, edition: Edition) -> &'static str {
        match edition {
            Edition::Leningrad => self.leningrad_file,
            Edition::Koren => self.koren_file,
        }
    }
}

pub const BOOKS: [Book; 5] = [
    Book {
        id: "genesis",
        hebrew_name: "בראשית",
        english_name: "Genesis",
        number: 1,
        koren_file: "text_koren_1genesis.txt",
        leningrad_file: "text_leningrad_1genesis.json",
    },
    Book {
        id: "exodus",
        hebrew_name: "שמות",
        english_name: "Exodus",
        number: 2,
        koren_file: "text_koren_2exodus.txt",
        leningrad_file: "text_leningrad_2exodus.json",
    },
    Book {
        id: "leviticus",
        hebrew_name: "ויקרא",
        english_name: "Leviticus",
        number: 3,
        koren_file: "text_koren_3leviticus.txt",
        leningrad_file: "text_leningrad_3leviticus.json",
    },
    Book {
        id: "numbers",
        hebrew_name: "במדבר",
        english_name: "Numbers",
        number: 4,
        koren_file: "text_koren_4numbers.txt",
        leningrad_file: "text_leningrad_4numbers.json",
    },
    Book {
        id: "deuteronomy",
        hebrew_name: "דברים",
        english_name: "Deuteronomy",
        number: 5,
        koren_file: "text_koren_5deuteronomy.txt",
        leningrad_file: "text_leningrad_5deuteronomy.json",
    },
];

#[must_use]
pub fn find_book(id: &str) -> Option<&'static Book> {
    BOOKS.iter().find(|book| book.id == id)
}

/// Provider that only knows the built-in sample text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleTextProvider;

impl TextProvider for SampleTextProvider {
    fn load_text(&self, source_id: &str) -> Result<String, ProviderError> {
        if source_id == SAMPLE_SOURCE {
            Ok(hebrew::sample_text().to_string())
        } else {
            Err(ProviderError::UnknownSource(source_id.to_string()))
        }
    }

    fn sources(&self) -> Vec<String> {
        vec![SAMPLE_SOURCE.to_string()]
    }
}

/// Provider over texts held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTextProvider {
    texts: HashMap<String, String>,
}

impl MemoryTextProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_text(mut self, source_id: &str, text: &str) -> Self {
        self.insert(source_id, text);
        self
    }

    pub fn insert(&mut self, source_id: &str, text: &str) {
        self.texts.insert(source_id.to_string(), text.to_string());
    }
}

impl TextProvider for MemoryTextProvider {
    fn load_text(&self, source_id: &str) -> Result<String, ProviderError> {
        self.texts
            .get(source_id)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownSource(source_id.to_string()))
    }

    fn sources(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.texts.keys().cloned().collect();
        ids.sort();
        ids
    }
}
