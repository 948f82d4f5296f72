use std::collections::HashMap;

use crate::models::Language;

const EN: &str = include_str!("../../assets/lang/en.json");
const PT: &str = include_str!("../../assets/lang/pt.json");

/// A language's string table. Lookups take an English fallback, so a broken table never blanks the UI.
#[derive(Debug, Clone, Default)]
pub struct Strings {
    table: HashMap<String, String>,
}

impl Strings {
    pub fn load(language: Language) -> Self {
        let raw = match language {
            Language::En => EN,
            Language::Pt => PT,
        };
        match serde_json::from_str::<HashMap<String, String>>(raw) {
            Ok(table) => {
                let strings = Strings { table };
                tracing::trace!(language = language.code(), keys = strings.len(), "string table loaded");
                strings
            }
            Err(err) => {
                tracing::error!(language = language.code(), error = %err, "failed to parse string table");
                Strings::default()
            }
        }
    }

    pub fn get<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.table.get(key).map(String::as_str).unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
