//! Internationalization (i18n) of interface strings
//!
//! English and Brazilian Portuguese ship with the binary; a site can add or
//! override languages with YAML files in its `languages/` directory.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUILTIN: [(&str, &str); 2] = [
    ("en", include_str!("en.yml")),
    ("pt-BR", include_str!("pt-BR.yml")),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, String>>,
}

impl I18n {
    /// Create a handler with the built-in languages loaded
    pub fn new(language: &str) -> Self {
        let mut i18n = Self {
            language: language.to_string(),
            translations: HashMap::new(),
        };
        for (lang, content) in BUILTIN {
            if let Err(e) = i18n.add_language(lang, content) {
                tracing::warn!("Invalid built-in language {}: {}", lang, e);
            }
        }
        i18n
    }

    /// Parse a YAML string table and merge it over any existing entries
    pub fn add_language(&mut self, lang: &str, content: &str) -> Result<()> {
        let data: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(content)?;
        let table = self.translations.entry(lang.to_string()).or_default();
        for (key, value) in data {
            table.insert(key, yaml_value_to_string(&value));
        }
        Ok(())
    }

    /// Load language files (`<lang>.yml`) from a directory
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path)?;
            match self.add_language(lang, &content) {
                Ok(()) => tracing::debug!("Loaded language file: {:?}", path),
                Err(e) => tracing::warn!("Failed to parse language file {:?}: {}", path, e),
            }
        }

        Ok(())
    }

    /// Get a translation by key
    pub fn get(&self, key: &str) -> String {
        for lang in self.lookup_order() {
            if let Some(value) = self.translations.get(lang).and_then(|t| t.get(key)) {
                return value.clone();
            }
        }

        // Return key as fallback
        key.to_string()
    }

    /// Get a translation with `%d` replaced by a count
    pub fn get_count(&self, key: &str, count: usize) -> String {
        self.get(key).replace("%d", &count.to_string())
    }

    /// All translations for the current language, English filling the gaps
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut result = HashMap::new();
        for lang in self.lookup_order() {
            if let Some(table) = self.translations.get(lang) {
                for (k, v) in table {
                    result.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
        }
        result
    }

    /// Exact tag, then its base language (`pt-BR` -> `pt`), then English
    fn lookup_order(&self) -> Vec<&str> {
        let mut order = vec![self.language.as_str()];
        if let Some((base, _)) = self.language.split_once('-') {
            order.push(base);
        }
        if !order.contains(&"en") {
            order.push("en");
        }
        order
    }
}

/// Convert a YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("en")
    }
}
