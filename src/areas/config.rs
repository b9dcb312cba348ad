//! Repository configuration file
//!
//! A minimal reader and writer for the INI-like `config` file inside the
//! git directory. Only plain `[section]` headers and `key = value` lines
//! are understood, which covers everything the storage core writes.

use anyhow::Context;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;

        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut config = Config::new();
        let mut current_section = String::new();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].trim().to_string();
                continue;
            }

            if let Some((key, value)) = line.split_once('=')
                && !current_section.is_empty()
            {
                config.set(&current_section, key.trim(), value.trim());
            }
        }

        config
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (section, entries) in &self.sections {
            out.push_str(&format!("[{section}]\n"));
            for (key, value) in entries {
                out.push_str(&format!("\t{key} = {value}\n"));
            }
        }
        out
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.serialize())
            .with_context(|| format!("unable to write config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_sections_and_values() {
        let config = Config::parse(
            "[core]\n\trepositoryformatversion = 0\n\tbare = false\n\n# comment\n[user]\n\tname = Jane\n",
        );

        assert_eq!(config.get("core", "repositoryformatversion"), Some("0"));
        assert_eq!(config.get("core", "bare"), Some("false"));
        assert_eq!(config.get("user", "name"), Some("Jane"));
        assert_eq!(config.get("user", "email"), None);
    }

    #[test]
    fn serialization_round_trips() {
        let mut config = Config::new();
        config.set("core", "repositoryformatversion", "0");
        config.set("core", "filemode", "false");
        config.set("core", "bare", "false");

        let reparsed = Config::parse(&config.serialize());
        assert_eq!(reparsed.get("core", "repositoryformatversion"), Some("0"));
        assert_eq!(reparsed.get("core", "filemode"), Some("false"));
        assert_eq!(reparsed.get("core", "bare"), Some("false"));
    }
}
