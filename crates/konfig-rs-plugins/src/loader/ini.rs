//! Minimal INI reader: sections become top-level keys holding string values.

use konfig_rs_core::ConfigError;
use serde_json::{Map, Value};

const DEFAULT_SECTION: &str = "DEFAULT";

/// Parse INI text. Keys are lowercased, values stay strings, and entries of
/// the `DEFAULT` section are inherited by every other section.
pub(super) fn parse(contents: &str) -> Result<Map<String, Value>, ConfigError> {
    let mut defaults: Vec<(String, String)> = Vec::new();
    let mut sections: Vec<(String, Vec<(String, String)>)> = Vec::new();
    // index into `sections`, or None for DEFAULT
    let mut current: Option<Option<usize>> = None;
    let mut last_key: Option<String> = None;
    // blank lines seen since `last_key`, kept only if the value continues
    let mut pending_blank = 0;

    for (index, raw_line) in contents.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            if last_key.is_some() {
                pending_blank += 1;
            }
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        let indented = raw_line.starts_with([' ', '\t']);
        if indented && let (Some(key), Some(section)) = (&last_key, current) {
            let entries = match section {
                Some(idx) => &mut sections[idx].1,
                None => &mut defaults,
            };
            if let Some((_, value)) = entries.iter_mut().find(|(k, _)| k == key) {
                for _ in 0..pending_blank {
                    value.push('\n');
                }
                value.push('\n');
                value.push_str(trimmed);
            }
            pending_blank = 0;
            continue;
        }
        pending_blank = 0;

        if let Some(name) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let name = name.trim();
            last_key = None;
            if name == DEFAULT_SECTION {
                current = Some(None);
            } else if sections.iter().any(|(existing, _)| existing == name) {
                return Err(ConfigError::Load(format!(
                    "duplicate INI section '{name}' at line {line_no}"
                )));
            } else {
                sections.push((name.to_string(), Vec::new()));
                current = Some(Some(sections.len() - 1));
            }
            continue;
        }

        let Some(section) = current else {
            return Err(ConfigError::Load(format!(
                "INI entry outside of a section at line {line_no}"
            )));
        };
        let Some(split) = trimmed.find(['=', ':']) else {
            return Err(ConfigError::Load(format!(
                "INI line {line_no} has no '=' or ':' separator"
            )));
        };
        let key = trimmed[..split].trim().to_lowercase();
        let value = trimmed[split + 1..].trim().to_string();
        let entries = match section {
            Some(idx) => &mut sections[idx].1,
            None => &mut defaults,
        };
        if entries.iter().any(|(k, _)| *k == key) {
            return Err(ConfigError::Load(format!(
                "duplicate INI key '{key}' at line {line_no}"
            )));
        }
        entries.push((key.clone(), value));
        last_key = Some(key);
    }

    let mut result = Map::new();
    for (name, entries) in sections {
        let mut section = Map::new();
        for (key, value) in &defaults {
            section.insert(key.clone(), Value::String(value.clone()));
        }
        for (key, value) in entries {
            section.insert(key, Value::String(value));
        }
        result.insert(name, Value::Object(section));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::parse;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn sections_become_mappings_of_strings() {
        let text = "\
# comment
[DEFAULT]
Timeout = 30

[database]
host = db.local
Port: 5432
; another comment

[cache]
timeout = 5
";
        let parsed = parse(text).expect("parse");
        assert_eq!(
            serde_json::Value::Object(parsed),
            json!({
                "database": { "timeout": "30", "host": "db.local", "port": "5432" },
                "cache": { "timeout": "5" }
            })
        );
    }

    #[test]
    fn indented_lines_continue_values() {
        let parsed = parse("[motd]\ntext = hello\n  world\n").expect("parse");
        assert_eq!(parsed["motd"]["text"], json!("hello\nworld"));
    }

    #[test]
    fn blank_lines_inside_continued_values_are_kept() {
        let parsed = parse("[motd]\ntext = hello\n\n  world\n\n\n  again\n\n").expect("parse");
        assert_eq!(parsed["motd"]["text"], json!("hello\n\nworld\n\n\nagain"));
    }

    #[test]
    fn blank_line_before_a_new_key_ends_the_value() {
        let parsed = parse("[motd]\ntext = hello\n\nfooter = bye\n\n[next]\n  \nkey = 1\n")
            .expect("parse");
        assert_eq!(
            serde_json::Value::Object(parsed),
            json!({
                "motd": { "text": "hello", "footer": "bye" },
                "next": { "key": "1" }
            })
        );
    }

    #[test]
    fn entries_need_a_section() {
        let err = parse("key = value\n").unwrap_err();
        assert!(err.to_string().contains("outside of a section"));
    }

    #[test]
    fn duplicate_sections_are_rejected() {
        let err = parse("[a]\nx=1\n[a]\ny=2\n").unwrap_err();
        assert!(err.to_string().contains("duplicate INI section 'a'"));
    }

    #[test]
    fn separator_is_required() {
        assert!(parse("[a]\nflag\n").is_err());
    }
}
