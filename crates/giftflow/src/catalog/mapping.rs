//! Mapping Store: ordered pattern -> game code rules plus the fallback code.
//!
//! Loaded from a YAML file shaped like:
//!
//! ```yaml
//! gamecode:
//!   "wc4": ADAE
//!   "(?:pgt|pgf)": CPUE
//! fallbacks:
//!   default_gamecode: ADAE
//! ```
//!
//! Rule order is the order of the `gamecode` mapping in the file.

use super::error::{CatalogError, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Game code used when no event or rule matches and the mapping file
/// does not name its own default.
pub const DEFAULT_GAMECODE: &str = "ADAE";

/// One pattern -> code rule.
///
/// The pattern is compiled once, case-insensitively. A pattern that does not
/// compile is kept in position but never matches.
#[derive(Debug, Clone)]
pub struct MappingRule {
    pub pattern: String,
    pub code: String,
    matcher: Option<Regex>,
}

impl MappingRule {
    pub fn new(pattern: impl Into<String>, code: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let code = code.into();
        let matcher = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!("{}", rejected_pattern_message(&pattern, &code, &err));
                None
            }
        };
        Self {
            pattern,
            code,
            matcher,
        }
    }

    /// Search the pattern anywhere in `haystack`.
    pub fn is_match(&self, haystack: &str) -> bool {
        self.matcher
            .as_ref()
            .map(|regex| regex.is_match(haystack))
            .unwrap_or(false)
    }

    /// Whether the pattern compiled.
    pub fn is_valid(&self) -> bool {
        self.matcher.is_some()
    }
}

/// Patterns are compiled by the Rust `regex` crate, which has no look-around
/// or backreferences. Mapping files written for Python `re` need migrating.
fn rejected_pattern_message(pattern: &str, code: &str, err: &regex::Error) -> String {
    format!(
        "Mapping pattern '{}' (-> {}) is not valid Rust `regex` syntax and will never match. \
         Look-around and backreferences from Python `re` are unsupported; rewrite the pattern. {}",
        pattern, code, err
    )
}

/// Read-only pattern rules and fallback code.
#[derive(Debug, Clone)]
pub struct MappingStore {
    rules: Vec<MappingRule>,
    default_code: String,
}

impl Default for MappingStore {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_code: DEFAULT_GAMECODE.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MappingFile {
    #[serde(default)]
    gamecode: Option<Mapping>,
    #[serde(default)]
    fallbacks: Option<Fallbacks>,
}

#[derive(Debug, Default, Deserialize)]
struct Fallbacks {
    #[serde(default)]
    default_gamecode: Option<Value>,
}

impl MappingStore {
    /// Build a store from rules in evaluation order.
    ///
    /// An empty `default_code` falls back to [`DEFAULT_GAMECODE`].
    pub fn new(rules: Vec<MappingRule>, default_code: impl Into<String>) -> Self {
        let default_code = default_code.into();
        let default_code = if default_code.trim().is_empty() {
            DEFAULT_GAMECODE.to_string()
        } else {
            default_code.trim().to_string()
        };
        Self {
            rules,
            default_code,
        }
    }

    /// Load the mapping file, or an empty store when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
            info!("No mapping file given; using default game code {}", DEFAULT_GAMECODE);
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!(
                "Mapping file {} not found; using default game code {}",
                path.display(),
                DEFAULT_GAMECODE
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_yaml_str(&contents, path)?;
        info!(
            "Loaded {} mapping rules from {} (default game code {})",
            store.rules.len(),
            path.display(),
            store.default_code
        );
        Ok(store)
    }

    /// Parse mapping YAML. `origin` is only used in error messages.
    pub fn from_yaml_str(contents: &str, origin: &Path) -> Result<Self> {
        if is_blank_yaml(contents) {
            return Ok(Self::default());
        }

        let value: Value = serde_yaml::from_str(contents).map_err(|source| CatalogError::Yaml {
            path: origin.to_path_buf(),
            source,
        })?;
        if value.is_null() {
            return Ok(Self::default());
        }

        let file: MappingFile =
            serde_yaml::from_value(value).map_err(|source| CatalogError::Yaml {
                path: origin.to_path_buf(),
                source,
            })?;

        let mut rules = Vec::new();
        for (key, value) in file.gamecode.unwrap_or_default() {
            let pattern = scalar_to_string(&key).ok_or_else(|| CatalogError::Mapping {
                path: origin.to_path_buf(),
                message: format!("gamecode pattern must be a scalar, got {:?}", key),
            })?;
            let code = scalar_to_string(&value).ok_or_else(|| CatalogError::Mapping {
                path: origin.to_path_buf(),
                message: format!("gamecode for '{}' must be a scalar, got {:?}", pattern, value),
            })?;
            let code = code.trim().to_string();
            if code.is_empty() {
                warn!("Skipping mapping pattern '{}' with an empty game code", pattern);
                continue;
            }
            rules.push(MappingRule::new(pattern, code));
        }

        let default_code = file
            .fallbacks
            .and_then(|f| f.default_gamecode)
            .as_ref()
            .and_then(scalar_to_string)
            .unwrap_or_default();

        Ok(Self::new(rules, default_code))
    }

    /// Rules in evaluation order.
    pub fn lookup_rules(&self) -> &[MappingRule] {
        &self.rules
    }

    pub fn default_code(&self) -> &str {
        &self.default_code
    }
}

fn is_blank_yaml(contents: &str) -> bool {
    contents.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn parse(yaml: &str) -> MappingStore {
        MappingStore::from_yaml_str(yaml, &PathBuf::from("mapping.yaml")).unwrap()
    }

    #[test]
    fn test_rules_keep_file_order() {
        let store = parse(
            r#"
gamecode:
  "zeta": Z001
  "alpha": A001
  "mid": M001
fallbacks:
  default_gamecode: CPUE
"#,
        );

        let codes: Vec<&str> = store.lookup_rules().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["Z001", "A001", "M001"]);
        assert_eq!(store.default_code(), "CPUE");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let store = parse("region:\n  EU: EUR\n");
        assert!(store.lookup_rules().is_empty());
        assert_eq!(store.default_code(), DEFAULT_GAMECODE);
    }

    #[test]
    fn test_blank_and_comment_only_files() {
        assert_eq!(parse("").default_code(), DEFAULT_GAMECODE);
        assert_eq!(parse("# nothing here\n\n").default_code(), DEFAULT_GAMECODE);
        assert_eq!(parse("~\n").default_code(), DEFAULT_GAMECODE);
    }

    #[test]
    fn test_numeric_scalars_are_stringified() {
        let store = parse("gamecode:\n  2019: 1234\n");
        let rule = &store.lookup_rules()[0];
        assert_eq!(rule.pattern, "2019");
        assert_eq!(rule.code, "1234");
    }

    #[test]
    fn test_empty_default_falls_back_to_builtin() {
        let store = parse("fallbacks:\n  default_gamecode: \"\"\n");
        assert_eq!(store.default_code(), DEFAULT_GAMECODE);
    }

    #[test]
    fn test_invalid_pattern_kept_but_never_matches() {
        let store = parse("gamecode:\n  \"[unbalanced\": BAD1\n  \"ok\": GOOD\n");
        let rules = store.lookup_rules();
        assert_eq!(rules.len(), 2);
        assert!(!rules[0].is_valid());
        assert!(!rules[0].is_match("[unbalanced"));
        assert!(rules[1].is_match("OK"));
    }

    #[test]
    fn test_python_only_syntax_is_rejected_with_dialect_hint() {
        let rule = MappingRule::new(r"ranger(?=_us)", "RNGR");
        assert!(!rule.is_valid());
        assert!(!rule.is_match("ranger_us"));

        let err = Regex::new(r"(ab)\1").unwrap_err();
        let message = rejected_pattern_message(r"(ab)\1", "ADAE", &err);
        assert!(message.contains("Rust `regex`"), "{message}");
        assert!(message.contains("Python `re`"), "{message}");
        assert!(message.starts_with(r"Mapping pattern '(ab)\1' (-> ADAE)"), "{message}");
    }

    #[test]
    fn test_rule_match_is_case_insensitive_search() {
        let rule = MappingRule::new("misc", "MISC1");
        assert!(rule.is_match("MISC/dump/wc4"));
        assert!(rule.is_match("some/Misc_thing"));
        assert!(!rule.is_match("dump/wc4"));
    }

    #[test]
    fn test_non_scalar_code_is_an_error() {
        let result =
            MappingStore::from_yaml_str("gamecode:\n  foo: [A, B]\n", &PathBuf::from("m.yaml"));
        assert!(matches!(result, Err(CatalogError::Mapping { .. })));
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let result = MappingStore::from_yaml_str("gamecode: [unclosed\n", &PathBuf::from("m.yaml"));
        assert!(matches!(result, Err(CatalogError::Yaml { .. })));
    }

    #[test]
    fn test_load_absent_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = MappingStore::load(Some(&dir.path().join("missing.yaml"))).unwrap();
        assert!(store.lookup_rules().is_empty());
        assert_eq!(store.default_code(), DEFAULT_GAMECODE);

        let store = MappingStore::load(None).unwrap();
        assert_eq!(store.default_code(), DEFAULT_GAMECODE);

        let store = MappingStore::load(Some(Path::new(""))).unwrap();
        assert_eq!(store.default_code(), DEFAULT_GAMECODE);
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mapping.yaml");
        fs::write(&path, "gamecode:\n  misc: MISC1\n").unwrap();

        let store = MappingStore::load(Some(&path)).unwrap();
        assert_eq!(store.lookup_rules().len(), 1);
        assert_eq!(store.lookup_rules()[0].code, "MISC1");
    }
}
