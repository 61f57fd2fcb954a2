//! Tokenizer: file name and ancestor directory names split into alphanumeric runs.

use std::path::{Component, Path};

/// Split a path into raw tokens.
///
/// File-name tokens come first, followed by the tokens of each ancestor
/// directory, nearest parent first. Case is preserved.
pub fn tokenize(path: &Path) -> Vec<String> {
    let mut tokens = Vec::new();

    if let Some(name) = path.file_name() {
        tokens.extend(split_tokens(&name.to_string_lossy()).map(str::to_string));
    }

    if let Some(parent) = path.parent() {
        for component in parent.components().rev() {
            if let Component::Normal(segment) = component {
                tokens.extend(split_tokens(&segment.to_string_lossy()).map(str::to_string));
            }
        }
    }

    tokens
}

/// Split on runs of non-alphanumeric characters, dropping empty fragments.
pub fn split_tokens(segment: &str) -> impl Iterator<Item = &str> {
    segment
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// Lowercase and keep only ASCII letters and digits.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_tokens() {
        let tokens = tokenize(Path::new("Zigzag_ROUTE1_EU.pcd"));
        assert_eq!(tokens, vec!["Zigzag", "ROUTE1", "EU", "pcd"]);
    }

    #[test]
    fn test_directory_tokens_nearest_parent_first() {
        let tokens = tokenize(Path::new("/srv/in/Gen 4/Wonder-Cards/misc_dump.wc4"));
        assert_eq!(
            tokens,
            vec!["misc", "dump", "wc4", "Wonder", "Cards", "Gen", "4", "in", "srv"]
        );
    }

    #[test]
    fn test_relative_components_are_skipped() {
        let tokens = tokenize(Path::new("../in/./a.pgt"));
        assert_eq!(tokens, vec!["a", "pgt", "in"]);
    }

    #[test]
    fn test_non_ascii_is_a_separator() {
        let tokens: Vec<&str> = split_tokens("Pokémon--Ranger__2008").collect();
        assert_eq!(tokens, vec!["Pok", "mon", "Ranger", "2008"]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Aurora Ticket!"), "auroraticket");
        assert_eq!(normalize("  --  "), "");
        assert_eq!(normalize("WC4 Dump"), "wc4dump");
    }
}
