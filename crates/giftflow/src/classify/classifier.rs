//! Two-tier classifier.
//!
//! 1. Event pass: the first event (table order) whose normalized name is a
//!    substring of the normalized token string wins.
//! 2. Pattern pass: the first mapping rule (file order) whose regex matches
//!    the `/`-joined raw tokens wins.
//! 3. Otherwise the default code.
//!
//! No scoring and no longest-match: declaration order is the only tie-break.

use super::tokens::normalize;
use crate::catalog::{Catalog, Event, MappingRule};
use tracing::debug;

/// Outcome of classifying one file. Exactly one variant per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<'a> {
    /// Matched a known event; convert once per event code.
    Event(&'a Event),
    /// No event matched; a mapping rule or the default supplied the code.
    Fallback(String),
}

impl<'a> Classification<'a> {
    /// Destination codes in conversion order.
    pub fn codes(&self) -> Vec<&str> {
        match self {
            Classification::Event(event) => event.codes.iter().map(String::as_str).collect(),
            Classification::Fallback(code) => vec![code.as_str()],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Classification::Fallback(_))
    }
}

/// Classify a token list against events, rules and the default code.
pub fn classify<'a>(
    tokens: &[String],
    events: &'a [Event],
    rules: &[MappingRule],
    default_code: &str,
) -> Classification<'a> {
    if let Some(event) = match_event(tokens, events) {
        return Classification::Event(event);
    }
    Classification::Fallback(detect_code(tokens, rules, default_code).to_string())
}

/// Classify using a loaded [`Catalog`].
pub fn classify_with<'a>(tokens: &[String], catalog: &'a Catalog) -> Classification<'a> {
    classify(
        tokens,
        catalog.all_events(),
        catalog.lookup_rules(),
        catalog.default_code(),
    )
}

/// Event pass.
pub fn match_event<'a>(tokens: &[String], events: &'a [Event]) -> Option<&'a Event> {
    let key = normalize(&tokens.join(" "));
    events.iter().find(|event| {
        let name = normalize(&event.name);
        // An empty name would be a substring of everything.
        !name.is_empty() && key.contains(&name)
    })
}

/// Pattern pass, ending with the default code.
pub fn detect_code<'r>(tokens: &[String], rules: &'r [MappingRule], default_code: &'r str) -> &'r str {
    let joined = tokens.join("/");
    match rules.iter().find(|rule| rule.is_match(&joined)) {
        Some(rule) => {
            debug!("Pattern '{}' matched '{}' -> {}", rule.pattern, joined, rule.code);
            &rule.code
        }
        None => {
            debug!("No pattern matched '{}'; using default {}", joined, default_code);
            default_code
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DEFAULT_GAMECODE;
    use crate::classify::tokenize;
    use std::path::Path;

    fn event(name: &str, codes: &[&str]) -> Event {
        Event::new(name, codes.iter().copied(), ["EU"], None).unwrap()
    }

    fn toks(path: &str) -> Vec<String> {
        tokenize(Path::new(path))
    }

    #[test]
    fn test_event_substring_match() {
        let events = vec![event("Zigzag", &["EUR1", "EUR2"])];
        let result = classify(&toks("Zigzag_ROUTE1_EU.pcd"), &events, &[], DEFAULT_GAMECODE);
        assert_eq!(result, Classification::Event(&events[0]));
        assert_eq!(result.codes(), vec!["EUR1", "EUR2"]);
    }

    #[test]
    fn test_event_name_normalized_before_matching() {
        let events = vec![event("Aurora Ticket", &["ADAE"])];
        let result = classify(&toks("aurora-ticket_2004.wc4"), &events, &[], "XXXX");
        assert!(matches!(result, Classification::Event(e) if e.name == "Aurora Ticket"));
    }

    #[test]
    fn test_event_can_span_token_boundaries() {
        let events = vec![event("MysteryGift", &["MG01"])];
        let result = classify(&toks("mystery_gift.pgt"), &events, &[], "XXXX");
        assert!(!result.is_fallback());
    }

    #[test]
    fn test_first_declared_event_wins() {
        let events = vec![event("Ticket", &["FIRST"]), event("Aurora Ticket", &["SECOND"])];
        let result = classify(&toks("Aurora_Ticket.wc4"), &events, &[], "XXXX");
        assert_eq!(result.codes(), vec!["FIRST"]);

        let reversed = vec![event("Aurora Ticket", &["SECOND"]), event("Ticket", &["FIRST"])];
        let result = classify(&toks("Aurora_Ticket.wc4"), &reversed, &[], "XXXX");
        assert_eq!(result.codes(), vec!["SECOND"]);
    }

    #[test]
    fn test_empty_normalized_event_name_never_matches() {
        let events = vec![event("--!!--", &["NOPE"]), event("", &["EMPTY"])];
        let result = classify(&toks("anything.pcd"), &events, &[], "DFLT");
        assert_eq!(result, Classification::Fallback("DFLT".to_string()));
    }

    #[test]
    fn test_event_pass_beats_patterns() {
        let events = vec![event("Zigzag", &["EVT1"])];
        let rules = vec![MappingRule::new("zigzag", "RULE")];
        let result = classify(&toks("zigzag.pcd"), &events, &rules, "DFLT");
        assert_eq!(result.codes(), vec!["EVT1"]);
    }

    #[test]
    fn test_pattern_fallback_in_rule_order() {
        let rules = vec![
            MappingRule::new("dump", "DUMP"),
            MappingRule::new("misc", "MISC1"),
        ];
        let result = classify(&toks("misc_dump.wc4"), &[], &rules, "DFLT");
        assert_eq!(result, Classification::Fallback("DUMP".to_string()));
    }

    #[test]
    fn test_pattern_sees_raw_slash_joined_tokens() {
        let rules = vec![MappingRule::new("^MISC/Dump/wc4/gen4$", "EXACT")];
        let result = classify(&toks("gen4/MISC_Dump.wc4"), &[], &rules, "DFLT");
        assert_eq!(result.codes(), vec!["EXACT"]);
    }

    #[test]
    fn test_pattern_is_case_insensitive() {
        let rules = vec![MappingRule::new("MISC", "MISC1")];
        let result = classify(&toks("misc_dump.wc4"), &[], &rules, "DFLT");
        assert_eq!(result.codes(), vec!["MISC1"]);
    }

    #[test]
    fn test_malformed_pattern_falls_through() {
        let rules = vec![
            MappingRule::new("[misc", "BROKEN"),
            MappingRule::new("(unclosed", "BROKEN2"),
            MappingRule::new("misc", "MISC1"),
        ];
        let result = classify(&toks("misc_dump.wc4"), &[], &rules, "DFLT");
        assert_eq!(result.codes(), vec!["MISC1"]);

        let only_broken = vec![MappingRule::new("[misc", "BROKEN")];
        let result = classify(&toks("misc_dump.wc4"), &[], &only_broken, "DFLT");
        assert_eq!(result, Classification::Fallback("DFLT".to_string()));
    }

    #[test]
    fn test_default_when_nothing_configured() {
        let catalog = Catalog::default();
        let result = classify_with(&toks("whatever.pgf"), &catalog);
        assert_eq!(result, Classification::Fallback(DEFAULT_GAMECODE.to_string()));
    }

    #[test]
    fn test_always_exactly_one_classification() {
        let events = vec![event("Zigzag", &["EUR1"])];
        let rules = vec![MappingRule::new("misc", "MISC1")];
        for path in ["zigzag.pcd", "misc.pcd", "other.pcd", ""] {
            let result = classify(&toks(path), &events, &rules, "DFLT");
            assert!(!result.codes().is_empty());
        }
    }
}
