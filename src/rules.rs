//! Hint and guess validity rules.
//!
//! The rules are pure functions: identical inputs always give identical answers.
//!
//! | Level | Hint rule | Correct guess |
//! |---|---|---|
//! | 1 | no taboo word, no target word | the target word |
//! | 2 | as level 1, and not the target's translation | the target's translation |
//! | 3 | verbatim member of the admissible hints | the target word |
//! | 4 | as level 1, at most 5 words, no word over 20 characters | the target word |
//!
//! A forbidden word is detected case-insensitively in the lowercased hint, in the hint
//! stripped of every non-alphanumeric character, and in the reverse of that stripped form.

use crate::challenge::{ChallengeWord, Translations};
use crate::errors::RuleError;
use crate::level::Level;

const MAX_HINT_WORDS: usize = 5;
const MAX_WORD_CHARS: usize = 20;

/// Checks whether `hint` respects the rules of `level`.
///
/// Returns `Ok(false)` for a level outside `1..=4`, and [`RuleError::InvalidInput`] when no
/// hint was given. A missing admissible list at level 3 admits nothing; a missing
/// translation dictionary at level 2 forbids no translation.
pub fn validate_hint(
    taboo: &[String],
    target: &str,
    hint: Option<&str>,
    level: u8,
    admissible_hints: Option<&[String]>,
    translations: Option<&Translations>,
) -> Result<bool, RuleError> {
    let Some(hint) = hint else {
        return Err(RuleError::InvalidInput("no hint was given".to_owned()));
    };
    let Ok(level) = Level::try_from(level) else {
        return Ok(false);
    };

    if level == Level::Three {
        return Ok(admissible_hints.is_some_and(|list| list.iter().any(|h| h == hint)));
    }

    let mut forbidden: Vec<&str> = taboo.iter().map(String::as_str).collect();
    forbidden.push(target);
    if level == Level::Two {
        if let Some(translation) = translations.and_then(|t| t.lookup(target)) {
            forbidden.push(translation);
        }
    }

    if reveals_any(hint, &forbidden) {
        return Ok(false);
    }

    if level == Level::Four {
        let words = hint.split_whitespace().collect::<Vec<_>>();
        if words.len() > MAX_HINT_WORDS
            || words.iter().any(|w| w.chars().count() > MAX_WORD_CHARS)
        {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Checks whether `guess` names the word expected at `level`.
///
/// Level 2 expects the translation stored under the capitalized target
/// (`"medico"` is looked up as `"Medico"`); every other known level expects the target itself.
/// Comparisons ignore case. Unknown levels are never correct.
pub fn validate_guess(target: &str, guess: &str, level: u8, translations: &Translations) -> bool {
    match Level::try_from(level) {
        Ok(Level::One | Level::Three | Level::Four) => {
            guess.to_lowercase() == target.to_lowercase()
        }
        Ok(Level::Two) => translations
            .get_capitalized(target)
            .is_some_and(|t| t.to_lowercase() == guess.to_lowercase()),
        Err(_) => false,
    }
}

fn reveals_any(hint: &str, forbidden: &[&str]) -> bool {
    let lowered = hint.to_lowercase();
    let normalized = lowered
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>();
    let reversed = normalized.chars().rev().collect::<String>();

    forbidden.iter().any(|word| {
        let word = word.to_lowercase();
        lowered.contains(&word) || normalized.contains(&word) || reversed.contains(&word)
    })
}

/// The level-scoped rule context, loaded once and shared read-only by every trial.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    admissible_hints: Vec<String>,
    translations: Translations,
}

impl RuleBook {
    /// Bundles the level 3 admissible hints and the level 2 translation dictionary.
    pub fn new(admissible_hints: Vec<String>, translations: Translations) -> Self {
        Self {
            admissible_hints,
            translations,
        }
    }

    /// [`validate_hint`] against this context.
    pub fn check_hint(
        &self,
        word: &ChallengeWord,
        hint: &str,
        level: Level,
    ) -> Result<bool, RuleError> {
        validate_hint(
            &word.taboo,
            &word.target,
            Some(hint),
            level.number(),
            Some(&self.admissible_hints),
            Some(&self.translations),
        )
    }

    /// [`validate_guess`] against this context.
    pub fn check_guess(&self, word: &ChallengeWord, guess: &str, level: Level) -> bool {
        validate_guess(&word.target, guess, level.number(), &self.translations)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn taboo(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn translations() -> Translations {
        Translations::from(HashMap::from([(
            "Medico".to_owned(),
            "docteur".to_owned(),
        )]))
    }

    fn hint_ok(hint: &str, level: u8) -> bool {
        validate_hint(
            &taboo(&["ospedale", "cura"]),
            "medico",
            Some(hint),
            level,
            Some(&taboo(&["lavora in corsia"])),
            Some(&translations()),
        )
        .unwrap()
    }

    #[test]
    fn rejects_forbidden_words_at_levels_one_two_four() {
        for level in [1, 2, 4] {
            assert!(!hint_ok("lavora in ospedale", level), "raw, level {level}");
            assert!(!hint_ok("il MEDICO di base", level), "case, level {level}");
            assert!(!hint_ok("o.s.p-e d a l e", level), "normalized, level {level}");
            assert!(!hint_ok("elade psoeh", level), "reversed, level {level}");
            assert!(!hint_ok("arucx", level), "reversed taboo, level {level}");
            assert!(hint_ok("camice bianco", level), "clean hint, level {level}");
        }
    }

    #[test]
    fn level_two_forbids_the_translation() {
        assert!(!hint_ok("un docteur francese", 2));
        assert!(hint_ok("un docteur francese", 1));
    }

    #[test]
    fn level_three_requires_verbatim_admissible_hint() {
        assert!(hint_ok("lavora in corsia", 3));
        assert!(!hint_ok("Lavora in corsia", 3));
        assert!(!hint_ok("lavora in corsia ", 3));
        assert!(!hint_ok("camice bianco", 3));
    }

    #[test]
    fn level_three_ignores_substring_checks() {
        let hints = taboo(&["il medico"]);
        let ok = validate_hint(&[], "medico", Some("il medico"), 3, Some(&hints), None).unwrap();
        assert!(ok);
        let missing = validate_hint(&[], "medico", Some("il medico"), 3, None, None).unwrap();
        assert!(!missing);
    }

    #[test]
    fn level_four_limits_words() {
        assert!(hint_ok("uno due tre quattro cinque", 4));
        assert!(!hint_ok("uno due tre quattro cinque sei", 4));
        assert!(!hint_ok("supercalifragilistichespiralidoso", 4));
        assert!(hint_ok("supercalifragilistichespiralidoso", 1));
        assert!(hint_ok("abcdefghijklmnopqrst", 4));
        assert!(!hint_ok("abcdefghijklmnopqrstu", 4));
    }

    #[test]
    fn unknown_level_and_missing_hint() {
        assert!(!hint_ok("camice bianco", 0));
        assert!(!hint_ok("camice bianco", 5));
        let err = validate_hint(&[], "medico", None, 1, None, None);
        assert!(matches!(err, Err(RuleError::InvalidInput(_))));
    }

    #[test]
    fn guess_rules() {
        let t = translations();
        assert!(validate_guess("medico", "docteur", 2, &t));
        assert!(validate_guess("medico", "DOCTEUR", 2, &t));
        assert!(!validate_guess("medico", "medico", 2, &t));
        assert!(!validate_guess("pane", "pain", 2, &t));
        for level in [1, 3, 4] {
            assert!(validate_guess("medico", "Medico", level, &t));
            assert!(!validate_guess("medico", "docteur", level, &t));
        }
        assert!(!validate_guess("medico", "medico", 7, &t));
    }

    #[test]
    fn rules_are_idempotent() {
        let first = hint_ok("camice bianco", 4);
        for _ in 0..5 {
            assert_eq!(hint_ok("camice bianco", 4), first);
        }
        let t = translations();
        let first = validate_guess("medico", "docteur", 2, &t);
        assert_eq!(validate_guess("medico", "docteur", 2, &t), first);
    }

    #[test]
    fn rule_book_delegates() {
        let book = RuleBook::new(taboo(&["bianco camice"]), translations());
        let word = ChallengeWord::new("medico", taboo(&["ospedale"]));
        assert!(book.check_hint(&word, "bianco camice", Level::Three).unwrap());
        assert!(!book.check_hint(&word, "in ospedale", Level::One).unwrap());
        assert!(book.check_guess(&word, "docteur", Level::Two));
        assert!(book.check_guess(&word, "medico", Level::Four));
    }
}
