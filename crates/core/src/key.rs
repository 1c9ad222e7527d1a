//! Cover cache keys: the normalized `(title, author)` pair.
//!
//! Two lookups share a cache entry (and an in-flight request) exactly when
//! their keys are equal. Normalization applies NFC, trims, collapses interior
//! whitespace and lowercases both parts. The title is further reduced by
//! dropping trailing parenthetical/bracketed suffixes and any `:` subtitle,
//! so "Dune (Deluxe Edition)" and "Dune: Book One" land on the same entry
//! as "dune".

use std::fmt;

use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoverKey {
    title: String,
    author: String,
}

impl CoverKey {
    pub fn new(title: &str, author: &str) -> Self {
        let title = fold(title);
        let refined = strip_edition_noise(&title);
        Self {
            title: if refined.is_empty() { title } else { refined },
            author: fold(author),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// True when there is nothing to look up for this title.
    pub fn is_blank_title(title: &str) -> bool {
        title.trim().is_empty()
    }
}

impl fmt::Display for CoverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.title, self.author)
    }
}

fn fold(s: &str) -> String {
    let composed: String = s.nfc().collect();
    composed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn strip_edition_noise(title: &str) -> String {
    let mut t = title.trim();
    loop {
        let before = t;
        if let Some(rest) = strip_trailing_group(t, '(', ')').or_else(|| strip_trailing_group(t, '[', ']')) {
            t = rest.trim();
        }
        if let Some(idx) = t.find(':') {
            t = t[..idx].trim();
        }
        if t == before {
            return t.to_string();
        }
    }
}

/// `"foo (bar (baz))"` -> `Some("foo ")`. Only a group that closes the string
/// counts; unbalanced brackets leave the string alone.
fn strip_trailing_group(s: &str, open: char, close: char) -> Option<&str> {
    if !s.ends_with(close) {
        return None;
    }
    let mut depth = 0usize;
    for (idx, c) in s.char_indices().rev() {
        if c == close {
            depth += 1;
        } else if c == open {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(&s[..idx]);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn case_and_whitespace_share_a_key() {
        assert_eq!(
            CoverKey::new("The Hobbit", "J.R.R. Tolkien"),
            CoverKey::new("  the hobbit ", "j.r.r. tolkien"),
        );
        assert_eq!(
            CoverKey::new("The   Hobbit", "J.R.R.  Tolkien"),
            CoverKey::new("the hobbit", "j.r.r. tolkien"),
        );
    }

    #[test]
    fn subtitle_and_parenthetical_are_stripped() {
        let base = CoverKey::new("Dune", "Frank Herbert");
        assert_eq!(CoverKey::new("Dune: Book One", "Frank Herbert"), base);
        assert_eq!(CoverKey::new("Dune (Deluxe Edition)", "Frank Herbert"), base);
        assert_eq!(CoverKey::new("Dune [Illustrated] (2019)", "Frank Herbert"), base);
        assert_eq!(CoverKey::new("Dune: Part I (Reissue)", "Frank Herbert"), base);
        assert_eq!(CoverKey::new("Dune (Saga): Book One", "Frank Herbert"), base);
        assert_eq!(CoverKey::new("Dune (Deluxe (2019))", "Frank Herbert"), base);
        assert_eq!(CoverKey::new("Dune [Box Set [Vol. 1]]", "Frank Herbert"), base);
    }

    #[test]
    fn unbalanced_trailing_group_is_left_alone() {
        assert_eq!(CoverKey::new("Dune 2019)", "").title(), "dune 2019)");
        assert_eq!(CoverKey::new("Dune (Deluxe 2019))", "").title(), "dune (deluxe 2019))");
    }

    #[test]
    fn author_is_not_subtitle_stripped() {
        let key = CoverKey::new("Book", "Smith: Jr. (ed.)");
        assert_eq!(key.author(), "smith: jr. (ed.)");
    }

    #[test]
    fn title_that_would_become_empty_is_kept() {
        assert_eq!(CoverKey::new("(Untitled)", "").title(), "(untitled)");
        assert_eq!(CoverKey::new(": Prologue", "").title(), ": prologue");
    }

    #[test]
    fn parenthesis_inside_title_is_kept() {
        assert_eq!(CoverKey::new("The (Not So) Secret Garden", "").title(), "the (not so) secret garden");
    }

    #[test]
    fn composed_and_decomposed_forms_match() {
        let composed = CoverKey::new("Ion Cre\u{0103}ng\u{0103}", "");
        let decomposed = CoverKey::new("Ion Crea\u{0306}nga\u{0306}", "");
        assert_eq!(composed, decomposed);
    }

    #[test]
    fn blank_titles() {
        assert!(CoverKey::is_blank_title(""));
        assert!(CoverKey::is_blank_title("   \t"));
        assert!(!CoverKey::is_blank_title(" x "));
    }

    proptest! {
        #[test]
        fn key_ignores_case_and_padding(title in "[A-Za-z][A-Za-z ]{0,30}", author in "[A-Za-z .]{0,20}") {
            let padded = format!("  {}  ", title.to_uppercase());
            prop_assert_eq!(CoverKey::new(&title, &author), CoverKey::new(&padded, &author.to_lowercase()));
        }

        #[test]
        fn normalization_is_idempotent(title in "[A-Za-z :()]{1,40}", author in "[A-Za-z ]{0,20}") {
            let once = CoverKey::new(&title, &author);
            let twice = CoverKey::new(once.title(), once.author());
            prop_assert_eq!(once, twice);
        }
    }
}
