//! Search and replace over buffer text.
//!
//! Matches are computed against a snapshot of the text and carry the
//! revision they were computed from; any buffer mutation invalidates the
//! set and it must be recomputed before navigation or replacement. Spans
//! are byte offsets, half-open, non-overlapping and ascending by
//! construction of the scan.

use regex::{Regex, RegexBuilder};

/// A search query plus its matching options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub pattern: String,
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub use_regex: bool,
}

impl SearchQuery {
    /// Literal query with default options.
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Compile the matching predicate.
    ///
    /// Literal patterns are escaped before compilation; `whole_word` wraps
    /// the escaped pattern in word-boundary assertions. `use_regex` takes
    /// the pattern raw (no whole-word wrap, as in the source dialog).
    fn compile(&self) -> Result<Regex, QueryError> {
        let pattern = if self.use_regex {
            self.pattern.clone()
        } else {
            let escaped = regex::escape(&self.pattern);
            if self.whole_word {
                format!(r"\b{escaped}\b")
            } else {
                escaped
            }
        };

        RegexBuilder::new(&pattern)
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|err| QueryError::BadPattern(err.to_string()))
    }
}

/// Invalid search pattern. Fails closed: zero matches, surfaced as a value.
#[derive(thiserror::Error, Debug, miette::Diagnostic)]
pub enum QueryError {
    #[error("invalid search pattern: {0}")]
    #[diagnostic(code(inkdown::search::pattern))]
    BadPattern(String),
}

/// One match: a half-open byte range into the text it was computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

/// An ordered set of matches with a current position.
///
/// Valid only against the exact text revision it was computed from.
#[derive(Clone, Debug)]
pub struct MatchSet {
    spans: Vec<MatchSpan>,
    current: usize,
    revision: u64,
}

impl MatchSet {
    /// Compute all matches of `query` in `text`.
    ///
    /// An empty pattern yields an empty set (the overlay treats it as no
    /// query at all). The scan advances at least one char per iteration, so
    /// zero-width-capable patterns like `a*` terminate.
    pub fn compute(text: &str, query: &SearchQuery, revision: u64) -> Result<Self, QueryError> {
        let mut spans = Vec::new();
        if !query.is_empty() {
            let regex = query.compile()?;
            let mut at = 0;
            while at <= text.len() {
                let Some(found) = regex.find_at(text, at) else {
                    break;
                };
                spans.push(MatchSpan {
                    start: found.start(),
                    end: found.end(),
                });
                if found.end() > found.start() {
                    at = found.end();
                } else {
                    // Zero-width match: step one char forward.
                    match text[found.end()..].chars().next() {
                        Some(c) => at = found.end() + c.len_utf8(),
                        None => break,
                    }
                }
            }
        }

        tracing::trace!(
            target: "inkdown::search",
            pattern = %query.pattern,
            matches = spans.len(),
            revision,
            "computed matches"
        );

        Ok(Self {
            spans,
            current: 0,
            revision,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// The revision of the text this set was computed from.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn spans(&self) -> &[MatchSpan] {
        &self.spans
    }

    /// The match the cursor is on, if any.
    pub fn current_span(&self) -> Option<MatchSpan> {
        self.spans.get(self.current).copied()
    }

    /// 1-based index for display (`0` when the set is empty).
    pub fn display_index(&self) -> usize {
        if self.spans.is_empty() {
            0
        } else {
            self.current + 1
        }
    }

    /// Advance to the next match, wrapping past the end. No-op when empty.
    pub fn next(&mut self) -> Option<MatchSpan> {
        if self.spans.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.spans.len();
        self.current_span()
    }

    /// Step to the previous match, wrapping before the start. No-op when empty.
    pub fn prev(&mut self) -> Option<MatchSpan> {
        if self.spans.is_empty() {
            return None;
        }
        self.current = if self.current == 0 {
            self.spans.len() - 1
        } else {
            self.current - 1
        };
        self.current_span()
    }

    /// Keep the current index meaningful after a recompute: clamp it into
    /// the new set (the source dialog does the same after a replace).
    pub fn clamp_current(&mut self, previous_index: usize) {
        if !self.spans.is_empty() {
            self.current = previous_index.min(self.spans.len() - 1);
        }
    }
}

/// Splice `replacement` over one span, returning the new full text.
///
/// All spans after `span` shift; the caller must recompute the match set
/// before navigating further.
pub fn replace_one(text: &str, span: MatchSpan, replacement: &str) -> String {
    let mut out = text.to_string();
    out.replace_range(span.start..span.end, replacement);
    out
}

/// Apply `replacement` over every match in a single pass.
///
/// Spans are spliced in descending start order so earlier offsets are
/// unaffected by the shift each splice introduces. Ascending order without
/// offset bookkeeping would corrupt every replacement after the first.
pub fn replace_all(text: &str, matches: &MatchSet, replacement: &str) -> String {
    let mut out = text.to_string();
    for span in matches.spans.iter().rev() {
        out.replace_range(span.start..span.end, replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compute(text: &str, query: &SearchQuery) -> MatchSet {
        MatchSet::compute(text, query, 0).expect("query compiles")
    }

    #[test]
    fn literal_query_finds_all_occurrences() {
        let set = compute("foo bar foo baz foo", &SearchQuery::literal("foo"));
        assert_eq!(set.len(), 3);
        let starts: Vec<_> = set.spans().iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 8, 16]);
    }

    #[test]
    fn navigation_wraps_circularly() {
        let mut set = compute("foo bar foo baz foo", &SearchQuery::literal("foo"));
        assert_eq!(set.display_index(), 1);

        // k steps of next over k matches return to the first.
        set.next();
        set.next();
        let back = set.next().expect("non-empty");
        assert_eq!(back.start, 0);
        assert_eq!(set.display_index(), 1);

        // prev from the first wraps to the last.
        let last = set.prev().expect("non-empty");
        assert_eq!(last.start, 16);
        assert_eq!(set.display_index(), 3);
    }

    #[test]
    fn navigation_on_empty_set_is_a_noop() {
        let mut set = compute("nothing here", &SearchQuery::literal("absent"));
        assert!(set.is_empty());
        assert_eq!(set.next(), None);
        assert_eq!(set.prev(), None);
        assert_eq!(set.display_index(), 0);
    }

    #[test]
    fn case_insensitive_by_default() {
        let set = compute("Foo foo FOO", &SearchQuery::literal("foo"));
        assert_eq!(set.len(), 3);

        let sensitive = SearchQuery {
            case_sensitive: true,
            ..SearchQuery::literal("foo")
        };
        assert_eq!(compute("Foo foo FOO", &sensitive).len(), 1);
    }

    #[test]
    fn whole_word_uses_boundaries() {
        let query = SearchQuery {
            whole_word: true,
            ..SearchQuery::literal("cat")
        };
        let set = compute("cat concatenate cat scatter", &query);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn literal_metacharacters_are_escaped() {
        let set = compute("price (USD) is 3.14", &SearchQuery::literal("(USD)"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.spans()[0].start, 6);

        // "." must not match any character.
        let set = compute("3x14 3.14", &SearchQuery::literal("3.14"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.spans()[0].start, 5);
    }

    #[test]
    fn invalid_regex_fails_closed() {
        let query = SearchQuery {
            use_regex: true,
            ..SearchQuery::literal("(unclosed")
        };
        let err = MatchSet::compute("text", &query, 0).expect_err("bad pattern");
        assert!(matches!(err, QueryError::BadPattern(_)));
    }

    #[test]
    fn regex_query_matches_patterns() {
        let query = SearchQuery {
            use_regex: true,
            ..SearchQuery::literal(r"\d+")
        };
        let set = compute("a1 b22 c333", &query);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn zero_width_pattern_terminates() {
        let query = SearchQuery {
            use_regex: true,
            ..SearchQuery::literal("a*")
        };
        // "a*" matches at every position; the guard must advance the scan.
        let set = compute("baab", &query);
        assert!(set.len() <= "baab".len() + 1);
        assert!(!set.is_empty());
    }

    #[test]
    fn replace_one_splices_in_place() {
        let text = "foo bar foo";
        let set = compute(text, &SearchQuery::literal("foo"));
        let out = replace_one(text, set.spans()[1], "qux");
        assert_eq!(out, "foo bar qux");
    }

    #[test]
    fn replace_all_matches_expected_output() {
        let text = "foo bar foo baz foo";
        let set = compute(text, &SearchQuery::literal("foo"));
        assert_eq!(replace_all(text, &set, "qux"), "qux bar qux baz qux");
    }

    #[test]
    fn replace_all_with_shifting_lengths() {
        // Replacement longer than the match: descending splice order keeps
        // the earlier spans valid.
        let text = "a-a-a";
        let set = compute(text, &SearchQuery::literal("a"));
        assert_eq!(replace_all(text, &set, "long"), "long-long-long");

        // And shorter.
        let text = "xxxx yy xxxx";
        let set = compute(text, &SearchQuery::literal("xxxx"));
        assert_eq!(replace_all(text, &set, "z"), "z yy z");
    }

    #[test]
    fn replace_all_then_recompute_is_empty() {
        let text = "one two one two one";
        let query = SearchQuery::literal("one");
        let set = compute(text, &query);
        let replaced = replace_all(text, &set, "three");
        assert!(compute(&replaced, &query).is_empty());
    }

    #[test]
    fn empty_pattern_yields_empty_set() {
        let set = compute("anything", &SearchQuery::literal(""));
        assert!(set.is_empty());
    }

    #[test]
    fn unicode_offsets_are_byte_based() {
        let text = "héllo héllo";
        let set = compute(text, &SearchQuery::literal("héllo"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.spans()[1].start, 7); // "héllo " is 7 bytes
        let out = replace_all(text, &set, "hi");
        assert_eq!(out, "hi hi");
    }
}
