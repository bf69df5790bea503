//! Phrase lexicons with greedy longest-match lookup over token sequences.

use std::collections::HashSet;
use std::io::BufRead;

use crate::error::Result;

/// A set of multi-word phrases.
///
/// Phrases are stored as their whitespace-separated words joined by single
/// spaces, so `"New   York"` and `"New York"` are the same entry.
#[derive(Debug, Clone, Default)]
pub struct LongestMatch {
    phrases: HashSet<String>,
    max_words: usize,
}

impl LongestMatch {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Self::default();
        for phrase in phrases {
            lexicon.insert(phrase.as_ref());
        }
        lexicon
    }

    /// Load one phrase per line. Blank lines and lines starting with `#`
    /// are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lexicon = Self::default();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            lexicon.insert(line);
        }
        Ok(lexicon)
    }

    pub fn insert(&mut self, phrase: &str) {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        if words.is_empty() {
            return;
        }
        self.max_words = self.max_words.max(words.len());
        self.phrases.insert(words.join(" "));
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.contains(phrase)
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Find non-overlapping matches as `(start, end, phrase)` with `end`
    /// exclusive. Scanning left to right, the longest phrase starting at the
    /// current token wins and scanning resumes after it.
    ///
    /// ```
    /// use webstruct_core::features::LongestMatch;
    ///
    /// let lexicon = LongestMatch::new(["New York", "New York City", "York"]);
    /// let ranges = lexicon.find_ranges(&["in", "New", "York", "City", "York"]);
    /// assert_eq!(ranges, [(1, 4, "New York City".to_string()), (4, 5, "York".to_string())]);
    /// ```
    pub fn find_ranges<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<(usize, usize, String)> {
        let mut ranges = Vec::new();
        let mut start = 0;

        while start < tokens.len() {
            let longest = (start + 1..=tokens.len().min(start + self.max_words))
                .rev()
                .find_map(|end| {
                    let phrase = tokens[start..end]
                        .iter()
                        .map(|t| t.as_ref())
                        .collect::<Vec<&str>>()
                        .join(" ");
                    self.phrases.contains(&phrase).then_some((end, phrase))
                });

            match longest {
                Some((end, phrase)) => {
                    ranges.push((start, end, phrase));
                    start = end;
                }
                None => start += 1,
            }
        }
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_whitespace() {
        let lexicon = LongestMatch::new(["New   York", "", "  "]);
        assert_eq!(lexicon.len(), 1);
        assert!(lexicon.contains("New York"));
    }

    #[test]
    fn test_find_ranges_prefers_longest() {
        let lexicon = LongestMatch::new(["a b", "a b c", "c d", "d"]);
        let ranges = lexicon.find_ranges(&["a", "b", "c", "d"]);
        assert_eq!(
            ranges,
            [(0, 3, "a b c".to_string()), (3, 4, "d".to_string())]
        );
    }

    #[test]
    fn test_find_ranges_no_match() {
        let lexicon = LongestMatch::new(["x"]);
        assert!(lexicon.find_ranges(&["a", "b"]).is_empty());
        assert!(LongestMatch::default().find_ranges(&["a"]).is_empty());
        assert!(lexicon.find_ranges::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_from_reader() {
        let data = "# cities\nAmsterdam\n\n  Den Haag \nNew York\n";
        let lexicon = LongestMatch::from_reader(data.as_bytes()).unwrap();
        assert_eq!(lexicon.len(), 3);
        assert!(lexicon.contains("Den Haag"));
        assert!(!lexicon.contains("# cities"));
    }
}
