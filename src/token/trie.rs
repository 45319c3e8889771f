//! A longest-match trie over a fixed set of strings, shared by
//! `LiteralChoice`, `KeywordChoice`, `TextUntil` and `EscapedText` (spec
//! §4.1: "trie-based", "scan forward with a trie of terminators / escape
//! sequences"). Grounded on the teacher's lexer dispatch, which switches on
//! leading characters to pick among fixed punctuation strings (`"..."`,
//! `"@"`, `"$"`) one character at a time; generalized here into a reusable
//! structure instead of one inline `match` per caller.

use std::collections::HashMap;

#[derive(Debug, Default)]
struct Node {
    children: HashMap<char, Node>,
    /// Byte length of the entry ending here, if any entry does.
    entry_len: Option<usize>,
}

/// Case sensitivity for [`super::TokenPattern::Literal`] and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    fn fold(self, c: char) -> char {
        match self {
            CaseSensitivity::Sensitive => c,
            CaseSensitivity::Insensitive => c.to_ascii_lowercase(),
        }
    }
}

#[derive(Debug)]
pub struct Trie {
    root: Node,
    case: CaseSensitivity,
    first_chars: std::collections::HashSet<char>,
}

impl Trie {
    pub fn new(entries: impl IntoIterator<Item = impl AsRef<str>>, case: CaseSensitivity) -> Self {
        let mut root = Node::default();
        let mut first_chars = std::collections::HashSet::new();
        for entry in entries {
            let entry = entry.as_ref();
            let mut node = &mut root;
            let mut first = true;
            for c in entry.chars() {
                let c = case.fold(c);
                if first {
                    first_chars.insert(c);
                    first = false;
                }
                node = node.children.entry(c).or_default();
            }
            node.entry_len = Some(entry.len());
        }
        Self { root, case, first_chars }
    }

    pub fn first_chars(&self) -> &std::collections::HashSet<char> {
        &self.first_chars
    }

    /// Returns the byte length of the longest entry matching a prefix of
    /// `text` (spec §4.1: `LiteralChoice`/`KeywordChoice` "match the longest
    /// entry in the trie at the position").
    pub fn longest_match(&self, text: &str) -> Option<usize> {
        let mut node = &self.root;
        let mut best = node.entry_len;
        for c in text.chars() {
            let folded = self.case.fold(c);
            match node.children.get(&folded) {
                Some(next) => {
                    node = next;
                    if node.entry_len.is_some() {
                        best = node.entry_len;
                    }
                }
                None => break,
            }
        }
        best
    }

    /// Returns the byte offset of the nearest occurrence of any entry in
    /// `text`, and that entry's byte length — used by `TextUntil` to find the
    /// first terminator. Unlike `longest_match` this scans every start
    /// position, not just position 0.
    pub fn find_first(&self, text: &str) -> Option<(usize, usize)> {
        for (offset, _) in text.char_indices() {
            if let Some(len) = self.longest_match(&text[offset..]) {
                return Some((offset, len));
            }
        }
        if let Some(len) = self.root.entry_len {
            return Some((text.len(), len));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_longest_entry() {
        let trie = Trie::new(["+", "++", "+="], CaseSensitivity::Sensitive);
        assert_eq!(trie.longest_match("++x"), Some(2));
        assert_eq!(trie.longest_match("+=x"), Some(2));
        assert_eq!(trie.longest_match("+x"), Some(1));
    }

    #[test]
    fn case_insensitive_folds_both_sides() {
        let trie = Trie::new(["Select"], CaseSensitivity::Insensitive);
        assert_eq!(trie.longest_match("SELECT x"), Some(6));
    }

    #[test]
    fn find_first_locates_nearest_terminator() {
        let trie = Trie::new(["\"", "\\"], CaseSensitivity::Sensitive);
        assert_eq!(trie.find_first("abc\"def"), Some((3, 1)));
    }
}
