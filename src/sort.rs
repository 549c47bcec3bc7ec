//! Ordering used for everything shown in the navigator.
//!
//! Xcode sorts file names the way Finder does: digit runs compare by value,
//! case and diacritics only break ties. Children of a group are ordered with
//! groups and folders first, then files, each alphabetically.

use std::cmp::Ordering;
use std::fmt::Display;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::pbx::Element;

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum Token {
  Punct(char),
  /// Digit count without leading zeros, then the digits themselves.
  Number(usize, String),
  Letter(char)
}

/// Precomputed comparison key for `localized_standard_cmp`.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct CollationKey {
  primary:   Vec<Token>,
  secondary: Vec<Token>,
  tertiary:  Vec<bool>,
  raw:       String
}

impl CollationKey {
  pub fn new(s: &str) -> Self {
    let composed: String = s.nfc().collect();
    let lowered  = composed.to_lowercase();
    let folded: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();

    CollationKey {
      primary:   tokenize(&folded),
      secondary: tokenize(&lowered),
      tertiary:  composed.chars().map(char::is_uppercase).collect(),
      raw:       s.to_string()
    }
  }
}

fn tokenize(s: &str) -> Vec<Token> {
  let mut tokens = Vec::new();
  let mut chars  = s.chars().peekable();
  while let Some(c) = chars.next() {
    if c.is_ascii_digit() {
      let mut digits = String::new();
      digits.push(c);
      while let Some(&d) = chars.peek() {
        if !d.is_ascii_digit() {
          break;
        }
        digits.push(d);
        chars.next();
      }
      let trimmed = match digits.trim_start_matches('0') {
        ""  => "0",
        rest => rest
      };
      tokens.push(Token::Number(trimmed.len(), trimmed.to_string()));
    }
    else if c.is_alphanumeric() {
      tokens.push(Token::Letter(c));
    }
    else {
      tokens.push(Token::Punct(c));
    }
  }
  tokens
}

/// Finder-like comparison: "2" before "10", "a" next to "A" and "á".
/// Only equal strings compare equal.
pub fn localized_standard_cmp(a: &str, b: &str) -> Ordering {
  CollationKey::new(a).cmp(&CollationKey::new(b))
}

/// Sorts any slice by a string extracted from its elements.
pub fn sort_localized_standard_by<T, F, S>(items: &mut [T], key: F)
  where F: Fn(&T) -> S, S: AsRef<str>
{
  items.sort_by_cached_key(|x| CollationKey::new(key(x).as_ref()));
}

pub fn sorted_localized_standard<S: AsRef<str> + Clone>(items: &[S]) -> Vec<S> {
  let mut v = items.to_vec();
  sort_localized_standard_by(&mut v, |s| s.as_ref().to_string());
  v
}

/// Orders siblings with groups and folders first, then everything else, each
/// alphabetically by name and path. Recurses into every group.
pub fn sort_grouped_localized_standard(elements: &mut Vec<Element>) {
  elements.sort_by_cached_key(|e| (e.sort_rank(), CollationKey::new(&e.name_path_sort_string())));
  for e in elements.iter_mut() {
    if let Some(children) = e.sortable_children_mut() {
      sort_grouped_localized_standard(children);
    }
  }
}

/// Orders elements keyed by their owning target. The key is only appended to
/// break ties between elements that would otherwise render the same.
pub fn sorted_by_target_key<'a, K, I>(items: I) -> Vec<&'a Element>
  where K: Display + 'a, I: IntoIterator<Item = (&'a K, &'a Element)>
{
  let mut v: Vec<(CollationKey, &Element)> = items.into_iter()
    .map(|(k, e)| (CollationKey::new(&[e.name_path_sort_string(), k.to_string()].join("\t")), e))
    .collect();
  v.sort_by(|a, b| a.0.cmp(&b.0));
  v.into_iter().map(|(_, e)| e).collect()
}
