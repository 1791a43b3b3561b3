//! Identity resolution
//!
//! Source reports spell people however the person typing them felt that day.
//! [`match_names`] maps each source name onto at most one roster name using,
//! in order:
//!
//! 1. exact match of the normalized name
//! 2. match on the (first token, last token) pair
//! 3. fuzzy match on a similarity score, accepted only when it is both good
//!    enough and clearly ahead of the runner-up
//!
//! Every pass only considers roster entries not already claimed by an
//! earlier source name.

use std::collections::{HashMap, HashSet};

use unicode_normalization::UnicodeNormalization;

/// Minimum fuzzy score for a match
pub const FUZZY_THRESHOLD: f64 = 0.78;
/// Minimum lead of the best fuzzy score over the runner-up
pub const FUZZY_SEPARATION: f64 = 0.03;
/// Fuzzy bonus when last tokens are equal
pub const LAST_TOKEN_BONUS: f64 = 0.08;
/// Fuzzy bonus when first tokens are equal
pub const FIRST_TOKEN_BONUS: f64 = 0.05;

/// Fold a name to lowercase ASCII alphanumeric tokens separated by single spaces
///
/// ```
/// use payroll_sheets::normalize_name;
///
/// assert_eq!(normalize_name("  José  O'Neil-Díaz "), "jose o neil diaz");
/// ```
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First and last token of a normalized name (empty strings when blank)
pub fn first_last(normalized: &str) -> (&str, &str) {
    let mut tokens = normalized.split(' ').filter(|t| !t.is_empty());
    let first = tokens.next().unwrap_or("");
    let last = tokens.last().unwrap_or(first);
    (first, last)
}

/// Similarity ratio of two strings, `2 * matches / (len(a) + len(b))`
///
/// Matches are counted by repeatedly taking the longest common block and
/// recursing on both sides of it. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * SequenceMatcher::new(&a, &b).matching_characters() as f64 / total as f64
}

/// Longest-common-block matcher over two character sequences
struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b_positions: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b_positions: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b_positions.entry(c).or_default().push(j);
        }
        Self { a, b, b_positions }
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` within the given windows
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
        let mut run_lengths: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b_positions.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_lengths.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            run_lengths = next;
        }

        (best_i, best_j, best_k)
    }

    /// Total size of all matching blocks
    fn matching_characters(&self) -> usize {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut matched = 0;

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        matched
    }
}

/// Which pass resolved a name
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchMethod {
    Exact,
    FirstLast,
    /// Fuzzy match with its score (bonuses included)
    Fuzzy(f64),
}

/// One resolved source name
#[derive(Debug, Clone, PartialEq)]
pub struct NameMatch {
    /// Index into the query list
    pub query: usize,
    /// Index into the candidate list
    pub candidate: usize,
    pub method: MatchMethod,
}

/// Outcome of [`match_names`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameMatches {
    /// Matches in query order
    pub matches: Vec<NameMatch>,
    /// Indices of queries left unmatched, in query order
    pub unmatched: Vec<usize>,
}

impl NameMatches {
    /// Candidate index claimed by a query
    pub fn candidate_for(&self, query: usize) -> Option<usize> {
        self.matches
            .iter()
            .find(|m| m.query == query)
            .map(|m| m.candidate)
    }

    /// Query index that claimed a candidate
    pub fn query_for(&self, candidate: usize) -> Option<usize> {
        self.matches
            .iter()
            .find(|m| m.candidate == candidate)
            .map(|m| m.query)
    }
}

struct Candidate {
    normalized: String,
}

impl Candidate {
    fn first_last(&self) -> (&str, &str) {
        first_last(&self.normalized)
    }
}

/// Match source names (`queries`) against roster names (`candidates`)
///
/// Queries are resolved in order and the first query to claim a candidate
/// keeps it. Candidates are tracked by index, so duplicate roster names are
/// distinct entries (and tie each other in every pass).
///
/// ```
/// use payroll_sheets::match_names;
///
/// let roster = ["Maria Lopez", "Jonathan Smith"];
/// let result = match_names(&roster, &["maria  lopez", "Jon Smith", "Nobody"]);
/// assert_eq!(result.candidate_for(0), Some(0));
/// assert_eq!(result.candidate_for(1), Some(1));
/// assert_eq!(result.unmatched, vec![2]);
/// ```
pub fn match_names<C: AsRef<str>, Q: AsRef<str>>(candidates: &[C], queries: &[Q]) -> NameMatches {
    let candidates: Vec<Candidate> = candidates
        .iter()
        .map(|name| Candidate {
            normalized: normalize_name(name.as_ref()),
        })
        .collect();

    let mut claimed: HashSet<usize> = HashSet::new();
    let mut result = NameMatches::default();

    for (query_index, query) in queries.iter().enumerate() {
        let normalized = normalize_name(query.as_ref());
        let exact: Vec<usize> = available(candidates.len(), &claimed)
            .filter(|&i| candidates[i].normalized == normalized)
            .collect();

        let method_and_candidate = if let [only] = exact[..] {
            Some((MatchMethod::Exact, only))
        } else {
            let key = first_last(&normalized);
            let by_first_last: Vec<usize> = available(candidates.len(), &claimed)
                .filter(|&i| candidates[i].first_last() == key)
                .collect();
            if let [only] = by_first_last[..] {
                Some((MatchMethod::FirstLast, only))
            } else {
                fuzzy_match(&candidates, available(candidates.len(), &claimed), &normalized)
                    .map(|(score, i)| (MatchMethod::Fuzzy(score), i))
            }
        };

        match method_and_candidate {
            Some((method, candidate)) => {
                log::debug!("matched {:?} to candidate {} ({:?})", query.as_ref(), candidate, method);
                claimed.insert(candidate);
                result.matches.push(NameMatch {
                    query: query_index,
                    candidate,
                    method,
                });
            }
            None => result.unmatched.push(query_index),
        }
    }

    result
}

/// Candidate indices not yet claimed
fn available(count: usize, claimed: &HashSet<usize>) -> impl Iterator<Item = usize> + '_ {
    (0..count).filter(move |i| !claimed.contains(i))
}

fn fuzzy_match(
    candidates: &[Candidate],
    available: impl Iterator<Item = usize>,
    normalized: &str,
) -> Option<(f64, usize)> {
    let (first, last) = first_last(normalized);

    let mut scored: Vec<(f64, usize)> = available
        .map(|i| {
            let candidate = &candidates[i];
            let (candidate_first, candidate_last) = candidate.first_last();
            let mut score = similarity(normalized, &candidate.normalized);
            if !last.is_empty() && last == candidate_last {
                score += LAST_TOKEN_BONUS;
            }
            if !first.is_empty() && first == candidate_first {
                score += FIRST_TOKEN_BONUS;
            }
            (score, i)
        })
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| candidates[*b].normalized.cmp(&candidates[*a].normalized))
            .then_with(|| a.cmp(b))
    });

    let &(best, index) = scored.first()?;
    let runner_up = scored.get(1).map_or(0.0, |&(score, _)| score);
    (best >= FUZZY_THRESHOLD && best - runner_up >= FUZZY_SEPARATION).then_some((best, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Zoë  Ångström"), "zoe angstrom");
        assert_eq!(normalize_name("SMITH, JON (2)"), "smith jon 2");
        assert_eq!(normalize_name("  "), "");
        assert_eq!(normalize_name("李"), "");
    }

    #[test]
    fn test_first_last() {
        assert_eq!(first_last("jon q smith"), ("jon", "smith"));
        assert_eq!(first_last("cher"), ("cher", "cher"));
        assert_eq!(first_last(""), ("", ""));
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
        assert_eq!(similarity("abcd", "abcd"), 1.0);
        // " smith" then "jon": 9 of 23 characters
        assert!((similarity("jon smith", "jonathan smith") - 18.0 / 23.0).abs() < 1e-12);
        // "bcd" only; "a" falls outside both remaining windows
        assert!((similarity("abcd", "bcda") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_exact_then_first_last() {
        let roster = ["Maria Lopez", "Jon Q Smith"];
        let result = match_names(&roster, &["MARIA LOPEZ", "Jon Smith"]);
        assert_eq!(result.matches[0].method, MatchMethod::Exact);
        assert_eq!(result.matches[1].method, MatchMethod::FirstLast);
        assert_eq!(result.candidate_for(1), Some(1));
        assert!(result.unmatched.is_empty());
    }

    #[test]
    fn test_fuzzy_accept() {
        let roster = ["Maria Lopez", "Jonathan Smith"];
        let result = match_names(&roster, &["Jon Smith"]);
        match result.matches[0].method {
            MatchMethod::Fuzzy(score) => assert!((score - (18.0 / 23.0 + 0.08)).abs() < 1e-9),
            other => panic!("unexpected method {other:?}"),
        }
        assert_eq!(result.candidate_for(0), Some(1));
    }

    #[test]
    fn test_fuzzy_ambiguous() {
        let roster = ["Jon Smithe", "Jon Smitha"];
        let result = match_names(&roster, &["Jon Smith"]);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched, vec![0]);
    }

    #[test]
    fn test_fuzzy_below_threshold() {
        let result = match_names(&["Maria Lopez"], &["Mark Lewis"]);
        assert_eq!(result.unmatched, vec![0]);
    }

    #[test]
    fn test_first_claim_wins() {
        let roster = ["Maria Lopez"];
        let result = match_names(&roster, &["Maria Lopez", "maria lopez"]);
        assert_eq!(result.candidate_for(0), Some(0));
        assert_eq!(result.unmatched, vec![1]);
        assert_eq!(result.query_for(0), Some(0));
    }

    #[test]
    fn test_duplicate_roster_names() {
        let roster = ["Maria Lopez", "Maria Lopez"];
        let result = match_names(&roster, &["Maria Lopez"]);
        assert_eq!(result.unmatched, vec![0]);

        let result = match_names(&roster[..1], &["Maria Lopez"]);
        assert_eq!(result.candidate_for(0), Some(0));
    }
}
