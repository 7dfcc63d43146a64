//! Reconcile log display names against the course roster.
//!
//! Resolution order (first hit wins):
//!
//! 1. exact full name (`"Steven Smith"`)
//! 2. exact alias (`"Steve Smith"`)
//! 3. case/punctuation-insensitive full name or alias
//! 4. partial: first name plus an optional last-name prefix (`"Steven S."`),
//!    or `"Last, First"` order; must identify exactly one student
//!
//! Matching is many-to-one: any number of log variants may resolve to the
//! same student, but a variant never resolves to more than one.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::Roster;
use crate::names::{clean_display_name, match_key, tokens};

/// Minimum length of a first-name prefix accepted by partial matching.
const MIN_PREFIX_LEN: usize = 3;

// ── Outcome types ─────────────────────────────────────────────────────────────

/// How a log name was resolved to a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Alias,
    CaseInsensitive,
    Partial,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchKind::Exact => "exact",
            MatchKind::Alias => "alias",
            MatchKind::CaseInsensitive => "case-insensitive",
            MatchKind::Partial => "partial",
        };
        f.write_str(s)
    }
}

/// Result of resolving one raw log name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Resolved to exactly one roster student.
    Matched { student: String, kind: MatchKind },
    /// Several students fit equally well; candidates are sorted.
    Ambiguous(Vec<String>),
    /// No roster student fits.
    Unmatched,
}

impl MatchOutcome {
    /// The matched canonical name, if any.
    pub fn student(&self) -> Option<&str> {
        match self {
            MatchOutcome::Matched { student, .. } => Some(student),
            _ => None,
        }
    }
}

// ── NameMatcher ───────────────────────────────────────────────────────────────

/// Pre-computed token data for partial matching.
#[derive(Debug, Clone)]
struct Candidate {
    full_name: String,
    /// First token of the first name and, if present, of the alias.
    first_tokens: Vec<String>,
    /// Last name with spaces removed, lowercased.
    last_compact: String,
    /// Final token of the last name, lowercased.
    last_token: String,
}

/// Resolves raw display names to canonical roster names.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    full_names: HashMap<String, String>,
    aliases: HashMap<String, String>,
    folded: HashMap<String, BTreeSet<String>>,
    candidates: Vec<Candidate>,
    allow_partial: bool,
}

impl NameMatcher {
    /// Build a matcher over `roster`.
    ///
    /// An alias equal to another student's full name, or already claimed by
    /// an earlier roster row, is ignored with a warning.
    pub fn new(roster: &Roster, allow_partial: bool) -> Self {
        let mut full_names = HashMap::new();
        let mut folded: HashMap<String, BTreeSet<String>> = HashMap::new();
        for entry in roster.entries() {
            let full = entry.full_name();
            full_names.insert(full.clone(), full.clone());
            folded
                .entry(match_key(&full))
                .or_default()
                .insert(full.clone());
        }

        let mut aliases: HashMap<String, String> = HashMap::new();
        for entry in roster.entries() {
            let Some(alias) = entry.alias.as_deref() else {
                continue;
            };
            let alias = clean_display_name(alias);
            let full = entry.full_name();
            if let Some(owner) = full_names.get(&alias) {
                if *owner != full {
                    warn!(
                        "alias \"{}\" of {} is another student's name; ignoring it",
                        alias, full
                    );
                }
                continue;
            }
            if let Some(owner) = aliases.get(&alias) {
                warn!(
                    "alias \"{}\" already belongs to {}; ignoring it for {}",
                    alias, owner, full
                );
                continue;
            }
            folded
                .entry(match_key(&alias))
                .or_default()
                .insert(full.clone());
            aliases.insert(alias, full);
        }

        let mut candidates: Vec<Candidate> = roster
            .entries()
            .iter()
            .map(|entry| {
                let mut first_tokens: Vec<String> =
                    tokens(&entry.first_name).into_iter().take(1).collect();
                if let Some(alias) = entry.alias.as_deref() {
                    if let Some(t) = tokens(alias).into_iter().next() {
                        if !first_tokens.contains(&t) {
                            first_tokens.push(t);
                        }
                    }
                }
                let last_tokens = tokens(&entry.last_name);
                Candidate {
                    full_name: entry.full_name(),
                    first_tokens,
                    last_compact: last_tokens.concat(),
                    last_token: last_tokens.last().cloned().unwrap_or_default(),
                }
            })
            .collect();
        candidates.sort_by(|a, b| a.full_name.cmp(&b.full_name));

        Self {
            full_names,
            aliases,
            folded,
            candidates,
            allow_partial,
        }
    }

    /// Resolve one raw display name.
    pub fn resolve(&self, raw: &str) -> MatchOutcome {
        let name = clean_display_name(raw);
        if name.is_empty() {
            return MatchOutcome::Unmatched;
        }

        if let Some(full) = self.full_names.get(&name) {
            return MatchOutcome::Matched {
                student: full.clone(),
                kind: MatchKind::Exact,
            };
        }
        if let Some(full) = self.aliases.get(&name) {
            return MatchOutcome::Matched {
                student: full.clone(),
                kind: MatchKind::Alias,
            };
        }
        if let Some(set) = self.folded.get(&match_key(&name)) {
            return Self::outcome_from(set, MatchKind::CaseInsensitive);
        }

        if self.allow_partial {
            let found = self.partial_candidates(&name);
            if !found.is_empty() {
                return Self::outcome_from(&found, MatchKind::Partial);
            }
        }

        MatchOutcome::Unmatched
    }

    fn outcome_from(set: &BTreeSet<String>, kind: MatchKind) -> MatchOutcome {
        if set.len() == 1 {
            if let Some(student) = set.iter().next() {
                return MatchOutcome::Matched {
                    student: student.clone(),
                    kind,
                };
            }
        }
        MatchOutcome::Ambiguous(set.iter().cloned().collect())
    }

    /// Students whose first name (or alias) and last-name prefix fit `name`.
    ///
    /// A whole first-name token beats a first-name prefix: `"Ann"` means Ann
    /// even when an Anna is also enrolled.
    fn partial_candidates(&self, name: &str) -> BTreeSet<String> {
        let toks = Self::ordered_tokens(name);
        let Some(first) = toks.first() else {
            return BTreeSet::new();
        };
        let last = if toks.len() > 1 { toks.last() } else { None };

        let last_fits = |c: &&Candidate| match last {
            None => true,
            Some(l) => {
                c.last_compact.starts_with(l.as_str()) || c.last_token.starts_with(l.as_str())
            }
        };

        let exact: BTreeSet<String> = self
            .candidates
            .iter()
            .filter(|c| c.first_tokens.iter().any(|t| t == first))
            .filter(last_fits)
            .map(|c| c.full_name.clone())
            .collect();
        if !exact.is_empty() || first.len() < MIN_PREFIX_LEN {
            return exact;
        }

        self.candidates
            .iter()
            .filter(|c| c.first_tokens.iter().any(|t| t.starts_with(first.as_str())))
            .filter(last_fits)
            .map(|c| c.full_name.clone())
            .collect()
    }

    /// Tokens in `first ... last` order; `"Smith, John"` becomes
    /// `["john", "smith"]`.
    fn ordered_tokens(name: &str) -> Vec<String> {
        if let Some((last, first)) = name.split_once(',') {
            let mut toks = tokens(first);
            toks.extend(tokens(last));
            return toks;
        }
        tokens(name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
