use crate::db::{
    self,
    machine::schema::Machine,
    machine_alias::schema::AliasSource,
};
use crate::Result;
use rusqlite::Connection;
use tracing::{debug, info, warn};

/// Minimum similarity score, out of 100, for a fuzzy match to be accepted.
pub const FUZZY_MATCH_THRESHOLD: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    Exact,
    Alias,
    Fuzzy { score: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub machine: Machine,
    pub kind: MatchKind,
}

/// Maps a raw, hand typed machine name to a known machine.
///
/// Tries an exact case-insensitive name match, then a learned alias, then fuzzy
/// matching against every machine name. Fuzzy hits are stored as aliases when
/// `learn` is set, so the next lookup of the same spelling is an alias match.
pub fn resolve_machine(raw_name: &str, learn: bool, conn: &Connection) -> Result<Option<Resolution>> {
    let name = raw_name.trim();
    if name.is_empty() {
        warn!("Empty machine name provided");
        return Ok(None);
    }
    if let Some(machine) = db::machine::blocking_queries::select_by_name(name, conn)? {
        debug!(name, machine = machine.name, "Exact match");
        return Ok(Some(Resolution {
            machine,
            kind: MatchKind::Exact,
        }));
    }
    if let Some(alias) = db::machine_alias::blocking_queries::select_by_alias(name, conn)? {
        let machine = db::machine::blocking_queries::select_by_id(alias.machine_id, conn)?;
        debug!(name, machine = machine.name, "Alias match");
        return Ok(Some(Resolution {
            machine,
            kind: MatchKind::Alias,
        }));
    }
    let machines = db::machine::blocking_queries::select_all(conn)?;
    let best = best_match(name, machines.iter().map(|it| it.name.as_str()));
    if let Some((index, score)) = best {
        if score >= FUZZY_MATCH_THRESHOLD {
            let machine = machines[index].clone();
            if learn {
                db::machine_alias::blocking_queries::insert(
                    name,
                    machine.id,
                    AliasSource::Fuzzy,
                    score / 100.0,
                    conn,
                )?;
            }
            info!(name, machine = machine.name, score, "Fuzzy match");
            return Ok(Some(Resolution {
                machine,
                kind: MatchKind::Fuzzy { score },
            }));
        }
    }
    warn!(name, "Could not resolve machine, needs manual review");
    Ok(None)
}

/// Index and score of the best scoring choice. Ties go to the earliest choice.
pub fn best_match<'a>(query: &str, choices: impl Iterator<Item = &'a str>) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, choice) in choices.enumerate() {
        let score = weighted_ratio(query, choice);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }
    best
}

/// Similarity in `0..=100`, the best of several comparisons:
/// plain, word order insensitive, word set, and substring when lengths differ a lot.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let len_a = a.chars().count() as f64;
    let len_b = b.chars().count() as f64;
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);
    let mut score = ratio(&a, &b);
    if len_ratio < 1.5 {
        score = score
            .max(token_sort_ratio(&a, &b) * 0.95)
            .max(token_set_ratio(&a, &b) * 0.95);
    } else {
        let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
        score = score.max(partial_ratio(&a, &b) * partial_scale);
    }
    (score * 100.0).round() / 100.0
}

fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// 2 * LCS / (len_a + len_b), the normalized indel similarity
fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / (a.len() + b.len()) as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for ca in a {
        let mut diagonal = 0;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a).join(" "), &sorted_tokens(b).join(" "))
}

fn token_set_ratio(a: &str, b: &str) -> f64 {
    let mut a_tokens = sorted_tokens(a);
    let mut b_tokens = sorted_tokens(b);
    a_tokens.dedup();
    b_tokens.dedup();
    let common: Vec<&str> = a_tokens.iter().filter(|it| b_tokens.contains(it)).copied().collect();
    if common.is_empty() {
        return 0.0;
    }
    let rest_a: Vec<&str> = a_tokens.iter().filter(|it| !common.contains(it)).copied().collect();
    let rest_b: Vec<&str> = b_tokens.iter().filter(|it| !common.contains(it)).copied().collect();
    if rest_a.is_empty() || rest_b.is_empty() {
        return 100.0;
    }
    let common = common.join(" ");
    let with_a = format!("{common} {}", rest_a.join(" "));
    let with_b = format!("{common} {}", rest_b.join(" "));
    ratio(&common, &with_a)
        .max(ratio(&common, &with_b))
        .max(ratio(&with_a, &with_b))
}

// Best ratio of the shorter string against every same length window of the longer one
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short: Vec<char> = short.chars().collect();
    let long: Vec<char> = long.chars().collect();
    if short.is_empty() {
        return 0.0;
    }
    long.windows(short.len())
        .map(|window| 200.0 * lcs_len(&short, window) as f64 / (2 * short.len()) as f64)
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod test {
    use super::MatchKind;
    use crate::{db, db::test::conn, Result};

    #[test]
    fn ratio() {
        assert_eq!(100.0, super::ratio("abc", "abc"));
        assert_eq!(0.0, super::ratio("abc", "xyz"));
        // lcs("this is a test", "this is a test!") = 14
        assert!((super::ratio("this is a test", "this is a test!") - 96.55).abs() < 0.01);
    }

    #[test]
    fn weighted_ratio() {
        assert_eq!(100.0, super::weighted_ratio("City Mall", "city  mall"));
        assert_eq!(95.0, super::weighted_ratio("Mall City", "City Mall"));
        assert!(super::weighted_ratio("City Mal", "City Mall") >= 85.0);
        assert!(super::weighted_ratio("Gym", "City Mall") < 85.0);
        assert_eq!(0.0, super::weighted_ratio("", "City Mall"));
    }

    #[test]
    fn weighted_ratio_partial() {
        assert_eq!(90.0, super::weighted_ratio("Cairo Festival City Mall Gate 3", "festival city"));
    }

    #[test]
    fn best_match() {
        let choices = ["Gym", "City Mall", "City Mall 2"];
        assert_eq!(Some((1, 100.0)), super::best_match("city mall", choices.into_iter()));
        assert_eq!(None, super::best_match("city mall", [].into_iter()));
    }

    #[test]
    fn resolve_exact() -> Result<()> {
        let conn = conn();
        let machine = db::machine::blocking_queries::insert("City Mall", "", None, None, &conn)?;
        let res = super::resolve_machine("  city mall ", true, &conn)?.unwrap();
        assert_eq!(machine.id, res.machine.id);
        assert_eq!(MatchKind::Exact, res.kind);
        Ok(())
    }

    #[test]
    fn resolve_empty() -> Result<()> {
        let conn = conn();
        assert_eq!(None, super::resolve_machine("  ", true, &conn)?);
        Ok(())
    }

    #[test]
    fn resolve_fuzzy_learns_alias() -> Result<()> {
        let conn = conn();
        let machine = db::machine::blocking_queries::insert("City Mall", "", None, None, &conn)?;
        let res = super::resolve_machine("City Mal", true, &conn)?.unwrap();
        assert_eq!(machine.id, res.machine.id);
        assert!(matches!(res.kind, MatchKind::Fuzzy { .. }));
        let alias = db::machine_alias::blocking_queries::select_by_alias("city mal", &conn)?.unwrap();
        assert_eq!(machine.id, alias.machine_id);
        assert!(alias.confidence >= 0.85);
        let res = super::resolve_machine("City Mal", true, &conn)?.unwrap();
        assert_eq!(MatchKind::Alias, res.kind);
        Ok(())
    }

    #[test]
    fn resolve_fuzzy_without_learning() -> Result<()> {
        let conn = conn();
        db::machine::blocking_queries::insert("City Mall", "", None, None, &conn)?;
        assert!(super::resolve_machine("City Mal", false, &conn)?.is_some());
        assert_eq!(None, db::machine_alias::blocking_queries::select_by_alias("City Mal", &conn)?);
        Ok(())
    }

    #[test]
    fn resolve_unknown() -> Result<()> {
        let conn = conn();
        db::machine::blocking_queries::insert("City Mall", "", None, None, &conn)?;
        assert_eq!(None, super::resolve_machine("Airport Terminal 2", true, &conn)?);
        Ok(())
    }
}
