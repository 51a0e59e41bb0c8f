//! Fixed-point analyses over the lowered productions.
//!
//! Each pass grows its symbol tables in rounds over the production list
//! and stops when a full round adds nothing new.

use std::collections::{BTreeMap, BTreeSet};

use crate::grammar::SymbolId;

/// Symbols that derive *only* the empty string. These contribute nothing to
/// any parse and are stripped from every right-hand side.
pub(crate) fn vacuous_symbols(
  prods: &[(SymbolId, Vec<SymbolId>)],
  null_sym: Option<SymbolId>,
  is_terminal: impl Fn(SymbolId) -> bool,
) -> BTreeSet<SymbolId> {
  let mut vacuous: BTreeSet<SymbolId> = null_sym.into_iter().collect();

  let mut by_lhs: BTreeMap<SymbolId, Vec<&Vec<SymbolId>>> = BTreeMap::new();
  for (lhs, rhs) in prods {
    by_lhs.entry(*lhs).or_default().push(rhs);
  }

  loop {
    let mut grew = false;
    for (lhs, rhss) in &by_lhs {
      if is_terminal(*lhs) || vacuous.contains(lhs) {
        continue;
      }
      let every_rhs_vacuous = rhss
        .iter()
        .all(|rhs| rhs.iter().all(|sym| vacuous.contains(sym)));
      if every_rhs_vacuous {
        vacuous.insert(*lhs);
        grew = true;
      }
    }
    if !grew {
      return vacuous;
    }
  }
}

/// Symbols that *can* derive the empty string (vacuous symbols included).
pub(crate) fn nullable_symbols(
  prods: &[(SymbolId, Vec<SymbolId>)],
  vacuous: &BTreeSet<SymbolId>,
) -> BTreeSet<SymbolId> {
  let mut nullable = vacuous.clone();

  loop {
    let mut grew = false;
    for (lhs, rhs) in prods {
      if nullable.contains(lhs) {
        continue;
      }
      if rhs.iter().all(|sym| nullable.contains(sym)) {
        nullable.insert(*lhs);
        grew = true;
      }
    }
    if !grew {
      return nullable;
    }
  }
}

/// Left-corner closure over the final (epsilon-free) production list.
///
/// `lc_terms[n]` holds every terminal that can begin a derivation of the
/// nonterminal `n`, and `lc_nonterms[n]` every nonterminal that can. A
/// production contributes its first rhs symbol directly, and a nonterminal
/// first symbol also forwards everything already known about itself.
pub(crate) fn left_corners(
  prods: &[(SymbolId, Vec<SymbolId>)],
  is_terminal: impl Fn(SymbolId) -> bool,
) -> (
  BTreeMap<SymbolId, BTreeSet<SymbolId>>,
  BTreeMap<SymbolId, BTreeSet<SymbolId>>,
) {
  let mut lc_terms: BTreeMap<SymbolId, BTreeSet<SymbolId>> = BTreeMap::new();
  let mut lc_nonterms: BTreeMap<SymbolId, BTreeSet<SymbolId>> =
    BTreeMap::new();

  loop {
    let mut grew = false;
    for (lhs, rhs) in prods {
      if is_terminal(*lhs) {
        continue;
      }
      let first = rhs[0];
      if is_terminal(first) {
        grew |= lc_terms.entry(*lhs).or_default().insert(first);
      } else {
        grew |= lc_nonterms.entry(*lhs).or_default().insert(first);
        grew |= absorb_corners(&mut lc_nonterms, *lhs, first);
        grew |= absorb_corners(&mut lc_terms, *lhs, first);
      }
    }
    if !grew {
      return (lc_terms, lc_nonterms);
    }
  }
}

/// Unions the corner set recorded for `src` into the set for `dst`,
/// reporting whether `dst` gained anything.
fn absorb_corners(
  corners: &mut BTreeMap<SymbolId, BTreeSet<SymbolId>>,
  dst: SymbolId,
  src: SymbolId,
) -> bool {
  if dst == src {
    return false;
  }
  let from = match corners.get(&src) {
    Some(set) if !set.is_empty() => set.clone(),
    _ => return false,
  };
  let into = corners.entry(dst).or_default();
  let before = into.len();
  into.extend(from);
  into.len() != before
}
