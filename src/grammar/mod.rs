// Copyright 2020 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Grammar compilation: lowering the element DAG into a flat, epsilon-free
//! set of productions with precomputed analysis tables.

pub mod elements;
mod passes;

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::{
  error::GrammarError,
  grammar::elements::{CaseMode, Elem, ElemKind},
  result::ResultAction,
  tokenizer::Tokens,
  utils::{Name, ToDoc},
};

/// Identifies a symbol (terminal or nonterminal) in a compiled grammar.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SymbolId(u32);

impl SymbolId {
  fn index(self) -> usize {
    self.0 as usize
  }
}

/// Identifies a production in a compiled grammar. Production ids are
/// assigned in declaration order, which is what ranking ties break on.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ProdId(u32);

impl ProdId {
  pub(crate) fn index(self) -> usize {
    self.0 as usize
  }
}

/// The match function of a terminal symbol. `matches` returns the exclusive
/// end position of the longest match starting at `i`, or `None`.
#[derive(Debug)]
pub(crate) enum TermMatcher {
  Lit {
    text: String,
    words: usize,
    case: CaseMode,
  },
  Set {
    members: BTreeSet<String>,
    max_words: usize,
    case: CaseMode,
  },
  Rx {
    re: regex::Regex,
    spans: bool,
  },
  Null,
}

impl TermMatcher {
  pub(crate) fn matches(&self, toks: &Tokens, i: usize) -> Option<usize> {
    match self {
      TermMatcher::Lit { text, words, case } => {
        let j = i + words;
        if j > toks.len() {
          return None;
        }
        let window = match case {
          CaseMode::Insensitive => toks.window_folded(i, j),
          CaseMode::Sensitive => toks.window(i, j),
        };
        if window == *text {
          Some(j)
        } else {
          None
        }
      }
      TermMatcher::Set {
        members,
        max_words,
        case,
      } => {
        let top = (*max_words).min(toks.len().saturating_sub(i));
        for w in (1..=top).rev() {
          let window = match case {
            CaseMode::Insensitive => toks.window_folded(i, i + w),
            CaseMode::Sensitive => toks.window(i, i + w),
          };
          if members.contains(&window) {
            return Some(i + w);
          }
        }
        None
      }
      TermMatcher::Rx { re, spans } => {
        if *spans {
          for j in ((i + 1)..=toks.len()).rev() {
            if re.is_match(&toks.window(i, j)) {
              return Some(j);
            }
          }
          None
        } else if i < toks.len() && re.is_match(toks.get(i)) {
          Some(i + 1)
        } else {
          None
        }
      }
      TermMatcher::Null => None,
    }
  }
}

#[derive(Debug)]
pub(crate) enum SymbolKind {
  Term(TermMatcher),
  NonTerm,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct SymbolInfo {
  pub(crate) name: Name,
  pub(crate) kind: SymbolKind,
  /// Whether occurrences collect into a list (OneOrMore/ZeroOrMore).
  pub(crate) as_list: bool,
  pub(crate) ignore: bool,
  #[derivative(Debug = "ignore")]
  pub(crate) actions: Vec<ResultAction>,
}

impl SymbolInfo {
  pub(crate) fn is_terminal(&self) -> bool {
    matches!(self.kind, SymbolKind::Term(_))
  }
}

#[derive(Debug)]
pub(crate) struct Prod {
  pub(crate) lhs: SymbolId,
  pub(crate) rhs: Vec<SymbolId>,
  /// Whether the lhs recurs on the rhs (repetition lowering).
  pub(crate) recursive: bool,
}

/// A compiled grammar: a flat set of productions over interned symbols,
/// plus the analysis tables the parsing strategies consult. Grammars are
/// immutable after construction and may be shared freely across parsers.
pub struct Grammar {
  symbols: Vec<SymbolInfo>,
  prods: Vec<Prod>,
  goal: SymbolId,
  by_lhs: BTreeMap<SymbolId, Vec<ProdId>>,
  by_first: BTreeMap<SymbolId, Vec<ProdId>>,
  term_prods: BTreeMap<SymbolId, ProdId>,
  lc_terms: BTreeMap<SymbolId, BTreeSet<SymbolId>>,
  lc_nonterms: BTreeMap<SymbolId, BTreeSet<SymbolId>>,
}

impl Grammar {
  /// Compiles the element DAG rooted at `goal` with default settings.
  pub fn compile(goal: &Elem) -> Result<Grammar, GrammarError> {
    GrammarBuilder::new().build(goal)
  }

  /// The number of productions in the grammar.
  pub fn num_productions(&self) -> usize {
    self.prods.len()
  }

  /// The number of distinct symbols in the grammar.
  pub fn num_symbols(&self) -> usize {
    self.symbols.len()
  }

  /// The display name of the start symbol.
  pub fn goal_name(&self) -> &str {
    self.symbol(self.goal).name.str()
  }

  pub fn to_pretty(&self) -> String {
    crate::utils::render_doc(self)
  }

  pub(crate) fn goal(&self) -> SymbolId {
    self.goal
  }

  pub(crate) fn symbol(&self, id: SymbolId) -> &SymbolInfo {
    &self.symbols[id.index()]
  }

  pub(crate) fn prod(&self, id: ProdId) -> &Prod {
    &self.prods[id.index()]
  }

  pub(crate) fn is_terminal(&self, id: SymbolId) -> bool {
    self.symbol(id).is_terminal()
  }

  pub(crate) fn matcher(&self, id: SymbolId) -> &TermMatcher {
    match &self.symbol(id).kind {
      SymbolKind::Term(m) => m,
      SymbolKind::NonTerm => {
        panic!("symbol {} is not a terminal", self.symbol(id).name)
      }
    }
  }

  /// Productions whose head is `sym`.
  pub(crate) fn prods_of(&self, sym: SymbolId) -> &[ProdId] {
    self.by_lhs.get(&sym).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Productions whose first rhs symbol is `sym`.
  pub(crate) fn prods_with_first(&self, sym: SymbolId) -> &[ProdId] {
    self.by_first.get(&sym).map(Vec::as_slice).unwrap_or(&[])
  }

  /// The unit production of a terminal symbol.
  pub(crate) fn term_prod(&self, sym: SymbolId) -> ProdId {
    *self
      .term_prods
      .get(&sym)
      .expect("terminal symbols carry a unit production")
  }

  pub(crate) fn all_terminals(
    &self,
  ) -> impl Iterator<Item = SymbolId> + '_ {
    self.term_prods.keys().copied()
  }

  /// The terminals that can begin a derivation of `sym` (`sym` itself when
  /// it is a terminal).
  pub(crate) fn lc_terms_or_self(&self, sym: SymbolId) -> BTreeSet<SymbolId> {
    if self.is_terminal(sym) {
      std::iter::once(sym).collect()
    } else {
      self.lc_terms.get(&sym).cloned().unwrap_or_default()
    }
  }

  /// The nonterminals that can begin a derivation of `sym`, plus `sym`.
  pub(crate) fn lc_nonterms_with_self(
    &self,
    sym: SymbolId,
  ) -> BTreeSet<SymbolId> {
    let mut set = self.lc_nonterms.get(&sym).cloned().unwrap_or_default();
    if !self.is_terminal(sym) {
      set.insert(sym);
    }
    set
  }

  /// Whether the terminal `term` can begin a derivation of `prod`.
  pub(crate) fn prod_starts_with(&self, prod: ProdId, term: SymbolId) -> bool {
    let first = self.prod(prod).rhs[0];
    if first == term {
      return true;
    }
    self
      .lc_terms
      .get(&first)
      .map_or(false, |set| set.contains(&term))
  }

  /// The symbol expected after the dot of `edge`, or `None` if passive.
  pub(crate) fn next_symbol(
    &self,
    edge: crate::chart::Edge,
  ) -> Option<SymbolId> {
    self.prod(edge.prod()).rhs.get(edge.dot()).copied()
  }

  pub(crate) fn is_passive(&self, edge: crate::chart::Edge) -> bool {
    self.next_symbol(edge).is_none()
  }

  pub(crate) fn lhs_of(&self, edge: crate::chart::Edge) -> SymbolId {
    self.prod(edge.prod()).lhs
  }

  pub(crate) fn edge_summary(&self, edge: crate::chart::Edge) -> String {
    let prod = self.prod(edge.prod());
    let names: Vec<&str> = prod
      .rhs
      .iter()
      .map(|s| self.symbol(*s).name.str())
      .collect();
    format!(
      "[{}, {}] {} -> {} * {}",
      edge.start(),
      edge.end(),
      self.symbol(prod.lhs).name,
      names[..edge.dot()].join(" "),
      names[edge.dot()..].join(" "),
    )
  }
}

impl ToDoc for Grammar {
  fn to_doc<'a, DA: pretty::DocAllocator<'a>>(
    &self,
    da: &'a DA,
  ) -> pretty::DocBuilder<'a, DA, ()>
  where
    DA::Doc: Clone,
  {
    let start_entry = da
      .text("Start = ")
      .append(self.symbol(self.goal).name.to_doc(da))
      .append(da.text(";"));

    let prod_entries = self.prods.iter().map(|prod| {
      let rhs = da.intersperse(
        prod.rhs.iter().map(|s| self.symbol(*s).name.to_doc(da)),
        da.softline(),
      );
      self
        .symbol(prod.lhs)
        .name
        .to_doc(da)
        .append(da.text(" =>"))
        .append(da.softline())
        .append(rhs)
        .append(da.text(";"))
        .group()
    });

    da.intersperse(
      std::iter::once(start_entry).chain(prod_entries),
      da.line(),
    )
  }
}

impl std::fmt::Debug for Grammar {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let mut dbg_struct = f.debug_struct("Grammar");
    dbg_struct.field("goal", &self.symbol(self.goal).name);
    dbg_struct.field("symbols", &self.symbols.len());
    dbg_struct.field("productions", &self.prods.len());
    dbg_struct.finish()
  }
}

/// Registers named elements and compiles a goal element into a grammar.
/// This is the explicit equivalent of declaring grammar elements as named
/// attributes of a grammar class.
pub struct GrammarBuilder {
  case_sensitive: bool,
}

impl GrammarBuilder {
  pub fn new() -> Self {
    GrammarBuilder {
      case_sensitive: false,
    }
  }

  /// A builder taking its case policy from a parser configuration, so a
  /// single `ParserConfig` describes both how the grammar was compiled
  /// and how it is parsed.
  pub fn from_config(config: &crate::parser::ParserConfig) -> Self {
    GrammarBuilder {
      case_sensitive: config.case_sensitive,
    }
  }

  /// Forces case-sensitive matching for every terminal in the grammar,
  /// regardless of how the individual elements were constructed.
  pub fn case_sensitive(mut self, yes: bool) -> Self {
    self.case_sensitive = yes;
    self
  }

  /// Names `elem` and returns the named copy to compose with.
  pub fn add_named(&self, name: &str, elem: &Elem) -> Elem {
    elem.named(name)
  }

  /// Compiles the element DAG rooted at `goal`. An unnamed goal element is
  /// given the distinguished name `GOAL`.
  pub fn build(&self, goal: &Elem) -> Result<Grammar, GrammarError> {
    let mut compiler = Compiler {
      case_override: self.case_sensitive,
      symbols: Vec::new(),
      raw_prods: Vec::new(),
      seen: BTreeMap::new(),
      null_sym: None,
    };

    let root = compiler.intern(goal)?;
    if goal.user_name().is_none() {
      compiler.symbols[root.index()].name = Name::new("GOAL");
    }

    compiler.finish(root)
  }
}

impl Default for GrammarBuilder {
  fn default() -> Self {
    GrammarBuilder::new()
  }
}

struct Compiler {
  case_override: bool,
  symbols: Vec<SymbolInfo>,
  raw_prods: Vec<(SymbolId, Vec<SymbolId>)>,
  seen: BTreeMap<usize, SymbolId>,
  null_sym: Option<SymbolId>,
}

impl Compiler {
  fn effective_case(&self, case: CaseMode) -> CaseMode {
    if self.case_override {
      CaseMode::Sensitive
    } else {
      case
    }
  }

  fn alloc(&mut self, elem: &Elem, kind: SymbolKind) -> SymbolId {
    let id = SymbolId(self.symbols.len() as u32);
    self.seen.insert(elem.ptr_key(), id);
    let as_list = matches!(
      elem.0.kind,
      ElemKind::OneOrMore(_) | ElemKind::ZeroOrMore(_)
    );
    self.symbols.push(SymbolInfo {
      name: elem
        .user_name()
        .cloned()
        .unwrap_or_else(|| Name::new(&elem.display_name())),
      kind,
      as_list,
      ignore: elem.0.ignore,
      actions: elem.0.actions.clone(),
    });
    id
  }

  fn null_symbol(&mut self) -> SymbolId {
    if let Some(id) = self.null_sym {
      return id;
    }
    let id = SymbolId(self.symbols.len() as u32);
    self.symbols.push(SymbolInfo {
      name: Name::new("Null"),
      kind: SymbolKind::Term(TermMatcher::Null),
      as_list: false,
      ignore: false,
      actions: Vec::new(),
    });
    self.null_sym = Some(id);
    id
  }

  fn intern(&mut self, elem: &Elem) -> Result<SymbolId, GrammarError> {
    if let Some(&id) = self.seen.get(&elem.ptr_key()) {
      return Ok(id);
    }
    if elem.0.actions.len() > 1 {
      return Err(GrammarError::ConflictingActions {
        element: elem
          .user_name()
          .cloned()
          .unwrap_or_else(|| Name::new(&elem.display_name())),
      });
    }

    match &elem.0.kind {
      ElemKind::Lit { text, case } => {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
          return Err(GrammarError::EmptyLiteral);
        }
        let case = self.effective_case(*case);
        let normalized = words.join(" ");
        let matcher = TermMatcher::Lit {
          text: fold_for(&normalized, case),
          words: words.len(),
          case,
        };
        let id = self.alloc(elem, SymbolKind::Term(matcher));
        self.raw_prods.push((id, vec![id]));
        Ok(id)
      }
      ElemKind::Set { members, case } => {
        if members.is_empty() {
          return Err(GrammarError::EmptySet);
        }
        let case = self.effective_case(*case);
        let mut max_words = 1;
        let mut folded = BTreeSet::new();
        for member in members {
          let words: Vec<&str> = member.split_whitespace().collect();
          if words.is_empty() {
            return Err(GrammarError::EmptySet);
          }
          max_words = max_words.max(words.len());
          folded.insert(fold_for(&words.join(" "), case));
        }
        let matcher = TermMatcher::Set {
          members: folded,
          max_words,
          case,
        };
        let id = self.alloc(elem, SymbolKind::Term(matcher));
        self.raw_prods.push((id, vec![id]));
        Ok(id)
      }
      ElemKind::Rx { pattern, case } => {
        if pattern.is_empty() {
          return Err(GrammarError::EmptyPattern);
        }
        let case = self.effective_case(*case);
        let re = regex::RegexBuilder::new(&format!("^(?:{})$", pattern))
          .case_insensitive(case == CaseMode::Insensitive)
          .build()
          .map_err(|source| GrammarError::Regex {
            pattern: pattern.clone(),
            source: Box::new(source),
          })?;
        let spans = pattern.contains(' ') || pattern.contains("\\s");
        let matcher = TermMatcher::Rx { re, spans };
        let id = self.alloc(elem, SymbolKind::Term(matcher));
        self.raw_prods.push((id, vec![id]));
        Ok(id)
      }
      ElemKind::Null => {
        let id = self.null_symbol();
        self.seen.insert(elem.ptr_key(), id);
        Ok(id)
      }
      ElemKind::And(children) => {
        let id = self.alloc(elem, SymbolKind::NonTerm);
        let mut rhs = Vec::with_capacity(children.len());
        for child in children {
          rhs.push(self.intern(child)?);
        }
        self.raw_prods.push((id, rhs));
        Ok(id)
      }
      ElemKind::Or(children) => {
        let id = self.alloc(elem, SymbolKind::NonTerm);
        for child in children {
          let cid = self.intern(child)?;
          self.raw_prods.push((id, vec![cid]));
        }
        Ok(id)
      }
      ElemKind::Opt(child) => {
        let id = self.alloc(elem, SymbolKind::NonTerm);
        let cid = self.intern(child)?;
        let null = self.null_symbol();
        self.raw_prods.push((id, vec![cid]));
        self.raw_prods.push((id, vec![null]));
        Ok(id)
      }
      ElemKind::OneOrMore(child) => {
        let id = self.alloc(elem, SymbolKind::NonTerm);
        let cid = self.intern(child)?;
        self.raw_prods.push((id, vec![cid]));
        self.raw_prods.push((id, vec![cid, id]));
        Ok(id)
      }
      ElemKind::ZeroOrMore(child) => {
        let id = self.alloc(elem, SymbolKind::NonTerm);
        let cid = self.intern(child)?;
        let null = self.null_symbol();
        self.raw_prods.push((id, vec![null]));
        self.raw_prods.push((id, vec![cid]));
        self.raw_prods.push((id, vec![cid, id]));
        Ok(id)
      }
    }
  }

  /// Epsilon-eliminates the raw productions and assembles the grammar
  /// tables. Nullable occurrences are expanded into every removal variant,
  /// so the final production set is epsilon-free.
  fn finish(self, root: SymbolId) -> Result<Grammar, GrammarError> {
    let Compiler {
      symbols,
      raw_prods,
      null_sym,
      ..
    } = self;

    let is_term = |id: SymbolId| symbols[id.index()].is_terminal();

    let vacuous = passes::vacuous_symbols(&raw_prods, null_sym, is_term);
    if vacuous.contains(&root) {
      return Err(GrammarError::EmptyGoal);
    }
    let nullable = passes::nullable_symbols(&raw_prods, &vacuous);

    let mut prods: Vec<Prod> = Vec::new();
    let mut seen_rhs: BTreeSet<(SymbolId, Vec<SymbolId>)> = BTreeSet::new();
    for (lhs, rhs) in &raw_prods {
      let base: Vec<SymbolId> = rhs
        .iter()
        .copied()
        .filter(|s| !vacuous.contains(s))
        .collect();
      if base.is_empty() {
        continue;
      }
      let opt_pos: Vec<usize> = base
        .iter()
        .enumerate()
        .filter(|(_, s)| nullable.contains(*s))
        .map(|(i, _)| i)
        .collect();
      assert!(
        opt_pos.len() < 32,
        "too many optional symbols in one production"
      );
      for mask in 0..(1usize << opt_pos.len()) {
        let keep: Vec<SymbolId> = base
          .iter()
          .enumerate()
          .filter(|(i, _)| {
            opt_pos
              .iter()
              .position(|p| p == i)
              .map_or(true, |bit| mask & (1 << bit) == 0)
          })
          .map(|(_, s)| *s)
          .collect();
        if keep.is_empty() {
          continue;
        }
        if keep.len() == 1 && keep[0] == *lhs && !is_term(*lhs) {
          continue;
        }
        if seen_rhs.insert((*lhs, keep.clone())) {
          let recursive = keep.contains(lhs);
          prods.push(Prod {
            lhs: *lhs,
            rhs: keep,
            recursive,
          });
        }
      }
    }

    let mut by_lhs: BTreeMap<SymbolId, Vec<ProdId>> = BTreeMap::new();
    let mut by_first: BTreeMap<SymbolId, Vec<ProdId>> = BTreeMap::new();
    let mut term_prods = BTreeMap::new();
    for (i, prod) in prods.iter().enumerate() {
      let id = ProdId(i as u32);
      by_lhs.entry(prod.lhs).or_default().push(id);
      by_first.entry(prod.rhs[0]).or_default().push(id);
      if is_term(prod.lhs) {
        term_prods.insert(prod.lhs, id);
      }
    }

    let prod_view: Vec<(SymbolId, Vec<SymbolId>)> =
      prods.iter().map(|p| (p.lhs, p.rhs.clone())).collect();
    let (lc_terms, lc_nonterms) = passes::left_corners(&prod_view, is_term);

    if by_lhs.get(&root).map_or(true, Vec::is_empty) {
      return Err(GrammarError::EmptyGoal);
    }

    let grammar = Grammar {
      symbols,
      prods,
      goal: root,
      by_lhs,
      by_first,
      term_prods,
      lc_terms,
      lc_nonterms,
    };
    debug!(
      "compiled grammar `{}`: {} symbols, {} productions",
      grammar.goal_name(),
      grammar.num_symbols(),
      grammar.num_productions()
    );
    Ok(grammar)
  }
}

fn fold_for(text: &str, case: CaseMode) -> String {
  match case {
    CaseMode::Insensitive => text.to_ascii_lowercase(),
    CaseMode::Sensitive => text.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::elements::{lit, null, rx, set};
  use super::*;

  #[test]
  fn test_compile_flat_and() {
    let goal = lit("a").named("a") + lit("b").named("b");
    let g = Grammar::compile(&goal).unwrap();
    // One production for the And, plus one unit production per terminal.
    assert_eq!(g.num_productions(), 3);
    assert_eq!(g.goal_name(), "GOAL");
  }

  #[test]
  fn test_optional_is_epsilon_eliminated() {
    let goal = lit("a").named("a") + lit("b").named("b").opt();
    let g = Grammar::compile(&goal).unwrap();
    // GOAL => a Opt(b) and GOAL => a; Opt(b) => b; unit prods for a and b.
    assert_eq!(g.num_productions(), 5);
    let goal_prods = g.prods_of(g.goal());
    assert_eq!(goal_prods.len(), 2);
    assert!(g
      .prods_of(g.goal())
      .iter()
      .any(|p| g.prod(*p).rhs.len() == 1));
  }

  #[test]
  fn test_one_or_more_is_recursive() {
    let goal = lit("a").named("a").one_or_more();
    let g = Grammar::compile(&goal).unwrap();
    let recursive: Vec<_> = g
      .prods_of(g.goal())
      .iter()
      .filter(|p| g.prod(**p).recursive)
      .collect();
    assert_eq!(recursive.len(), 1);
  }

  #[test]
  fn test_nested_nullable_chain_is_fully_expanded() {
    // A production whose tail is entirely nullable must also exist in a
    // tail-less variant.
    let a = lit("a").named("a");
    let goal = a.clone() + a.opt() + a.zero_or_more() + a.zero_or_more();
    let g = Grammar::compile(&goal).unwrap();
    assert!(g
      .prods_of(g.goal())
      .iter()
      .any(|p| g.prod(*p).rhs.len() == 1));
  }

  #[test]
  fn test_goal_deriving_only_epsilon_is_an_error() {
    let goal = null().opt();
    assert!(matches!(
      Grammar::compile(&goal),
      Err(GrammarError::EmptyGoal)
    ));
  }

  #[test]
  fn test_conflicting_result_actions_are_a_grammar_error() {
    let elem = lit("x")
      .named("x")
      .set_result_action(|_| Ok(()))
      .set_result_action(|_| Ok(()));
    assert!(matches!(
      Grammar::compile(&elem),
      Err(GrammarError::ConflictingActions { .. })
    ));
  }

  #[test]
  fn test_bad_regex_is_a_grammar_error() {
    let goal = rx("(unclosed");
    assert!(matches!(
      Grammar::compile(&goal),
      Err(GrammarError::Regex { .. })
    ));
  }

  #[test]
  fn test_left_corner_tables() {
    let action = set(["change", "set"]).named("action");
    let light = set(["top", "bottom"]).named("light");
    let one = (action + light).named("one");
    let goal = one.one_or_more();
    let g = Grammar::compile(&goal).unwrap();

    let goal_lc = g.lc_terms_or_self(g.goal());
    assert_eq!(goal_lc.len(), 1);
    let action_sym = *goal_lc.iter().next().unwrap();
    assert_eq!(g.symbol(action_sym).name.str(), "action");

    let nts = g.lc_nonterms_with_self(g.goal());
    assert!(nts.contains(&g.goal()));
    assert!(nts
      .iter()
      .any(|n| g.symbol(*n).name.str() == "one"));
  }

  #[test]
  fn test_or_alternatives_keep_declaration_order() {
    let first = lit("x").named("first");
    let second = lit("x").named("second");
    let goal = first | second;
    let g = Grammar::compile(&goal).unwrap();
    let prods = g.prods_of(g.goal());
    assert_eq!(prods.len(), 2);
    assert!(prods[0] < prods[1]);
    let first_rhs = g.prod(prods[0]).rhs[0];
    assert_eq!(g.symbol(first_rhs).name.str(), "first");
  }
}
