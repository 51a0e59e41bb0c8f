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

//! The chart inference rules and the strategies that compose them.
//!
//! Each rule is a stateless step over the rule context: `seed` fires once
//! before the agenda loop, `on_edge` fires for every edge popped from the
//! agenda. All edge creation funnels through the context, which handles
//! deduplication, agenda scheduling, goal-event notification and the
//! bookkeeping the robust-skip machinery reads.

use std::collections::{BTreeMap, BTreeSet};

use log::trace;

use crate::{
  chart::{Agenda, Chart, Discipline, Edge},
  grammar::{Grammar, SymbolId},
  tokenizer::Tokens,
  utils::Name,
};

pub(crate) struct RuleCx<'a> {
  pub(crate) grammar: &'a Grammar,
  pub(crate) tokens: &'a Tokens,
  pub(crate) chart: Chart,
  pub(crate) agenda: Agenda,
  /// Positions covered by a successful terminal match. A position that
  /// stays unmatched at quiescence is a candidate for a robust skip.
  pub(crate) matched: Vec<bool>,
  /// Terminals that were tried and failed, by position. Feeds parse
  /// failure diagnostics.
  pub(crate) expected: BTreeMap<usize, BTreeSet<Name>>,
  /// Passive goal edges starting at 0, pending listener notification.
  pub(crate) goal_events: Vec<Edge>,
  match_cache: BTreeMap<(SymbolId, usize), Option<usize>>,
  pub(crate) steps: usize,
}

impl<'a> RuleCx<'a> {
  pub(crate) fn new(
    grammar: &'a Grammar,
    tokens: &'a Tokens,
    discipline: Discipline,
  ) -> RuleCx<'a> {
    let len = tokens.len();
    RuleCx {
      grammar,
      tokens,
      chart: Chart::new(),
      agenda: Agenda::new(discipline),
      matched: vec![false; len],
      expected: BTreeMap::new(),
      goal_events: Vec::new(),
      match_cache: BTreeMap::new(),
      steps: 0,
    }
  }

  /// Inserts an edge with no derivation record (seeds, predictions and
  /// scans). Returns true iff the edge is new.
  pub(crate) fn insert_seed(&mut self, edge: Edge) -> bool {
    self.insert_inner(edge)
  }

  /// Inserts an edge derived by the fundamental rule and records its
  /// back-pointers. Back-pointers accumulate even when the edge itself is
  /// a duplicate, which is how ambiguous derivations are kept.
  pub(crate) fn insert_derived(
    &mut self,
    edge: Edge,
    prev: Edge,
    child: Edge,
  ) -> bool {
    let is_new = self.insert_inner(edge);
    self.chart.add_backpointers(edge, prev, child);
    is_new
  }

  fn insert_inner(&mut self, edge: Edge) -> bool {
    let is_new = self.chart.insert(edge, self.grammar);
    if is_new {
      trace!("insert {}", self.grammar.edge_summary(edge));
      self.agenda.push(edge);
      if edge.start() == 0
        && self.grammar.is_passive(edge)
        && self.grammar.lhs_of(edge) == self.grammar.goal()
      {
        self.goal_events.push(edge);
      }
    }
    is_new
  }

  /// Runs the match function of `term` at `pos`, memoized per parse.
  /// Successful matches mark every covered position; failures record the
  /// terminal as expected-but-absent for diagnostics.
  pub(crate) fn match_terminal(
    &mut self,
    term: SymbolId,
    pos: usize,
  ) -> Option<usize> {
    if let Some(&res) = self.match_cache.get(&(term, pos)) {
      return res;
    }
    let res = self.grammar.matcher(term).matches(self.tokens, pos);
    match res {
      Some(k) => {
        for p in pos..k {
          self.matched[p] = true;
        }
      }
      None => {
        if pos < self.tokens.len() {
          self
            .expected
            .entry(pos)
            .or_default()
            .insert(self.grammar.symbol(term).name.clone());
        }
      }
    }
    self.match_cache.insert((term, pos), res);
    res
  }
}

pub(crate) trait ChartRule: std::fmt::Debug {
  fn seed(&self, _cx: &mut RuleCx) {}
  fn on_edge(&self, _cx: &mut RuleCx, _edge: Edge) {}
}

/// Seeds active edges `GOAL -> . alpha` at [0, 0) for every goal
/// production.
#[derive(Debug)]
struct TopDownInit;

impl ChartRule for TopDownInit {
  fn seed(&self, cx: &mut RuleCx) {
    let grammar = cx.grammar;
    for &prod in grammar.prods_of(grammar.goal()) {
      cx.insert_seed(Edge::new(prod, 0, 0, 0));
    }
  }
}

/// On an active edge expecting a nonterminal N at position j, adds
/// `N -> . beta` at [j, j) for every production of N.
#[derive(Debug)]
struct TopDownPredict;

impl ChartRule for TopDownPredict {
  fn on_edge(&self, cx: &mut RuleCx, edge: Edge) {
    let grammar = cx.grammar;
    let expected = match grammar.next_symbol(edge) {
      Some(sym) if !grammar.is_terminal(sym) => sym,
      _ => return,
    };
    for &prod in grammar.prods_of(expected) {
      cx.insert_seed(Edge::new(prod, edge.end(), edge.end(), 0));
    }
  }
}

/// On an active edge expecting a terminal T at position j, runs T's match
/// function; a success at k inserts the passive edge `T -> tokens .` over
/// [j, k).
#[derive(Debug)]
struct Scan;

impl ChartRule for Scan {
  fn on_edge(&self, cx: &mut RuleCx, edge: Edge) {
    let grammar = cx.grammar;
    let term = match grammar.next_symbol(edge) {
      Some(sym) if grammar.is_terminal(sym) => sym,
      _ => return,
    };
    if let Some(end) = cx.match_terminal(term, edge.end()) {
      let unit = grammar.term_prod(term);
      cx.insert_seed(Edge::new(unit, edge.end(), end, 1));
    }
  }
}

/// Seeds passive terminal edges for every terminal at every position.
/// This is the bottom-up replacement for goal-directed scanning.
#[derive(Debug)]
struct BottomUpSeed;

impl ChartRule for BottomUpSeed {
  fn seed(&self, cx: &mut RuleCx) {
    let grammar = cx.grammar;
    let terminals: Vec<SymbolId> = grammar.all_terminals().collect();
    for term in terminals {
      for pos in 0..cx.tokens.len() {
        if let Some(end) = cx.match_terminal(term, pos) {
          let unit = grammar.term_prod(term);
          cx.insert_seed(Edge::new(unit, pos, end, 1));
        }
      }
    }
  }
}

/// On a passive edge with lhs N at [i, j), adds `M -> . N delta` at
/// [i, i) for every production whose first symbol is N.
#[derive(Debug)]
struct BottomUpPredict;

impl ChartRule for BottomUpPredict {
  fn on_edge(&self, cx: &mut RuleCx, edge: Edge) {
    let grammar = cx.grammar;
    if !grammar.is_passive(edge) {
      return;
    }
    let lhs = grammar.lhs_of(edge);
    for &prod in grammar.prods_with_first(lhs) {
      cx.insert_seed(Edge::new(prod, edge.start(), edge.start(), 0));
    }
  }
}

/// The left-corner rule: on an active edge expecting S at position j, try
/// the left-corner terminals of S against the input at j. A match inserts
/// the passive terminal edge and predicts, at [j, j), every production of
/// every left-corner nonterminal of S whose own left corner covers the
/// matched terminal. Because it only ever fires from an existing active
/// edge, prediction stays goal-directed.
#[derive(Debug)]
struct LeftCornerPredictScan;

impl ChartRule for LeftCornerPredictScan {
  fn on_edge(&self, cx: &mut RuleCx, edge: Edge) {
    let grammar = cx.grammar;
    let expected = match grammar.next_symbol(edge) {
      Some(sym) => sym,
      None => return,
    };
    let pos = edge.end();
    for term in grammar.lc_terms_or_self(expected) {
      let end = match cx.match_terminal(term, pos) {
        Some(end) => end,
        None => continue,
      };
      let unit = grammar.term_prod(term);
      cx.insert_seed(Edge::new(unit, pos, end, 1));
      if grammar.is_terminal(expected) {
        continue;
      }
      for nonterm in grammar.lc_nonterms_with_self(expected) {
        for &prod in grammar.prods_of(nonterm) {
          if grammar.prod_starts_with(prod, term) {
            cx.insert_seed(Edge::new(prod, pos, pos, 0));
          }
        }
      }
    }
  }
}

/// The fundamental rule: an active edge `A -> alpha . B beta` over [i, j)
/// and a passive edge `B -> gamma .` over [j, k) combine into
/// `A -> alpha B . beta` over [i, k). Fires symmetrically from whichever
/// side arrives second.
#[derive(Debug)]
struct Complete;

impl ChartRule for Complete {
  fn on_edge(&self, cx: &mut RuleCx, edge: Edge) {
    let grammar = cx.grammar;
    if grammar.is_passive(edge) {
      let lhs = grammar.lhs_of(edge);
      for prev in cx.chart.actives_expecting(edge.start(), lhs) {
        let moved = prev.advanced_to(edge.end());
        if moved != edge {
          cx.insert_derived(moved, prev, edge);
        }
      }
    } else {
      let expected = grammar
        .next_symbol(edge)
        .expect("active edges expect a symbol");
      for child in cx.chart.passives_from(edge.end(), expected) {
        let moved = edge.advanced_to(child.end());
        if moved != edge {
          cx.insert_derived(moved, edge, child);
        }
      }
    }
  }
}

/// A parsing strategy: an ordered list of chart rules plus an agenda
/// discipline.
pub struct Strategy {
  name: &'static str,
  pub(crate) discipline: Discipline,
  pub(crate) rules: Vec<Box<dyn ChartRule + Send + Sync>>,
}

impl Strategy {
  /// Top-down strategy: Init + Predict + Scan + Complete.
  pub fn top_down() -> Strategy {
    Strategy {
      name: "top-down",
      discipline: Discipline::Fifo,
      rules: vec![
        Box::new(TopDownInit),
        Box::new(TopDownPredict),
        Box::new(Scan),
        Box::new(Complete),
      ],
    }
  }

  /// Bottom-up strategy: seed every terminal everywhere, then predict
  /// upward and complete.
  pub fn bottom_up() -> Strategy {
    Strategy {
      name: "bottom-up",
      discipline: Discipline::Fifo,
      rules: vec![
        Box::new(BottomUpSeed),
        Box::new(BottomUpPredict),
        Box::new(Complete),
      ],
    }
  }

  /// Left-corner strategy (the default): goal-directed like top-down, but
  /// prediction is triggered bottom-up by a matched left corner, which
  /// avoids unconstrained prediction.
  pub fn left_corner() -> Strategy {
    Strategy {
      name: "left-corner",
      discipline: Discipline::Lifo,
      rules: vec![
        Box::new(TopDownInit),
        Box::new(LeftCornerPredictScan),
        Box::new(Scan),
        Box::new(Complete),
      ],
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl std::fmt::Debug for Strategy {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.debug_struct("Strategy")
      .field("name", &self.name)
      .field("discipline", &self.discipline)
      .field("rules", &self.rules)
      .finish()
  }
}
