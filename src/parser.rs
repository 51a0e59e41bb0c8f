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

//! The robust, incremental parser: drives the strategy's rules over the
//! agenda to quiescence, skips over unknown tokens, extracts ranked trees
//! and builds results.

use std::{collections::BTreeSet, sync::Arc};

use log::{debug, trace};

use crate::{
  chart::{Chart, Edge},
  error::ParseError,
  grammar::Grammar,
  result::{self, ParseResult, Value},
  rules::{RuleCx, Strategy},
  tokenizer::Tokens,
  tree::{RankedTree, TreeBuilder, TreeNode},
  utils::Name,
};

/// What an incremental listener returns: keep going, or drain the current
/// rule firing and exit with the best parse found so far.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Flow {
  Continue,
  Stop,
}

/// The tie-break applied when trees agree on node count and skip count.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TieBreak {
  /// Prefer the earliest-declared alternatives (the default).
  DefinitionOrder,
  /// Prefer the latest-declared alternatives.
  ReverseDefinitionOrder,
}

/// Parser configuration. Everything defaults to unlimited / as declared.
#[derive(Clone, Debug)]
pub struct ParserConfig {
  /// Whether terminals match case-sensitively (default off). Case folding
  /// is fixed when the grammar compiles, so this flag takes effect through
  /// [`GrammarBuilder::from_config`](crate::grammar::GrammarBuilder); on
  /// the parser itself it records the intent the grammar was built with.
  pub case_sensitive: bool,
  /// Maximum number of unknown tokens skipped per sentence. `None` allows
  /// skipping every token.
  pub skip_cap: Option<usize>,
  /// Maximum number of rule firings before the parse aborts with
  /// `ParseError::Budget`. `None` runs to quiescence.
  pub step_budget: Option<usize>,
  pub tie_break: TieBreak,
}

impl Default for ParserConfig {
  fn default() -> Self {
    ParserConfig {
      case_sensitive: false,
      skip_cap: None,
      step_budget: None,
      tie_break: TieBreak::DefinitionOrder,
    }
  }
}

/// A robust, incremental chart parser over a compiled grammar. The grammar
/// is held by reference count and can be shared across parsers; each parse
/// owns its tokenization, chart and agenda.
pub struct RobustParser {
  grammar: Arc<Grammar>,
  strategy: Strategy,
  config: ParserConfig,
}

struct RunOutcome<'a> {
  cx: RuleCx<'a>,
  budget_hit: bool,
}

impl RobustParser {
  /// A parser using the default left-corner strategy.
  pub fn new(grammar: impl Into<Arc<Grammar>>) -> RobustParser {
    RobustParser::with_strategy(grammar, Strategy::left_corner())
  }

  pub fn with_strategy(
    grammar: impl Into<Arc<Grammar>>,
    strategy: Strategy,
  ) -> RobustParser {
    RobustParser {
      grammar: grammar.into(),
      strategy,
      config: ParserConfig::default(),
    }
  }

  pub fn with_config(mut self, config: ParserConfig) -> RobustParser {
    self.config = config;
    self
  }

  pub fn grammar(&self) -> &Grammar {
    &self.grammar
  }

  /// Parses `text` and returns the best tree with its result, or a typed
  /// failure.
  pub fn parse(
    &self,
    text: &str,
  ) -> Result<(TreeNode, ParseResult), ParseError> {
    self.parse_with_listener(text, None)
  }

  /// Parses `text`, invoking `listener` synchronously each time the best
  /// prefix parse improves. The listener receives the best tree for the
  /// new prefix; returning [`Flow::Stop`] ends the parse with whatever
  /// best parse exists at that point.
  pub fn parse_incremental(
    &self,
    text: &str,
    mut listener: impl FnMut(&TreeNode) -> Flow,
  ) -> Result<(TreeNode, ParseResult), ParseError> {
    self.parse_with_listener(text, Some(&mut listener))
  }

  fn parse_with_listener(
    &self,
    text: &str,
    listener: Option<&mut dyn FnMut(&TreeNode) -> Flow>,
  ) -> Result<(TreeNode, ParseResult), ParseError> {
    let tokens = Tokens::new(text);
    if tokens.is_empty() {
      return Err(ParseError::Empty);
    }

    let outcome = self.run(&tokens, listener);
    if outcome.budget_hit {
      let best = self.best_partial(&outcome, &tokens);
      return Err(ParseError::Budget {
        best: best.map(Box::new),
      });
    }

    let mut builder =
      TreeBuilder::new(&outcome.cx.chart, &self.grammar, &tokens);
    let mut best: Option<((usize, usize, Vec<usize>), RankedTree)> = None;
    for root in self.accepted_roots(&outcome, &tokens) {
      let ranked = builder.best(root);
      let key = self.rank_key(&ranked, tokens.len());
      if self.over_skip_cap(key.1) {
        continue;
      }
      if best.as_ref().map_or(true, |(bk, _)| key < *bk) {
        best = Some((key, ranked));
      }
    }

    match best {
      Some((_, ranked)) => {
        let result = self.result_for(&ranked.tree)?;
        Ok((ranked.tree, result))
      }
      None => Err(self.no_parse(&outcome)),
    }
  }

  /// Parses `text` and returns the top `k` trees with their results, best
  /// first. Enumeration of ambiguous derivations is truncated, so very
  /// ambiguous charts yield a representative rather than exhaustive list.
  pub fn parse_multi(
    &self,
    text: &str,
    k: usize,
  ) -> Result<Vec<(TreeNode, ParseResult)>, ParseError> {
    assert!(k >= 1, "parse_multi requires k >= 1");
    let tokens = Tokens::new(text);
    if tokens.is_empty() {
      return Err(ParseError::Empty);
    }

    let outcome = self.run(&tokens, None);
    if outcome.budget_hit {
      let best = self.best_partial(&outcome, &tokens);
      return Err(ParseError::Budget {
        best: best.map(Box::new),
      });
    }

    let cap = (k * 4).max(16);
    let mut builder =
      TreeBuilder::new(&outcome.cx.chart, &self.grammar, &tokens);
    let mut ranked: Vec<((usize, usize, Vec<usize>), RankedTree)> = Vec::new();
    for root in self.accepted_roots(&outcome, &tokens) {
      for candidate in builder.enumerate(root, cap) {
        let key = self.rank_key(&candidate, tokens.len());
        if self.over_skip_cap(key.1) {
          continue;
        }
        ranked.push((key, candidate));
      }
    }
    if ranked.is_empty() {
      return Err(self.no_parse(&outcome));
    }

    ranked.sort_by(|a, b| a.0.cmp(&b.0));
    ranked.dedup_by(|a, b| a.1.tree == b.1.tree);
    ranked.truncate(k);

    let mut results = Vec::with_capacity(ranked.len());
    for (_, candidate) in ranked {
      let result = self.result_for(&candidate.tree)?;
      results.push((candidate.tree, result));
    }
    Ok(results)
  }

  /// Parses `text` and returns the raw chart together with the
  /// tokenization, for inspection and testing. The chart is exactly the
  /// quiescent state the tree extractors read.
  pub fn parse_to_chart(
    &self,
    text: &str,
  ) -> Result<(Chart, Tokens), ParseError> {
    let tokens = Tokens::new(text);
    if tokens.is_empty() {
      return Err(ParseError::Empty);
    }
    let outcome = self.run(&tokens, None);
    Ok((outcome.cx.chart, tokens))
  }

  /// Builds the flattened result for a tree produced by this parser,
  /// running result actions. Exposed so incremental listeners can convert
  /// prefix trees.
  pub fn result_for(&self, tree: &TreeNode) -> Result<ParseResult, ParseError> {
    result::build_result(tree, &self.grammar)
      .map_err(|(element, source)| ParseError::Callback {
        element,
        source,
        tree: Box::new(tree.clone()),
      })
      .map(|result| result.unwrap_or_else(|| self.empty_result(tree)))
  }

  /// A result for a tree whose root element was marked ignored.
  fn empty_result(&self, tree: &TreeNode) -> ParseResult {
    ParseResult::new(
      Name::new(tree.name()),
      Value::Str(tree.lexicon().to_string()),
      true,
    )
  }

  /// Seeds the strategy, drains the agenda, and interleaves robust-skip
  /// rounds until neither rules nor skips can make progress.
  fn run<'t>(
    &'t self,
    tokens: &'t Tokens,
    mut listener: Option<&mut dyn FnMut(&TreeNode) -> Flow>,
  ) -> RunOutcome<'t> {
    let grammar: &Grammar = &self.grammar;
    let mut cx = RuleCx::new(grammar, tokens, self.strategy.discipline);
    let mut budget_hit = false;
    let mut skipped: BTreeSet<usize> = BTreeSet::new();
    let mut best_prefix = 0usize;

    for rule in &self.strategy.rules {
      rule.seed(&mut cx);
    }

    'outer: loop {
      while let Some(edge) = cx.agenda.pop() {
        for rule in &self.strategy.rules {
          rule.on_edge(&mut cx, edge);
          cx.steps += 1;
          if self
            .config
            .step_budget
            .map_or(false, |budget| cx.steps >= budget)
          {
            debug!("step budget of {:?} exhausted", self.config.step_budget);
            budget_hit = true;
            break 'outer;
          }
        }

        if !cx.goal_events.is_empty() {
          let events = std::mem::take(&mut cx.goal_events);
          for event in events {
            if event.end() <= best_prefix {
              continue;
            }
            best_prefix = event.end();
            if let Some(l) = listener.as_mut() {
              let ranked =
                TreeBuilder::new(&cx.chart, grammar, tokens).best(event);
              if let Flow::Stop = l(&ranked.tree) {
                debug!("listener stopped the parse at prefix {}", best_prefix);
                break 'outer;
              }
            }
          }
        }
      }

      // Quiescent. Robust skip: advance past the leftmost position where
      // no expected terminal matched, re-seeding the active edges that end
      // there one token to the right.
      if skipped.len() >= self.config.skip_cap.unwrap_or(usize::MAX) {
        break;
      }
      let next = (0..tokens.len()).find(|&j| {
        !cx.matched[j]
          && !skipped.contains(&j)
          && !cx.chart.actives_ending(j).is_empty()
      });
      let j = match next {
        Some(j) => j,
        None => break,
      };
      skipped.insert(j);
      trace!("skipping unknown token `{}` at {}", tokens.get(j), j);
      for active in cx.chart.actives_ending(j) {
        let shadow = active.shifted_end();
        cx.insert_seed(shadow);
        cx.chart.carry_backpointers(active, shadow);
      }
    }

    debug!(
      "parse finished: {} chart edges, {} agenda entries, {} skips",
      cx.chart.len(),
      cx.agenda.total(),
      skipped.len()
    );
    RunOutcome { cx, budget_hit }
  }

  /// Passive goal edges from position 0 whose trailing gap is entirely
  /// unmatched input: everything after the edge must itself be skippable
  /// for the parse to count as spanning.
  fn accepted_roots(
    &self,
    outcome: &RunOutcome,
    tokens: &Tokens,
  ) -> Vec<Edge> {
    outcome
      .cx
      .chart
      .goal_spans(self.grammar.goal())
      .into_iter()
      .filter(|edge| {
        (edge.end()..tokens.len()).all(|pos| !outcome.cx.matched[pos])
      })
      .collect()
  }

  fn rank_key(
    &self,
    ranked: &RankedTree,
    token_count: usize,
  ) -> (usize, usize, Vec<usize>) {
    let trailing = token_count - ranked.tree.span().1;
    let deriv = match self.config.tie_break {
      TieBreak::DefinitionOrder => ranked.deriv.clone(),
      TieBreak::ReverseDefinitionOrder => {
        ranked.deriv.iter().map(|d| usize::MAX - d).collect()
      }
    };
    (ranked.nodes, ranked.skipped() + trailing, deriv)
  }

  fn over_skip_cap(&self, total_skipped: usize) -> bool {
    self
      .config
      .skip_cap
      .map_or(false, |cap| total_skipped > cap)
  }

  /// The best goal prefix found so far, for `ParseError::Budget`.
  fn best_partial(
    &self,
    outcome: &RunOutcome,
    tokens: &Tokens,
  ) -> Option<TreeNode> {
    let mut builder =
      TreeBuilder::new(&outcome.cx.chart, &self.grammar, tokens);
    outcome
      .cx
      .chart
      .goal_spans(self.grammar.goal())
      .into_iter()
      .max_by_key(|edge| edge.end())
      .map(|edge| builder.best(edge).tree)
  }

  fn no_parse(&self, outcome: &RunOutcome) -> ParseError {
    let furthest = outcome
      .cx
      .expected
      .keys()
      .max()
      .copied()
      .unwrap_or(0);
    let expected = outcome
      .cx
      .expected
      .get(&furthest)
      .cloned()
      .unwrap_or_default();
    ParseError::NoParse { furthest, expected }
  }
}

impl std::fmt::Debug for RobustParser {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.debug_struct("RobustParser")
      .field("grammar", &self.grammar)
      .field("strategy", &self.strategy.name())
      .field("config", &self.config)
      .finish()
  }
}
