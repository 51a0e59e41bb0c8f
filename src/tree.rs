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

//! Parse tree reconstruction from chart back-pointers, with ranking.
//!
//! Trees are ranked by minimal node count; ties break on fewest skipped
//! tokens, then on the declaration order of the productions used (the
//! leftmost derivation of the earliest-declared alternatives).

use std::collections::BTreeMap;

use crate::{
  chart::{Chart, Edge},
  grammar::{Grammar, SymbolId},
  tokenizer::Tokens,
};

/// A node of a parse tree: a terminal leaf carrying its matched text, or an
/// internal node carrying its symbol and children. Trees are owned by the
/// caller once a parse returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
  pub(crate) sym: SymbolId,
  name: String,
  children: Vec<TreeNode>,
  lexicon: String,
  start: usize,
  end: usize,
}

impl TreeNode {
  /// The display name of this node's symbol.
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn children(&self) -> &[TreeNode] {
    &self.children
  }

  /// The matched text this node covers, in the original token spelling,
  /// joined with single spaces. Skipped tokens do not appear.
  pub fn lexicon(&self) -> &str {
    &self.lexicon
  }

  /// The token span `[start, end)` this node covers, including any tokens
  /// that were skipped inside it.
  pub fn span(&self) -> (usize, usize) {
    (self.start, self.end)
  }

  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  /// The total number of nodes in this tree.
  pub fn size(&self) -> usize {
    1 + self.children.iter().map(TreeNode::size).sum::<usize>()
  }

  fn fmt_indented(
    &self,
    f: &mut std::fmt::Formatter,
    indent: usize,
  ) -> std::fmt::Result {
    if self.is_leaf() {
      writeln!(
        f,
        "{:indent$}({} \"{}\")",
        "",
        self.name,
        self.lexicon,
        indent = indent
      )
    } else {
      writeln!(f, "{:indent$}({}", "", self.name, indent = indent)?;
      for child in &self.children {
        child.fmt_indented(f, indent + 2)?;
      }
      writeln!(f, "{:indent$})", "", indent = indent)
    }
  }
}

impl std::fmt::Display for TreeNode {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    self.fmt_indented(f, 0)
  }
}

/// A reconstructed tree with its ranking components.
#[derive(Clone, Debug)]
pub(crate) struct RankedTree {
  pub(crate) tree: TreeNode,
  pub(crate) nodes: usize,
  /// Tokens inside the tree's span actually covered by leaves.
  pub(crate) covered: usize,
  /// Production ids in preorder, for the declaration-order tie-break.
  pub(crate) deriv: Vec<usize>,
}

impl RankedTree {
  /// Tokens skipped inside the tree's span.
  pub(crate) fn skipped(&self) -> usize {
    (self.tree.end - self.tree.start) - self.covered
  }

  fn key(&self) -> (usize, usize, &[usize]) {
    (self.nodes, self.skipped(), &self.deriv)
  }
}

pub(crate) struct TreeBuilder<'a> {
  chart: &'a Chart,
  grammar: &'a Grammar,
  tokens: &'a Tokens,
  memo: BTreeMap<Edge, RankedTree>,
}

impl<'a> TreeBuilder<'a> {
  pub(crate) fn new(
    chart: &'a Chart,
    grammar: &'a Grammar,
    tokens: &'a Tokens,
  ) -> TreeBuilder<'a> {
    TreeBuilder {
      chart,
      grammar,
      tokens,
      memo: BTreeMap::new(),
    }
  }

  /// The best tree rooted at the passive edge `root`, by the ranking
  /// order. Choices are independent across subtrees, so a greedy minimum
  /// per edge is a global minimum.
  pub(crate) fn best(&mut self, root: Edge) -> RankedTree {
    if let Some(best) = self.memo.get(&root) {
      return best.clone();
    }

    let result = match self.chart.backpointers_of(root) {
      None => self.leaf(root),
      Some(lists) if lists.is_empty() => self.leaf(root),
      Some(lists) => {
        let lists: Vec<im::Vector<Edge>> = lists.iter().cloned().collect();
        lists
          .into_iter()
          .map(|list| {
            let kids: Vec<RankedTree> =
              list.iter().map(|child| self.best(*child)).collect();
            self.assemble(root, kids)
          })
          .min_by(|a, b| a.key().cmp(&b.key()))
          .expect("an edge with back-pointers has at least one derivation")
      }
    };

    self.memo.insert(root, result.clone());
    result
  }

  /// Every tree rooted at `root`, up to `cap` per node, ranked. Used by
  /// the top-k accessor; ambiguity can be exponential, so enumeration is
  /// truncated.
  pub(crate) fn enumerate(&mut self, root: Edge, cap: usize) -> Vec<RankedTree> {
    let mut out = match self.chart.backpointers_of(root) {
      None => vec![self.leaf(root)],
      Some(lists) if lists.is_empty() => vec![self.leaf(root)],
      Some(lists) => {
        let lists: Vec<im::Vector<Edge>> = lists.iter().cloned().collect();
        let mut out = Vec::new();
        'lists: for list in lists {
          let options: Vec<Vec<RankedTree>> = list
            .iter()
            .map(|child| self.enumerate(*child, cap))
            .collect();
          if options.iter().any(Vec::is_empty) {
            continue;
          }
          let mut odometer = vec![0usize; options.len()];
          loop {
            let kids: Vec<RankedTree> = odometer
              .iter()
              .enumerate()
              .map(|(i, &o)| options[i][o].clone())
              .collect();
            out.push(self.assemble(root, kids));
            if out.len() >= cap {
              break 'lists;
            }
            // advance the odometer; exhausted means this list is done
            let mut exhausted = true;
            let mut i = options.len();
            while i > 0 {
              i -= 1;
              odometer[i] += 1;
              if odometer[i] < options[i].len() {
                exhausted = false;
                break;
              }
              odometer[i] = 0;
            }
            if exhausted {
              break;
            }
          }
        }
        out
      }
    };

    out.sort_by(|a, b| a.key().cmp(&b.key()));
    out.dedup_by(|a, b| a.tree == b.tree);
    out.truncate(cap);
    out
  }

  fn leaf(&self, edge: Edge) -> RankedTree {
    let prod = self.grammar.prod(edge.prod());
    debug_assert!(
      self.grammar.is_terminal(prod.lhs),
      "only terminal edges may lack back-pointers"
    );
    let tree = TreeNode {
      sym: prod.lhs,
      name: self.grammar.symbol(prod.lhs).name.str().to_string(),
      children: Vec::new(),
      lexicon: self.tokens.window(edge.start(), edge.end()),
      start: edge.start(),
      end: edge.end(),
    };
    RankedTree {
      tree,
      nodes: 1,
      covered: edge.span(),
      deriv: vec![edge.prod().index()],
    }
  }

  /// Builds the node for `edge` over already-built children. Children of a
  /// recursive production whose lhs equals the parent's are spliced flat,
  /// so `OneOrMore` chains read as a single list of occurrences.
  fn assemble(&self, edge: Edge, kids: Vec<RankedTree>) -> RankedTree {
    let prod = self.grammar.prod(edge.prod());
    let covered = kids.iter().map(|k| k.covered).sum();

    let mut deriv = Vec::with_capacity(8);
    deriv.push(edge.prod().index());
    for kid in &kids {
      deriv.extend_from_slice(&kid.deriv);
    }

    let mut children = Vec::with_capacity(kids.len());
    for kid in kids {
      if prod.recursive && kid.tree.sym == prod.lhs {
        children.extend(kid.tree.children);
      } else {
        children.push(kid.tree);
      }
    }

    let lexicon = children
      .iter()
      .map(|c| c.lexicon.as_str())
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join(" ");

    let tree = TreeNode {
      sym: prod.lhs,
      name: self.grammar.symbol(prod.lhs).name.str().to_string(),
      children,
      lexicon,
      start: edge.start(),
      end: edge.end(),
    };
    let nodes = tree.size();
    RankedTree {
      tree,
      nodes,
      covered,
      deriv,
    }
  }
}
