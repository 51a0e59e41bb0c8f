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

use std::collections::BTreeSet;

use crate::{tree::TreeNode, utils::Name};

/// Errors raised while constructing or compiling a grammar. A grammar that
/// fails to compile is unusable.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
  #[error("literal elements require a non-empty string")]
  EmptyLiteral,

  #[error("set elements require at least one member string")]
  EmptySet,

  #[error("regex elements require a non-empty pattern")]
  EmptyPattern,

  #[error("invalid regular expression `{pattern}`")]
  Regex {
    pattern: String,
    #[source]
    source: Box<regex::Error>,
  },

  #[error("the goal element derives only the empty string")]
  EmptyGoal,

  #[error("element `{element}` has more than one result action registered")]
  ConflictingActions { element: Name },
}

/// An error produced by a user result action. Result actions report failure
/// by returning this from their callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ActionError(pub String);

impl ActionError {
  pub fn new(msg: impl Into<String>) -> Self {
    ActionError(msg.into())
  }
}

/// Errors raised while parsing. Parse failures are ordinary outcomes and
/// carry enough context for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
  #[error("input string is empty")]
  Empty,

  #[error("no parse found (furthest position {furthest}, expected one of {expected:?})")]
  NoParse {
    /// The furthest token position at which a terminal was tried.
    furthest: usize,
    /// The names of the terminals expected at that position.
    expected: BTreeSet<Name>,
  },

  #[error("step budget exhausted before a parse was found")]
  Budget {
    /// The best prefix tree found before the budget triggered, if any.
    best: Option<Box<TreeNode>>,
  },

  #[error("result action for `{element}` failed")]
  Callback {
    element: Name,
    #[source]
    source: ActionError,
    /// The parse tree is still valid when a result action fails.
    tree: Box<TreeNode>,
  },
}
