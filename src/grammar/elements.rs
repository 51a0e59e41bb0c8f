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

//! The user-facing grammar element DAG.
//!
//! Elements are immutable, cheaply clonable handles. They are composed with
//! `+` (concatenation), `|` (alternation) and `*` (repetition), then
//! compiled into a [`Grammar`](crate::grammar::Grammar). Sharing subtrees is
//! free; cycles are unrepresentable, and repetition (which lowers to
//! self-recursive productions) is the only way to express an infinite
//! language.

use std::{ops, rc::Rc};

use crate::{
  result::{ResultAction, Value},
  utils::Name,
};

/// Case policy for terminal matching. ASCII lowercasing is the only folding
/// performed.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum CaseMode {
  Insensitive,
  Sensitive,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct ElemNode {
  pub(crate) kind: ElemKind,
  pub(crate) name: Option<Name>,
  #[derivative(Debug = "ignore")]
  pub(crate) actions: Vec<ResultAction>,
  pub(crate) ignore: bool,
}

#[derive(Debug)]
pub(crate) enum ElemKind {
  /// A fixed word or phrase.
  Lit { text: String, case: CaseMode },
  /// Any member of a finite set of words or phrases.
  Set { members: Vec<String>, case: CaseMode },
  /// A regular expression anchored to the whole token window.
  Rx { pattern: String, case: CaseMode },
  And(Vec<Elem>),
  Or(Vec<Elem>),
  Opt(Elem),
  OneOrMore(Elem),
  ZeroOrMore(Elem),
  /// Matches the empty string. Used internally by Opt/ZeroOrMore lowering.
  Null,
}

/// A grammar element handle.
#[derive(Clone, Debug)]
pub struct Elem(pub(crate) Rc<ElemNode>);

fn node(kind: ElemKind) -> Elem {
  Elem(Rc::new(ElemNode {
    kind,
    name: None,
    actions: Vec::new(),
    ignore: false,
  }))
}

/// A case-insensitive literal word or phrase.
pub fn lit(text: &str) -> Elem {
  node(ElemKind::Lit {
    text: text.to_string(),
    case: CaseMode::Insensitive,
  })
}

/// A case-sensitive literal word or phrase.
pub fn lit_cs(text: &str) -> Elem {
  node(ElemKind::Lit {
    text: text.to_string(),
    case: CaseMode::Sensitive,
  })
}

/// A case-insensitive set of words or phrases; matching any member
/// succeeds. Multi-word members consume the corresponding consecutive
/// tokens.
pub fn set<I, S>(members: I) -> Elem
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  node(ElemKind::Set {
    members: members.into_iter().map(Into::into).collect(),
    case: CaseMode::Insensitive,
  })
}

/// A case-sensitive set of words or phrases.
pub fn set_cs<I, S>(members: I) -> Elem
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  node(ElemKind::Set {
    members: members.into_iter().map(Into::into).collect(),
    case: CaseMode::Sensitive,
  })
}

/// A case-insensitive regular expression terminal. The pattern is anchored
/// to the full token (or to a space-joined window of consecutive tokens if
/// it can match whitespace). Compilation is deferred to grammar build time,
/// where a bad pattern surfaces as a `GrammarError`.
pub fn rx(pattern: &str) -> Elem {
  node(ElemKind::Rx {
    pattern: pattern.to_string(),
    case: CaseMode::Insensitive,
  })
}

/// A case-sensitive regular expression terminal.
pub fn rx_cs(pattern: &str) -> Elem {
  node(ElemKind::Rx {
    pattern: pattern.to_string(),
    case: CaseMode::Sensitive,
  })
}

/// The empty-string element.
pub fn null() -> Elem {
  node(ElemKind::Null)
}

impl Elem {
  pub(crate) fn ptr_key(&self) -> usize {
    Rc::as_ptr(&self.0) as usize
  }

  pub(crate) fn user_name(&self) -> Option<&Name> {
    self.0.name.as_ref()
  }

  /// Returns a copy of this element carrying the given name. The name
  /// becomes the element's symbol in the compiled grammar and the key under
  /// which its value appears in parse results. The copy has its own
  /// identity, so a shared element can be reused under several names.
  pub fn named(&self, name: &str) -> Elem {
    Elem(Rc::new(ElemNode {
      kind: self.clone_kind(),
      name: Some(Name::new(name)),
      actions: self.0.actions.clone(),
      ignore: self.0.ignore,
    }))
  }

  /// Returns a copy of this element that will not appear in parse results.
  pub fn ignored(&self) -> Elem {
    Elem(Rc::new(ElemNode {
      kind: self.clone_kind(),
      name: self.0.name.clone(),
      actions: self.0.actions.clone(),
      ignore: true,
    }))
  }

  /// Returns a copy of this element with the given result action. The
  /// action runs once per completed occurrence at result-build time.
  /// Registering a second action on the same element is a conflict, which
  /// grammar compilation rejects.
  pub fn set_result_action(
    &self,
    action: impl Fn(
        &mut crate::result::ResultHandle,
      ) -> Result<(), crate::error::ActionError>
      + Send
      + Sync
      + 'static,
  ) -> Elem {
    let action: ResultAction = std::sync::Arc::new(action);
    let mut actions = self.0.actions.clone();
    actions.push(action);
    Elem(Rc::new(ElemNode {
      kind: self.clone_kind(),
      name: self.0.name.clone(),
      actions,
      ignore: self.0.ignore,
    }))
  }

  /// Replaces the element's result value with `value`. Shortcut for a
  /// result action that calls `set`.
  pub fn replace_result_with(&self, value: impl Into<Value>) -> Elem {
    let value = value.into();
    self.set_result_action(move |r| {
      r.set(value.clone());
      Ok(())
    })
  }

  /// Zero-or-one occurrences of this element.
  pub fn opt(&self) -> Elem {
    node(ElemKind::Opt(self.clone()))
  }

  /// One or more occurrences of this element. Occurrences are collected as
  /// a list in parse results.
  pub fn one_or_more(&self) -> Elem {
    node(ElemKind::OneOrMore(self.clone()))
  }

  /// Zero or more occurrences of this element.
  pub fn zero_or_more(&self) -> Elem {
    node(ElemKind::ZeroOrMore(self.clone()))
  }

  /// Between `min` and `max` occurrences (inclusive); `max == None` means
  /// unbounded. Panics on an empty or inverted range, which is a
  /// construction-time programming error.
  pub fn repeat(&self, min: usize, max: Option<usize>) -> Elem {
    match max {
      None => match min {
        0 => self.zero_or_more(),
        1 => self.one_or_more(),
        m => {
          let mut parts: Vec<Elem> =
            std::iter::repeat_with(|| self.clone()).take(m).collect();
          parts.push(self.zero_or_more());
          node(ElemKind::And(parts))
        }
      },
      Some(mx) => {
        assert!(
          mx >= min && mx >= 1,
          "invalid repetition range ({}, {})",
          min,
          mx
        );
        if min == 0 && mx == 1 {
          self.opt()
        } else if min == mx {
          self.times(min)
        } else {
          let mut parts: Vec<Elem> =
            std::iter::repeat_with(|| self.clone()).take(min).collect();
          parts
            .extend(std::iter::repeat_with(|| self.opt()).take(mx - min));
          node(ElemKind::And(parts))
        }
      }
    }
  }

  fn times(&self, n: usize) -> Elem {
    assert!(n >= 1, "cannot repeat an element {} times", n);
    if n == 1 {
      self.clone()
    } else {
      node(ElemKind::And(
        std::iter::repeat_with(|| self.clone()).take(n).collect(),
      ))
    }
  }

  /// Whether this element can be absorbed into a parent of the same
  /// composite kind without losing a name or a result action.
  fn is_bare(&self) -> bool {
    self.0.name.is_none() && self.0.actions.is_empty() && !self.0.ignore
  }

  fn clone_kind(&self) -> ElemKind {
    match &self.0.kind {
      ElemKind::Lit { text, case } => ElemKind::Lit {
        text: text.clone(),
        case: *case,
      },
      ElemKind::Set { members, case } => ElemKind::Set {
        members: members.clone(),
        case: *case,
      },
      ElemKind::Rx { pattern, case } => ElemKind::Rx {
        pattern: pattern.clone(),
        case: *case,
      },
      ElemKind::And(cs) => ElemKind::And(cs.clone()),
      ElemKind::Or(cs) => ElemKind::Or(cs.clone()),
      ElemKind::Opt(c) => ElemKind::Opt(c.clone()),
      ElemKind::OneOrMore(c) => ElemKind::OneOrMore(c.clone()),
      ElemKind::ZeroOrMore(c) => ElemKind::ZeroOrMore(c.clone()),
      ElemKind::Null => ElemKind::Null,
    }
  }

  /// The display name of this element: the user name if set, else a
  /// deterministic canonical form derived from the element's structure.
  pub fn display_name(&self) -> String {
    if let Some(name) = &self.0.name {
      return name.str().to_string();
    }
    match &self.0.kind {
      ElemKind::Lit { text, .. } => format!("Lit({})", text),
      ElemKind::Set { members, .. } => {
        format!("Set({})", members.join("|"))
      }
      ElemKind::Rx { pattern, .. } => format!("Rx({})", pattern),
      ElemKind::And(cs) => format!("And({})", join_names(cs)),
      ElemKind::Or(cs) => format!("Or({})", join_names(cs)),
      ElemKind::Opt(c) => format!("Opt({})", c.display_name()),
      ElemKind::OneOrMore(c) => {
        format!("OneOrMore({})", c.display_name())
      }
      ElemKind::ZeroOrMore(c) => {
        format!("ZeroOrMore({})", c.display_name())
      }
      ElemKind::Null => "Null".to_string(),
    }
  }
}

fn join_names(elems: &[Elem]) -> String {
  elems
    .iter()
    .map(Elem::display_name)
    .collect::<Vec<_>>()
    .join(", ")
}

/// Concatenation, collapsing nested bare Ands so that `a + b + c` lowers to
/// a single three-element production rather than a binary chain.
fn and_pair(a: Elem, b: Elem) -> Elem {
  let mut parts = Vec::new();
  absorb(a, &mut parts, true);
  absorb(b, &mut parts, true);
  node(ElemKind::And(parts))
}

fn or_pair(a: Elem, b: Elem) -> Elem {
  let mut parts = Vec::new();
  absorb(a, &mut parts, false);
  absorb(b, &mut parts, false);
  node(ElemKind::Or(parts))
}

fn absorb(elem: Elem, out: &mut Vec<Elem>, is_and: bool) {
  let splice = elem.is_bare()
    && match (&elem.0.kind, is_and) {
      (ElemKind::And(_), true) | (ElemKind::Or(_), false) => true,
      _ => false,
    };
  if splice {
    match &elem.0.kind {
      ElemKind::And(cs) | ElemKind::Or(cs) => out.extend(cs.iter().cloned()),
      _ => unreachable!(),
    }
  } else {
    out.push(elem);
  }
}

impl ops::Add for Elem {
  type Output = Elem;
  fn add(self, rhs: Elem) -> Elem {
    and_pair(self, rhs)
  }
}

impl ops::Add<&Elem> for Elem {
  type Output = Elem;
  fn add(self, rhs: &Elem) -> Elem {
    and_pair(self, rhs.clone())
  }
}

impl ops::Add<Elem> for &Elem {
  type Output = Elem;
  fn add(self, rhs: Elem) -> Elem {
    and_pair(self.clone(), rhs)
  }
}

impl ops::Add for &Elem {
  type Output = Elem;
  fn add(self, rhs: &Elem) -> Elem {
    and_pair(self.clone(), rhs.clone())
  }
}

impl ops::Add<&str> for Elem {
  type Output = Elem;
  fn add(self, rhs: &str) -> Elem {
    and_pair(self, lit(rhs))
  }
}

impl ops::Add<Elem> for &str {
  type Output = Elem;
  fn add(self, rhs: Elem) -> Elem {
    and_pair(lit(self), rhs)
  }
}

impl ops::BitOr for Elem {
  type Output = Elem;
  fn bitor(self, rhs: Elem) -> Elem {
    or_pair(self, rhs)
  }
}

impl ops::BitOr<&Elem> for Elem {
  type Output = Elem;
  fn bitor(self, rhs: &Elem) -> Elem {
    or_pair(self, rhs.clone())
  }
}

impl ops::BitOr<Elem> for &Elem {
  type Output = Elem;
  fn bitor(self, rhs: Elem) -> Elem {
    or_pair(self.clone(), rhs)
  }
}

impl ops::BitOr for &Elem {
  type Output = Elem;
  fn bitor(self, rhs: &Elem) -> Elem {
    or_pair(self.clone(), rhs.clone())
  }
}

impl ops::BitOr<&str> for Elem {
  type Output = Elem;
  fn bitor(self, rhs: &str) -> Elem {
    or_pair(self, lit(rhs))
  }
}

impl ops::BitOr<Elem> for &str {
  type Output = Elem;
  fn bitor(self, rhs: Elem) -> Elem {
    or_pair(lit(self), rhs)
  }
}

impl ops::Mul<usize> for Elem {
  type Output = Elem;
  fn mul(self, n: usize) -> Elem {
    self.times(n)
  }
}

impl ops::Mul<usize> for &Elem {
  type Output = Elem;
  fn mul(self, n: usize) -> Elem {
    self.times(n)
  }
}

impl ops::Mul<(usize, usize)> for Elem {
  type Output = Elem;
  fn mul(self, (min, max): (usize, usize)) -> Elem {
    self.repeat(min, Some(max))
  }
}

impl ops::Mul<(usize, usize)> for &Elem {
  type Output = Elem;
  fn mul(self, (min, max): (usize, usize)) -> Elem {
    self.repeat(min, Some(max))
  }
}

impl ops::Mul<(usize, Option<usize>)> for Elem {
  type Output = Elem;
  fn mul(self, (min, max): (usize, Option<usize>)) -> Elem {
    self.repeat(min, max)
  }
}

impl ops::Mul<(usize, Option<usize>)> for &Elem {
  type Output = Elem;
  fn mul(self, (min, max): (usize, Option<usize>)) -> Elem {
    self.repeat(min, max)
  }
}
