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

//! The structured parse result: a recursive mapping from element names to
//! values, flattened so deeply nested bindings surface at the level where
//! they are unambiguous, plus the result-action callback machinery.

use std::collections::BTreeMap;

use crate::{error::ActionError, grammar::Grammar, tree::TreeNode, utils::Name};

/// A value in a parse result. Terminal matches produce `Str`; repetition
/// produces `List`; nested named composites produce `Map`; result actions
/// may substitute any variant.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  Str(String),
  Int(i64),
  Bool(bool),
  List(Vec<Value>),
  Map(ParseResult),
}

impl Value {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Value::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Value::List(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_map(&self) -> Option<&ParseResult> {
    match self {
      Value::Map(map) => Some(map),
      _ => None,
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Value {
    Value::Str(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Value {
    Value::Str(s)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Value {
    Value::Int(i)
  }
}

impl From<i32> for Value {
  fn from(i: i32) -> Value {
    Value::Int(i as i64)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Value {
    Value::Bool(b)
  }
}

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Value {
    Value::List(items)
  }
}

impl From<ParseResult> for Value {
  fn from(map: ParseResult) -> Value {
    Value::Map(map)
  }
}

/// The type of a result action. Actions run once per completed occurrence
/// of their element, post-order, at result-build time.
pub type ResultAction = std::sync::Arc<
  dyn Fn(&mut ResultHandle) -> Result<(), ActionError> + Send + Sync,
>;

/// The mutable view of an element's result given to a result action. The
/// handle is only valid for the duration of the callback.
pub struct ResultHandle<'a> {
  name: &'a Name,
  entries: &'a mut BTreeMap<Name, Value>,
}

impl<'a> ResultHandle<'a> {
  /// The name of the element the action is attached to.
  pub fn name(&self) -> &str {
    self.name.str()
  }

  /// The element's current value: the matched lexicon unless something
  /// (an earlier action, or child synchronization) replaced it.
  pub fn get(&self) -> &Value {
    self
      .entries
      .get(self.name)
      .expect("a result always binds its own name")
  }

  /// Replaces the element's value.
  pub fn set(&mut self, value: impl Into<Value>) {
    self.entries.insert(self.name.clone(), value.into());
  }
}

/// A parse result: a named mapping from element names to values. A name
/// maps to a single value or, when repetition or several same-named
/// elements contribute, to a list.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseResult {
  name: Name,
  as_flat: bool,
  entries: BTreeMap<Name, Value>,
}

impl ParseResult {
  pub(crate) fn new(name: Name, value: Value, as_flat: bool) -> ParseResult {
    let mut entries = BTreeMap::new();
    if as_flat {
      entries.insert(name.clone(), value);
    } else {
      entries.insert(name.clone(), Value::List(vec![value]));
    }
    ParseResult {
      name,
      as_flat,
      entries,
    }
  }

  /// The name of the element this result belongs to.
  pub fn name(&self) -> &str {
    self.name.str()
  }

  /// Looks up a binding by name.
  pub fn get(&self, name: &str) -> Option<&Value> {
    self.entries.get(&Name::new(name))
  }

  /// The main value of this result, stored under its own name.
  pub fn value(&self) -> &Value {
    self
      .entries
      .get(&self.name)
      .expect("a result always binds its own name")
  }

  /// Replaces the main value of this result.
  pub fn set(&mut self, value: impl Into<Value>) {
    self.entries.insert(self.name.clone(), value.into());
  }

  /// Iterates over all bindings in name order.
  pub fn items(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.entries.iter().map(|(k, v)| (k.str(), v))
  }

  /// Whether a binding exists for `name`.
  pub fn contains(&self, name: &str) -> bool {
    self.entries.contains_key(&Name::new(name))
  }

  /// Adds a single binding. A second value under the same name promotes
  /// the binding to a list; further values append.
  fn add_item(&mut self, key: Name, value: Value) {
    match self.entries.get_mut(&key) {
      None => {
        let value = if self.as_flat {
          value
        } else {
          Value::List(vec![value])
        };
        self.entries.insert(key, value);
      }
      Some(Value::List(items)) => items.push(value),
      Some(existing) => {
        let old = std::mem::replace(existing, Value::Bool(false));
        *existing = Value::List(vec![old, value]);
      }
    }
  }

  /// Merges a child result into this one. Flat merging promotes every one
  /// of the child's bindings to this level; otherwise the child nests as a
  /// mapping under its own name.
  fn add_result(&mut self, child: ParseResult, flat: bool) {
    if flat {
      for (key, value) in child.entries {
        self.add_item(key, value);
      }
    } else {
      let key = child.name.clone();
      self.add_item(key, Value::Map(child));
    }
  }

  fn fmt_indented(
    &self,
    f: &mut std::fmt::Formatter,
    indent: usize,
  ) -> std::fmt::Result {
    writeln!(f, "{{")?;
    let last = self.entries.len().saturating_sub(1);
    for (i, (key, value)) in self.entries.iter().enumerate() {
      write!(f, "{:indent$}\"{}\": ", "", key, indent = indent + 2)?;
      fmt_value(value, f, indent + 2)?;
      if i != last {
        write!(f, ",")?;
      }
      writeln!(f)?;
    }
    write!(f, "{:indent$}}}", "", indent = indent)
  }
}

fn fmt_value(
  value: &Value,
  f: &mut std::fmt::Formatter,
  indent: usize,
) -> std::fmt::Result {
  match value {
    Value::Str(s) => write!(f, "\"{}\"", s),
    Value::Int(i) => write!(f, "{}", i),
    Value::Bool(b) => write!(f, "{}", b),
    Value::List(items) => {
      write!(f, "[")?;
      for (i, item) in items.iter().enumerate() {
        if i != 0 {
          write!(f, ", ")?;
        }
        fmt_value(item, f, indent)?;
      }
      write!(f, "]")
    }
    Value::Map(map) => map.fmt_indented(f, indent),
  }
}

impl std::fmt::Display for ParseResult {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    self.fmt_indented(f, 0)
  }
}

impl std::ops::Index<&str> for ParseResult {
  type Output = Value;

  fn index(&self, name: &str) -> &Value {
    self
      .get(name)
      .unwrap_or_else(|| panic!("no binding named `{}` in result", name))
  }
}

/// Converts a parse tree into its flattened result, running result actions
/// post-order. On an action failure the offending element's name and the
/// action error are returned so the caller can attach the tree.
pub(crate) fn build_result(
  node: &TreeNode,
  grammar: &Grammar,
) -> Result<Option<ParseResult>, (Name, ActionError)> {
  let info = grammar.symbol(node.sym);
  if info.ignore || node.lexicon().is_empty() {
    return Ok(None);
  }
  let parent_as_flat = !info.as_list;

  let mut children: Vec<&TreeNode> = Vec::new();
  let mut child_results: Vec<ParseResult> = Vec::new();
  for child in node.children() {
    if let Some(result) = build_result(child, grammar)? {
      children.push(child);
      child_results.push(result);
    }
  }

  let mut result = ParseResult::new(
    info.name.clone(),
    Value::Str(node.lexicon().to_string()),
    parent_as_flat,
  );

  if !children.is_empty() {
    let mut counts: BTreeMap<Name, usize> = BTreeMap::new();
    for child_result in &child_results {
      for name in child_result.entries.keys() {
        *counts.entry(name.clone()).or_insert(0) += 1;
      }
    }

    // The parent's own value tracks its children's values, so actions on
    // the children are visible from the parent.
    let mut values: Vec<Value> = child_results
      .iter()
      .map(|child_result| child_result.value().clone())
      .collect();

    for (child, child_result) in
      children.iter().zip(child_results.into_iter())
    {
      let unique = child_result
        .entries
        .keys()
        .all(|name| counts.get(name) == Some(&1));
      let flat = child.is_leaf() || (parent_as_flat && unique);
      result.add_result(child_result, flat);
    }

    let new_value = if values.len() == 1 && parent_as_flat {
      values.pop().expect("one value is present")
    } else {
      Value::List(values)
    };
    result.set(new_value);
  }

  for action in &info.actions {
    let mut handle = ResultHandle {
      name: &info.name,
      entries: &mut result.entries,
    };
    action(&mut handle).map_err(|e| (info.name.clone(), e))?;
  }

  Ok(Some(result))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn flat(name: &str, value: &str) -> ParseResult {
    ParseResult::new(Name::new(name), Value::from(value), true)
  }

  #[test]
  fn test_add_item_promotes_to_list() {
    let mut r = flat("p", "a b");
    r.add_item(Name::new("c"), Value::from("a"));
    assert_eq!(r["c"], Value::from("a"));
    r.add_item(Name::new("c"), Value::from("b"));
    assert_eq!(
      r["c"],
      Value::List(vec![Value::from("a"), Value::from("b")])
    );
    r.add_item(Name::new("c"), Value::from("c"));
    assert_eq!(r["c"].as_list().unwrap().len(), 3);
  }

  #[test]
  fn test_list_shaped_result_wraps_values() {
    let mut r = ParseResult::new(Name::new("many"), Value::from("x"), false);
    assert_eq!(r["many"], Value::List(vec![Value::from("x")]));
    r.add_item(Name::new("item"), Value::from("y"));
    assert_eq!(r["item"], Value::List(vec![Value::from("y")]));
  }

  #[test]
  fn test_add_result_flat_vs_nested() {
    let mut parent = flat("p", "a");
    let child = flat("c", "a");
    parent.add_result(child.clone(), true);
    assert_eq!(parent["c"], Value::from("a"));

    let mut parent2 = flat("p", "a");
    parent2.add_result(child, false);
    assert!(matches!(parent2["c"], Value::Map(_)));
  }

  #[test]
  fn test_handle_get_and_set() {
    let mut r = flat("color", "red");
    let name = Name::new("color");
    let mut handle = ResultHandle {
      name: &name,
      entries: &mut r.entries,
    };
    assert_eq!(handle.get(), &Value::from("red"));
    handle.set(vec![Value::from(255), Value::from(0), Value::from(0)]);
    assert_eq!(
      r["color"],
      Value::List(vec![Value::from(255), Value::from(0), Value::from(0)])
    );
  }
}
