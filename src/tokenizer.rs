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

/// The tokenized input of a single parse. Tokens are split on ASCII
/// whitespace with runs collapsed; the original spelling and an
/// ASCII-lowercased folding are both retained so terminals can look at
/// either, and any `[i, j)` window can be rendered back to text for
/// multi-token terminal matching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tokens {
  items: Vec<String>,
  folded: Vec<String>,
}

impl Tokens {
  pub fn new(text: &str) -> Tokens {
    let items: Vec<String> =
      text.split_ascii_whitespace().map(str::to_string).collect();
    let folded = items.iter().map(|t| t.to_ascii_lowercase()).collect();
    Tokens { items, folded }
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn get(&self, i: usize) -> &str {
    &self.items[i]
  }

  /// The original text of the window `[i, j)`, joined with single spaces.
  pub fn window(&self, i: usize, j: usize) -> String {
    self.items[i..j].join(" ")
  }

  /// The ASCII-lowercased text of the window `[i, j)`.
  pub fn window_folded(&self, i: usize, j: usize) -> String {
    self.folded[i..j].join(" ")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_collapses_whitespace() {
    let toks = Tokens::new("  set \t my  top light  ");
    assert_eq!(toks.len(), 4);
    assert_eq!(toks.get(0), "set");
    assert_eq!(toks.get(3), "light");
  }

  #[test]
  fn test_window_preserves_original_case() {
    let toks = Tokens::new("Turn OFF the lights");
    assert_eq!(toks.window(0, 2), "Turn OFF");
    assert_eq!(toks.window_folded(0, 2), "turn off");
  }

  #[test]
  fn test_empty_input() {
    assert!(Tokens::new("   ").is_empty());
  }
}
