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

//! Conga is a library for robust, incremental chart parsing of small,
//! domain-specific natural-language grammars.
//!
//! A grammar is declared by composing elements with `+`, `|` and `*`,
//! compiled once, and reused across parses. Two properties set the parser
//! apart from a generic CFG engine: unknown tokens are skipped instead of
//! failing the parse, and multi-token phrases can match a single terminal.
//! Parsing yields both a parse tree and a flattened, named result suitable
//! for driving an API:
//!
//! ```rust
//! use conga::{set, rx, Grammar, RobustParser};
//!
//! let action = set(["change", "flash", "set", "blink"]).named("action");
//! let light = set(["top", "middle", "bottom"]).named("light");
//! let color = rx(r"(red|yellow|blue|orange|purple)").named("color");
//! let one_parse = (action + light + color).named("one_parse");
//!
//! let grammar = Grammar::compile(&one_parse.one_or_more()).unwrap();
//! let parser = RobustParser::new(grammar);
//!
//! let (tree, result) = parser.parse("please set my top light to red").unwrap();
//! let first = result["one_parse"].as_list().unwrap()[0].as_map().unwrap();
//! assert_eq!(first["action"].as_str(), Some("set"));
//! assert_eq!(first["color"].as_str(), Some("red"));
//! assert!(tree.size() > 1);
//! ```

#[macro_use]
extern crate derivative;

pub mod chart;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod result;
pub mod rules;
pub mod tokenizer;
pub mod tree;
pub mod utils;

pub use crate::{
  chart::{Chart, Discipline, Edge},
  error::{ActionError, GrammarError, ParseError},
  grammar::{
    elements::{lit, lit_cs, null, rx, rx_cs, set, set_cs, CaseMode, Elem},
    Grammar, GrammarBuilder,
  },
  parser::{Flow, ParserConfig, RobustParser, TieBreak},
  result::{ParseResult, ResultHandle, Value},
  rules::Strategy,
  tree::TreeNode,
};
