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

//! Engine-level invariants: chart determinism, deduplication, skip and
//! step bounds, ranking, and result-build idempotence.

use conga::{
  lit, rx, set, Edge, Grammar, GrammarBuilder, ParseError, ParserConfig,
  RobustParser, Strategy, TieBreak,
};

fn light_grammar() -> Grammar {
  let action = set(["change", "flash", "set", "blink"]).named("action");
  let light = set(["top", "middle", "bottom"]).named("light");
  let color = rx(r"(red|yellow|blue|orange|purple)").named("color");
  let times =
    (set(["once", "twice", "three times"]) | rx(r"\d+ times")).named("times");
  let one_parse = (action + light + times.opt() + color).named("one_parse");
  Grammar::compile(&one_parse.one_or_more()).unwrap()
}

#[test]
fn chart_is_deterministic_across_runs() {
  let parser = RobustParser::new(light_grammar());
  let input = "set my top light to red and change middle light to yellow";
  let (chart_a, _) = parser.parse_to_chart(input).unwrap();
  let (chart_b, _) = parser.parse_to_chart(input).unwrap();

  let edges_a: Vec<Edge> = chart_a.edges().copied().collect();
  let edges_b: Vec<Edge> = chart_b.edges().copied().collect();
  assert_eq!(edges_a, edges_b);
  assert!(!edges_a.is_empty());
}

#[test]
fn chart_contains_no_duplicate_edges() {
  let parser = RobustParser::new(light_grammar());
  let (chart, _) = parser.parse_to_chart("flash bottom light twice in blue").unwrap();
  let edges: Vec<Edge> = chart.edges().copied().collect();
  let mut deduped = edges.clone();
  deduped.dedup();
  assert_eq!(edges.len(), deduped.len());
  assert_eq!(edges.len(), chart.len());
}

#[test]
fn skip_cap_bounds_accepted_parses() {
  // "set my top light to red" requires exactly three skips.
  let input = "set my top light to red";

  let strict = RobustParser::new(light_grammar()).with_config(ParserConfig {
    skip_cap: Some(2),
    ..ParserConfig::default()
  });
  assert!(matches!(strict.parse(input), Err(ParseError::NoParse { .. })));

  let lenient = RobustParser::new(light_grammar()).with_config(ParserConfig {
    skip_cap: Some(3),
    ..ParserConfig::default()
  });
  assert!(lenient.parse(input).is_ok());
}

#[test]
fn zero_skip_cap_still_parses_clean_input() {
  let parser = RobustParser::new(light_grammar()).with_config(ParserConfig {
    skip_cap: Some(0),
    ..ParserConfig::default()
  });
  assert!(parser.parse("set top red").is_ok());
  assert!(matches!(
    parser.parse("set my top red"),
    Err(ParseError::NoParse { .. })
  ));
}

#[test]
fn step_budget_aborts_with_budget_error() {
  let parser = RobustParser::new(light_grammar()).with_config(ParserConfig {
    step_budget: Some(1),
    ..ParserConfig::default()
  });
  assert!(matches!(
    parser.parse("set top red"),
    Err(ParseError::Budget { .. })
  ));
}

#[test]
fn empty_input_is_a_typed_error() {
  let parser = RobustParser::new(light_grammar());
  assert!(matches!(parser.parse(""), Err(ParseError::Empty)));
  assert!(matches!(parser.parse("   \t "), Err(ParseError::Empty)));
}

#[test]
fn no_parse_reports_furthest_position_and_expected_terminals() {
  let parser = RobustParser::new(light_grammar());
  match parser.parse("hello world") {
    Err(ParseError::NoParse { furthest, expected }) => {
      assert_eq!(furthest, 1);
      assert!(expected.iter().any(|name| name.str() == "action"));
    }
    other => panic!("expected NoParse, got {:?}", other.map(|_| ())),
  }
}

#[test]
fn result_build_is_idempotent() {
  let parser = RobustParser::new(light_grammar());
  let (tree, result) = parser.parse("flash bottom light twice in blue").unwrap();
  let rebuilt = parser.result_for(&tree).unwrap();
  assert_eq!(result, rebuilt);
}

#[test]
fn ranking_prefers_fewest_nodes_over_declaration_order() {
  // Both alternatives cover "x x": the two-leaf parse is declared first,
  // but the single multi-word literal yields the smaller tree.
  let narrow =
    (lit("x").named("one") + lit("x").named("two")).named("narrow");
  let wide = lit("x x").named("wide");
  let goal = narrow | wide;
  let parser = RobustParser::new(Grammar::compile(&goal).unwrap());

  let (tree, result) = parser.parse("x x").unwrap();
  assert!(result.contains("wide"));
  assert_eq!(tree.size(), 2);
}

#[test]
fn reverse_tie_break_prefers_later_alternatives() {
  let head = lit("a").named("head");
  let first = set(["b"]).named("first");
  let second = rx("b").named("second");
  let goal = (head.clone() + first) | (head + second);

  let parser = RobustParser::new(Grammar::compile(&goal).unwrap())
    .with_config(ParserConfig {
      tie_break: TieBreak::ReverseDefinitionOrder,
      ..ParserConfig::default()
    });
  let (_, result) = parser.parse("a b").unwrap();
  assert!(result.contains("second"));
}

#[test]
fn strategies_build_equivalent_results() {
  let input = "blink middle light 20 times in yellow";
  let left_corner = RobustParser::new(light_grammar());
  let top_down =
    RobustParser::with_strategy(light_grammar(), Strategy::top_down());
  let bottom_up =
    RobustParser::with_strategy(light_grammar(), Strategy::bottom_up());

  let (_, a) = left_corner.parse(input).unwrap();
  let (_, b) = top_down.parse(input).unwrap();
  let (_, c) = bottom_up.parse(input).unwrap();
  assert_eq!(a, b);
  assert_eq!(b, c);
}

#[test]
fn ignored_elements_are_left_out_of_results() {
  let action = lit("set").named("action");
  let filler = lit("to").ignored();
  let color = lit("red").named("color");
  let parser = RobustParser::new(
    Grammar::compile(&(action + filler + color)).unwrap(),
  );

  let (_, result) = parser.parse("set to red").unwrap();
  assert!(result.contains("action"));
  assert!(result.contains("color"));
  assert!(!result.contains("Lit(to)"));
}

#[test]
fn builder_can_force_case_sensitive_matching() {
  let builder = GrammarBuilder::new().case_sensitive(true);
  let word = builder.add_named("word", &set(["Tick"]));
  let grammar = builder.build(&word.one_or_more()).unwrap();
  let parser = RobustParser::new(grammar).with_config(ParserConfig {
    skip_cap: Some(0),
    ..ParserConfig::default()
  });

  assert!(parser.parse("Tick Tick").is_ok());
  assert!(matches!(
    parser.parse("tick"),
    Err(ParseError::NoParse { .. })
  ));
}

#[test]
fn config_case_flag_feeds_the_grammar_builder() {
  let config = ParserConfig {
    case_sensitive: true,
    ..ParserConfig::default()
  };
  let builder = GrammarBuilder::from_config(&config);
  let word = builder.add_named("word", &set(["Tick"]));
  let grammar = builder.build(&word.one_or_more()).unwrap();
  let parser = RobustParser::new(grammar).with_config(config);

  assert!(parser.parse("Tick").is_ok());
  assert!(matches!(
    parser.parse("tick"),
    Err(ParseError::NoParse { .. })
  ));
}

#[test]
fn repetition_collects_every_occurrence() {
  let word = set(["tick", "tock"]).named("word");
  let parser = RobustParser::new(Grammar::compile(&word.one_or_more()).unwrap());
  let (_, result) = parser.parse("tick tock tick tick").unwrap();
  let words = result["word"].as_list().unwrap();
  assert_eq!(words.len(), 4);
  assert_eq!(words[0].as_str(), Some("tick"));
  assert_eq!(words[1].as_str(), Some("tock"));
}

#[test]
fn bounded_repetition_enforces_the_range() {
  let t = lit("t").named("t");
  let parser =
    RobustParser::new(Grammar::compile(&(&t * (2, 3)).named("run")).unwrap())
      .with_config(ParserConfig {
        skip_cap: Some(0),
        ..ParserConfig::default()
      });

  assert!(matches!(parser.parse("t"), Err(ParseError::NoParse { .. })));
  assert!(parser.parse("t t").is_ok());
  assert!(parser.parse("t t t").is_ok());
  assert!(matches!(
    parser.parse("t t t t"),
    Err(ParseError::NoParse { .. })
  ));
}
