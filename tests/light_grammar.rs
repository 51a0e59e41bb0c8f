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

//! End-to-end scenarios over the canonical light-control grammar.

use conga::{
  lit, rx, set, ActionError, Flow, Grammar, ParseError, ParseResult,
  RobustParser, Strategy, Value,
};
use rstest::rstest;

fn light_grammar() -> Grammar {
  let action = set(["change", "flash", "set", "blink"]).named("action");
  let light = set(["top", "middle", "bottom"]).named("light");
  let color = rx(r"(red|yellow|blue|orange|purple)").named("color");
  let times =
    (set(["once", "twice", "three times"]) | rx(r"\d+ times")).named("times");
  let one_parse = (action + light + times.opt() + color).named("one_parse");
  Grammar::compile(&one_parse.one_or_more()).unwrap()
}

fn goal_entries(result: &ParseResult) -> Vec<Vec<String>> {
  result["GOAL"]
    .as_list()
    .unwrap()
    .iter()
    .map(|entry| {
      entry
        .as_list()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
    })
    .collect()
}

fn one_parse_at(result: &ParseResult, i: usize) -> &ParseResult {
  result["one_parse"].as_list().unwrap()[i].as_map().unwrap()
}

#[test]
fn parses_single_command_with_fillers() {
  let parser = RobustParser::new(light_grammar());
  let (_, result) = parser.parse("set my top light to red").unwrap();

  assert_eq!(goal_entries(&result), vec![vec!["set", "top", "red"]]);
  let first = one_parse_at(&result, 0);
  assert_eq!(first["action"].as_str(), Some("set"));
  assert_eq!(first["light"].as_str(), Some("top"));
  assert_eq!(first["color"].as_str(), Some("red"));
  assert!(!first.contains("times"));
}

#[test]
fn parses_two_commands_joined_by_unknown_token() {
  let parser = RobustParser::new(light_grammar());
  let (_, result) = parser
    .parse("set my top light to red and change middle light to yellow")
    .unwrap();

  let entries = goal_entries(&result);
  assert_eq!(entries.len(), 2);
  assert_eq!(entries[0], vec!["set", "top", "red"]);
  assert_eq!(entries[1], vec!["change", "middle", "yellow"]);

  let second = one_parse_at(&result, 1);
  assert_eq!(second["action"].as_str(), Some("change"));
  assert_eq!(second["light"].as_str(), Some("middle"));
  assert_eq!(second["color"].as_str(), Some("yellow"));
}

#[test]
fn parses_optional_times() {
  let parser = RobustParser::new(light_grammar());
  let (_, result) = parser.parse("flash bottom light twice in blue").unwrap();

  assert_eq!(
    goal_entries(&result),
    vec![vec!["flash", "bottom", "twice", "blue"]]
  );
  let first = one_parse_at(&result, 0);
  assert_eq!(first["times"].as_str(), Some("twice"));
}

#[test]
fn parses_multi_token_regex_terminal() {
  let parser = RobustParser::new(light_grammar());
  let (tree, result) =
    parser.parse("blink middle light 20 times in yellow").unwrap();

  assert_eq!(
    goal_entries(&result),
    vec![vec!["blink", "middle", "20 times", "yellow"]]
  );
  let first = one_parse_at(&result, 0);
  assert_eq!(first["times"].as_str(), Some("20 times"));
  assert_eq!(first["color"].as_str(), Some("yellow"));
  // The multi-token match is one leaf preserving both tokens.
  assert!(format!("{}", tree).contains("\"20 times\""));
}

#[test]
fn skips_leading_and_trailing_fillers() {
  let parser = RobustParser::new(light_grammar());
  let (_, result) = parser
    .parse("please kindly set the top light to red thanks")
    .unwrap();

  assert_eq!(goal_entries(&result), vec![vec!["set", "top", "red"]]);
}

fn light_grammar_with_actions() -> Grammar {
  let action = set(["change", "flash", "set", "blink"]).named("action");
  let light = set(["top", "middle", "bottom"]).named("light");
  let color = rx(r"(red|yellow|blue|orange|purple)")
    .named("color")
    .set_result_action(|r| {
      let name = r
        .get()
        .as_str()
        .ok_or_else(|| ActionError::new("color value is not text"))?
        .to_string();
      let (red, green, blue) = match name.as_str() {
        "red" => (255, 0, 0),
        "yellow" => (255, 255, 0),
        "blue" => (0, 0, 255),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        other => return Err(ActionError::new(format!("unknown color {}", other))),
      };
      r.set(vec![
        Value::from(red),
        Value::from(green),
        Value::from(blue),
      ]);
      Ok(())
    });
  let times = (set(["once", "twice", "three times"]) | rx(r"\d+ times"))
    .named("times")
    .set_result_action(|r| {
      let text = r
        .get()
        .as_str()
        .ok_or_else(|| ActionError::new("times value is not text"))?
        .to_string();
      let n: i64 = match text.as_str() {
        "once" => 1,
        "twice" => 2,
        "three times" => 3,
        other => other
          .split_whitespace()
          .next()
          .unwrap_or("")
          .parse()
          .map_err(|_| ActionError::new(format!("bad count {}", other)))?,
      };
      r.set(n);
      Ok(())
    });
  let one_parse = (action + light + times.opt() + color).named("one_parse");
  Grammar::compile(&one_parse.one_or_more()).unwrap()
}

#[test]
fn result_actions_replace_values() {
  let parser = RobustParser::new(light_grammar_with_actions());
  let (_, result) = parser
    .parse("flash my top light twice in red and blink middle light 20 times in yellow")
    .unwrap();

  let first = one_parse_at(&result, 0);
  assert_eq!(first["times"].as_int(), Some(2));
  assert_eq!(
    first["color"],
    Value::List(vec![Value::from(255), Value::from(0), Value::from(0)])
  );

  let second = one_parse_at(&result, 1);
  assert_eq!(second["times"].as_int(), Some(20));
  assert_eq!(
    second["color"],
    Value::List(vec![Value::from(255), Value::from(255), Value::from(0)])
  );
}

#[test]
fn failing_action_reports_element_and_keeps_tree() {
  let boom = lit("boom").named("boom").set_result_action(|_| {
    Err(ActionError::new("exploded"))
  });
  let grammar = Grammar::compile(&boom).unwrap();
  let parser = RobustParser::new(grammar);
  match parser.parse("boom") {
    Err(ParseError::Callback {
      element,
      source,
      tree,
    }) => {
      assert_eq!(element.str(), "boom");
      assert_eq!(source.0, "exploded");
      assert_eq!(tree.lexicon(), "boom");
    }
    other => panic!("expected a callback error, got {:?}", other.map(|_| ())),
  }
}

#[rstest]
#[case::left_corner(Strategy::left_corner())]
#[case::top_down(Strategy::top_down())]
#[case::bottom_up(Strategy::bottom_up())]
fn all_strategies_agree(#[case] strategy: Strategy) {
  let parser = RobustParser::with_strategy(light_grammar(), strategy);
  let (_, result) = parser.parse("set my top light to red").unwrap();
  assert_eq!(goal_entries(&result), vec![vec!["set", "top", "red"]]);
}

#[rstest]
#[case("set top red", vec!["set", "top", "red"])]
#[case("blink bottom three times purple", vec!["blink", "bottom", "three times", "purple"])]
#[case("CHANGE Middle Light To BLUE", vec!["CHANGE", "Middle", "BLUE"])]
fn parses_clean_commands(#[case] input: &str, #[case] expected: Vec<&str>) {
  let parser = RobustParser::new(light_grammar());
  let (_, result) = parser.parse(input).unwrap();
  assert_eq!(goal_entries(&result), vec![expected]);
}

#[test]
fn incremental_listener_sees_improving_prefixes() {
  let parser = RobustParser::new(light_grammar());
  let mut prefixes: Vec<String> = Vec::new();
  let (_, result) = parser
    .parse_incremental(
      "set my top light to red and change middle light to yellow",
      |tree| {
        prefixes.push(tree.lexicon().to_string());
        Flow::Continue
      },
    )
    .unwrap();

  assert!(prefixes.len() >= 2);
  assert_eq!(prefixes.first().unwrap(), "set top red");
  assert_eq!(goal_entries(&result).len(), 2);
}

#[test]
fn incremental_listener_can_stop_early() {
  let parser = RobustParser::new(light_grammar());
  let mut calls = 0;
  let (_, result) = parser
    .parse_incremental(
      "set my top light to red and change middle light to yellow",
      |_| {
        calls += 1;
        Flow::Stop
      },
    )
    .unwrap();

  assert_eq!(calls, 1);
  assert_eq!(goal_entries(&result).len(), 1);
}

#[test]
fn or_tie_breaks_on_declaration_order() {
  let head = lit("a").named("head");
  let first = set(["b"]).named("first");
  let second = rx("b").named("second");
  let goal = (head.clone() + first) | (head + second);
  let parser = RobustParser::new(Grammar::compile(&goal).unwrap());

  let (_, result) = parser.parse("a b").unwrap();
  assert!(result.contains("first"));
  assert!(!result.contains("second"));
}

#[test]
fn parse_multi_returns_both_alternatives() {
  let head = lit("a").named("head");
  let first = set(["b"]).named("first");
  let second = rx("b").named("second");
  let goal = (head.clone() + first) | (head + second);
  let parser = RobustParser::new(Grammar::compile(&goal).unwrap());

  let parses = parser.parse_multi("a b", 2).unwrap();
  assert_eq!(parses.len(), 2);
  assert!(parses[0].1.contains("first"));
  assert!(parses[1].1.contains("second"));
}
