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

//! Drives the colored-light grammar over a handful of spoken-style
//! commands and prints the tree and result for each.

use conga::{rx, set, ActionError, Grammar, RobustParser, Value};

fn colored_light_grammar() -> Grammar {
  let action = set(["change", "flash", "set", "blink"]).named("action");
  let light = set(["top", "middle", "bottom"]).named("light");
  let color = rx(r"(red|yellow|blue|orange|purple)")
    .named("color")
    .set_result_action(|r| {
      let name = r
        .get()
        .as_str()
        .ok_or_else(|| ActionError::new("color is not text"))?
        .to_string();
      let (red, green, blue) = match name.as_str() {
        "red" => (255, 0, 0),
        "yellow" => (255, 255, 0),
        "blue" => (0, 0, 255),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        _ => (0, 0, 0),
      };
      r.set(vec![
        Value::from(red),
        Value::from(green),
        Value::from(blue),
      ]);
      Ok(())
    });
  let times = (set(["once", "twice", "three times"]) | rx(r"\d+ times"))
    .named("times");
  let one_parse = (action + light + times.opt() + color).named("one_parse");

  Grammar::compile(&one_parse.one_or_more()).expect("grammar compiles")
}

fn main() {
  let grammar = colored_light_grammar();
  eprintln!("Grammar:\n{}\n", grammar.to_pretty());

  let parser = RobustParser::new(grammar);

  let sentences = [
    "set my top light to red",
    "set my top light to red and change middle light to yellow",
    "flash bottom light twice in blue",
    "blink middle light 20 times in yellow",
    "please kindly set the top light to red thanks",
    "I want to turn off everything",
  ];

  for sentence in sentences {
    println!("> {}", sentence);
    match parser.parse(sentence) {
      Ok((tree, result)) => {
        println!("{}", tree);
        println!("{}\n", result);
      }
      Err(err) => println!("no parse: {}\n", err),
    }
  }
}
