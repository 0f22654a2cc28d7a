//! Line commands of the interactive browser

use anyhow::{anyhow, bail, Context, Result};
use ns_core::{Category, Kind, NavigatorCommand};

/// Default number of timestamps resolved by `prefetch`
const DEFAULT_PREFETCH_COUNT: usize = 8;
/// Default spacing of prefetched timestamps in milliseconds
const DEFAULT_PREFETCH_STEP: i64 = 500;

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Navigate(NavigatorCommand),
    Lookup(Kind, i64),
    Prefetch { kind: Kind, count: usize, step: i64 },
    State,
    Scenes,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  load                         load the dataset
  category <samples|sweeps>    switch category
  scene <index>                switch scene
  seek <ms>                    seek to a timestamp
  next | start | end           step / jump within the scene
  lookup <cam|lidar> <ms>      resolve a file without moving
  prefetch <cam|lidar> [n] [step]
  state | scenes | help | quit";

/// Parse a command line; `None` for blank lines
pub fn parse_line(line: &str) -> Result<Option<Input>> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let input = match (word, args.as_slice()) {
        ("load", []) => Input::Navigate(NavigatorCommand::Load),
        ("category", [category]) => {
            let category: Category = category.parse()?;
            Input::Navigate(NavigatorCommand::SelectCategory(category))
        }
        ("scene", [index]) => Input::Navigate(NavigatorCommand::SelectScene(
            index.parse().with_context(|| format!("Invalid scene index: {index}"))?,
        )),
        ("seek", [timestamp]) => Input::Navigate(NavigatorCommand::SelectTimestamp(parse_timestamp(timestamp)?)),
        ("next", []) => Input::Navigate(NavigatorCommand::SeekNext),
        ("start", []) => Input::Navigate(NavigatorCommand::SeekToStart),
        ("end", []) => Input::Navigate(NavigatorCommand::SeekToEnd),
        ("lookup", [kind, timestamp]) => Input::Lookup(kind.parse()?, parse_timestamp(timestamp)?),
        ("prefetch", [kind, rest @ ..]) if rest.len() <= 2 => {
            let count = match rest.first() {
                Some(count) => count.parse().with_context(|| format!("Invalid count: {count}"))?,
                None => DEFAULT_PREFETCH_COUNT,
            };
            let step = match rest.get(1) {
                Some(step) => parse_timestamp(step)?,
                None => DEFAULT_PREFETCH_STEP,
            };
            Input::Prefetch {
                kind: kind.parse()?,
                count,
                step,
            }
        }
        ("state", []) => Input::State,
        ("scenes", []) => Input::Scenes,
        ("help", []) => Input::Help,
        ("quit" | "exit", []) => Input::Quit,
        (word, _) if is_known(word) => bail!("Wrong arguments for '{word}'"),
        (word, _) => return Err(anyhow!("Unknown command '{word}'")),
    };
    Ok(Some(input))
}

fn parse_timestamp(value: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("Invalid timestamp: {value}"))
}

fn is_known(word: &str) -> bool {
    matches!(
        word,
        "load" | "category" | "scene" | "seek" | "next" | "start" | "end" | "lookup" | "prefetch"
            | "state" | "scenes" | "help" | "quit" | "exit"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_commands() {
        assert_eq!(
            parse_line("category sweeps").unwrap(),
            Some(Input::Navigate(NavigatorCommand::SelectCategory(Category::Sweeps)))
        );
        assert_eq!(
            parse_line("  seek 1532402927647951 ").unwrap(),
            Some(Input::Navigate(NavigatorCommand::SelectTimestamp(1532402927647951)))
        );
        assert_eq!(parse_line("next").unwrap(), Some(Input::Navigate(NavigatorCommand::SeekNext)));
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn test_lookup_and_prefetch() {
        assert_eq!(parse_line("lookup cam 250").unwrap(), Some(Input::Lookup(Kind::CamFront, 250)));
        assert_eq!(
            parse_line("prefetch lidar").unwrap(),
            Some(Input::Prefetch {
                kind: Kind::LidarTop,
                count: DEFAULT_PREFETCH_COUNT,
                step: DEFAULT_PREFETCH_STEP,
            })
        );
        assert_eq!(
            parse_line("prefetch cam 3 100").unwrap(),
            Some(Input::Prefetch { kind: Kind::CamFront, count: 3, step: 100 })
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse_line("seek soon").is_err());
        assert!(parse_line("scene").is_err());
        assert!(parse_line("category keyframes").is_err());
        assert!(parse_line("fly 3").is_err());
    }
}
