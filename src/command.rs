//! A text driver for [`AvlSet`].
//!
//! The stream is a sequence of whitespace-separated records: `k <key>` inserts
//! a key and `q <low> <high>` counts the keys in `(low, high]`.

use std::{
    fmt::{Debug, Display},
    io::{self, Read, Write},
    str::FromStr,
};

use log::{debug, info};
use thiserror::Error;

use crate::AvlSet;

const INSERT: &str = "k";
const COUNT: &str = "q";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<K> {
    Insert(K),
    Count { low: K, high: K },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("i/o failure on the command stream")]
    Io(#[from] io::Error),
    #[error("unknown command tag `{tag}`")]
    UnknownTag { tag: String },
    #[error("command `{tag}` is missing a key")]
    MissingKey { tag: &'static str },
    #[error("invalid key `{token}`: {reason}")]
    InvalidKey { token: String, reason: String },
}

impl<K: Ord> Command<K> {
    /// Applies the command, returning the count for range queries.
    pub fn apply(self, set: &mut AvlSet<K>) -> Option<usize> {
        match self {
            Command::Insert(key) => {
                set.insert(key);
                None
            }
            Command::Count { low, high } => Some(set.count_in_range(&low, &high)),
        }
    }
}

fn key<'a, K>(
    tag: &'static str,
    tokens: &mut impl Iterator<Item = &'a str>,
) -> Result<K, CommandError>
where
    K: FromStr,
    K::Err: Display,
{
    let token = tokens.next().ok_or(CommandError::MissingKey { tag })?;
    token.parse().map_err(|e: K::Err| CommandError::InvalidKey {
        token: token.to_string(),
        reason: e.to_string(),
    })
}

/// Parses a whole command stream.
pub fn parse<K>(input: &str) -> Result<Vec<Command<K>>, CommandError>
where
    K: FromStr,
    K::Err: Display,
{
    let mut tokens = input.split_ascii_whitespace();
    let mut commands = Vec::new();
    while let Some(tag) = tokens.next() {
        let command = match tag {
            INSERT => Command::Insert(key(INSERT, &mut tokens)?),
            COUNT => Command::Count {
                low: key(COUNT, &mut tokens)?,
                high: key(COUNT, &mut tokens)?,
            },
            _ => {
                return Err(CommandError::UnknownTag {
                    tag: tag.to_string(),
                });
            }
        };
        commands.push(command);
    }
    Ok(commands)
}

/// Reads `input` to the end, applies every command in order and writes each
/// range count to `output` followed by a space.
///
/// Nothing is applied when the stream does not parse.
///
/// # Examples
///
/// ```
/// let mut out = Vec::new();
/// let set = avlcount::command::run::<i64, _, _>("k 5 k 10 k 15 q 5 10 q 0 15".as_bytes(), &mut out)?;
/// assert_eq!(out, b"1 3 ");
/// assert_eq!(set.len(), 3);
/// # Ok::<(), avlcount::CommandError>(())
/// ```
pub fn run<K, R, W>(mut input: R, mut output: W) -> Result<AvlSet<K>, CommandError>
where
    K: Ord + FromStr + Debug,
    K::Err: Display,
    R: Read,
    W: Write,
{
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    let commands = parse::<K>(&text)?;

    let mut set = AvlSet::new();
    let mut queries = 0usize;
    for command in commands {
        debug!("{command:?}");
        if let Some(count) = command.apply(&mut set) {
            write!(output, "{count} ")?;
            queries += 1;
        }
    }
    output.flush()?;
    info!(
        "stored {} keys (height {}), answered {queries} queries",
        set.len(),
        set.height()
    );
    Ok(set)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run_str(input: &str) -> Result<String, CommandError> {
        let mut out = Vec::new();
        run::<i64, _, _>(input.as_bytes(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn parse_works() {
        let commands = parse::<i32>("k 1\nq 0 5\n  k -3").unwrap();
        assert_eq!(
            vec![
                Command::Insert(1),
                Command::Count { low: 0, high: 5 },
                Command::Insert(-3),
            ],
            commands
        );
    }

    #[test]
    fn empty_stream() {
        assert_eq!(0, parse::<i32>("").unwrap().len());
        assert_eq!("", run_str(" \n\t").unwrap());
    }

    #[test]
    fn sample_stream() {
        let out = run_str("k 10 k 20 q 8 31 q 6 9 k 30 k 40 q 15 40").unwrap();
        assert_eq!("2 0 3 ", out);
    }

    #[test]
    fn interleaved_duplicates() {
        let out = run_str("k 5 k 5 q 0 5 k 5 k 6 q 0 10 q 10 0").unwrap();
        assert_eq!("1 2 0 ", out);
    }

    #[test]
    fn unknown_tag() {
        let err = run_str("k 1 x 2").unwrap_err();
        assert!(matches!(err, CommandError::UnknownTag { ref tag } if tag == "x"));
        assert_eq!("unknown command tag `x`", err.to_string());
    }

    #[test]
    fn missing_key() {
        let err = parse::<i32>("k 1 q 3").unwrap_err();
        assert!(matches!(err, CommandError::MissingKey { tag: "q" }));
        let err = parse::<i32>("k").unwrap_err();
        assert!(matches!(err, CommandError::MissingKey { tag: "k" }));
    }

    #[test]
    fn invalid_key() {
        let err = parse::<i32>("k 1 k one").unwrap_err();
        match err {
            CommandError::InvalidKey { token, .. } => assert_eq!("one", token),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nothing_written_on_bad_stream() {
        let mut out = Vec::new();
        let res = run::<i64, _, _>("k 1 q 0 1 z".as_bytes(), &mut out);
        assert!(res.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn string_keys() {
        let mut out = Vec::new();
        let set = run::<String, _, _>("k b k a k c q a c".as_bytes(), &mut out).unwrap();
        assert_eq!(b"2 ".to_vec(), out);
        assert_eq!(Some(&"a".to_string()), set.first());
    }
}
