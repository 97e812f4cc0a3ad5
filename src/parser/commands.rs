// Parsers for individual script commands

use super::ast::{ArgValue, Command};
use super::lexer::{keyword_arg, named_args, ws};
use nom::{branch::alt, bytes::complete::tag, IResult};

/// Parse any single command
pub fn parse_command(input: &str) -> IResult<&str, Command> {
    alt((
        parse_resolution,
        parse_layout,
        parse_wheel,
        parse_drag,
        parse_hover,
        parse_wait,
        parse_reset,
    ))(input)
}

/// Format: resolution(hour|day|month)
fn parse_resolution(input: &str) -> IResult<&str, Command> {
    let (rest, _) = ws(tag("resolution"))(input)?;
    let (rest, name) = keyword_arg(rest)?;
    let resolution = name.parse().map_err(|_| fail(input))?;
    Ok((rest, Command::Resolution(resolution)))
}

/// Format: layout(stacked|grouped)
fn parse_layout(input: &str) -> IResult<&str, Command> {
    let (rest, _) = ws(tag("layout"))(input)?;
    let (rest, name) = keyword_arg(rest)?;
    let mode = name.parse().map_err(|_| fail(input))?;
    Ok((rest, Command::Layout(mode)))
}

/// Format: wheel(x: 300, y: 120, k: 2[, shift: true])
fn parse_wheel(input: &str) -> IResult<&str, Command> {
    let (rest, _) = ws(tag("wheel"))(input)?;
    let (rest, args) = named_args(rest)?;
    let args = Args::new(input, args);
    Ok((
        rest,
        Command::Wheel {
            x: args.number("x")?,
            y: args.number("y")?,
            k: args.number("k")?,
            shift: args.flag("shift")?,
        },
    ))
}

/// Format: drag(x: 300, y: 120, dx: -40[, dy: 0])
fn parse_drag(input: &str) -> IResult<&str, Command> {
    let (rest, _) = ws(tag("drag"))(input)?;
    let (rest, args) = named_args(rest)?;
    let args = Args::new(input, args);
    Ok((
        rest,
        Command::Drag {
            x: args.number("x")?,
            y: args.number("y")?,
            dx: args.number_or("dx", 0.0)?,
            dy: args.number_or("dy", 0.0)?,
        },
    ))
}

/// Format: hover(x: 300, y: 120)
fn parse_hover(input: &str) -> IResult<&str, Command> {
    let (rest, _) = ws(tag("hover"))(input)?;
    let (rest, args) = named_args(rest)?;
    let args = Args::new(input, args);
    Ok((
        rest,
        Command::Hover {
            x: args.number("x")?,
            y: args.number("y")?,
        },
    ))
}

/// Format: wait(ms: 800)
fn parse_wait(input: &str) -> IResult<&str, Command> {
    let (rest, _) = ws(tag("wait"))(input)?;
    let (rest, args) = named_args(rest)?;
    let ms = Args::new(input, args).number("ms")?;
    if ms < 0.0 {
        return Err(fail(input));
    }
    Ok((rest, Command::Wait { ms: ms.round() as u64 }))
}

/// Format: reset()
fn parse_reset(input: &str) -> IResult<&str, Command> {
    let (rest, _) = ws(tag("reset"))(input)?;
    let (rest, args) = named_args(rest)?;
    if !args.is_empty() {
        return Err(fail(input));
    }
    Ok((rest, Command::Reset))
}

fn fail(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Verify))
}

/// Named arguments of one command, looked up by key
struct Args<'a> {
    input: &'a str,
    values: Vec<(String, ArgValue)>,
}

impl<'a> Args<'a> {
    fn new(input: &'a str, values: Vec<(String, ArgValue)>) -> Self {
        Args { input, values }
    }

    fn get(&self, key: &str) -> Option<&ArgValue> {
        self.values.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn number(&self, key: &str) -> Result<f64, nom::Err<nom::error::Error<&'a str>>> {
        match self.get(key) {
            Some(ArgValue::Number(n)) => Ok(*n),
            _ => Err(fail(self.input)),
        }
    }

    fn number_or(
        &self,
        key: &str,
        default: f64,
    ) -> Result<f64, nom::Err<nom::error::Error<&'a str>>> {
        match self.get(key) {
            None => Ok(default),
            Some(_) => self.number(key),
        }
    }

    fn flag(&self, key: &str) -> Result<bool, nom::Err<nom::error::Error<&'a str>>> {
        match self.get(key) {
            None => Ok(false),
            Some(ArgValue::Bool(b)) => Ok(*b),
            Some(ArgValue::Number(_)) => Err(fail(self.input)),
        }
    }
}
