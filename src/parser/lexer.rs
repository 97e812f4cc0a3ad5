// Lexer utilities for the gesture script

use super::ast::ArgValue;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, recognize, value},
    multi::separated_list0,
    number::complete::double,
    sequence::delimited,
    IResult,
};

/// Parse and consume whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse an identifier (command name, argument name, keyword)
/// Format: [a-zA-Z_][a-zA-Z0-9_]*
pub fn identifier(input: &str) -> IResult<&str, String> {
    let (rest, ident) = recognize(take_while1(|c: char| c.is_alphanumeric() || c == '_'))(input)?;

    if let Some(first) = ident.chars().next() {
        if !first.is_alphabetic() && first != '_' {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Alpha,
            )));
        }
    }

    Ok((rest, ident.to_string()))
}

/// Parse a number literal (integer or float, optionally signed)
pub fn number_literal(input: &str) -> IResult<&str, f64> {
    double(input)
}

/// Parse `true` or `false`
pub fn bool_literal(input: &str) -> IResult<&str, bool> {
    alt((value(true, tag("true")), value(false, tag("false"))))(input)
}

fn arg_value(input: &str) -> IResult<&str, ArgValue> {
    alt((
        map(bool_literal, ArgValue::Bool),
        map(number_literal, ArgValue::Number),
    ))(input)
}

/// Parse a single named argument (key: value)
pub fn named_arg(input: &str) -> IResult<&str, (String, ArgValue)> {
    let (input, key) = ws(identifier)(input)?;
    let (input, _) = ws(char(':'))(input)?;
    let (input, arg) = ws(arg_value)(input)?;
    Ok((input, (key, arg)))
}

/// Parse a parenthesised, comma separated list of named arguments
pub fn named_args(input: &str) -> IResult<&str, Vec<(String, ArgValue)>> {
    delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), named_arg),
        ws(char(')')),
    )(input)
}

/// Parse a parenthesised single keyword: `(day)`
pub fn keyword_arg(input: &str) -> IResult<&str, String> {
    delimited(ws(char('(')), ws(identifier), ws(char(')')))(input)
}
