// Pipeline parser for gesture scripts

use super::ast::Script;
use super::commands::parse_command;
use super::lexer::ws;
use nom::{
    bytes::complete::tag,
    combinator::eof,
    multi::separated_list1,
    IResult,
};

/// Parse a complete script
/// Format: command() | command() | ...
pub fn parse_script(input: &str) -> IResult<&str, Script> {
    let (input, commands) = separated_list1(ws(tag("|")), parse_command)(input)?;

    // Consume trailing whitespace and ensure end of input
    let (input, _) = ws(eof)(input)?;

    Ok((input, Script { commands }))
}
