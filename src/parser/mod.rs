// Gesture script parser: pipe-separated interaction commands

pub mod ast;
pub mod commands;
pub mod lexer;
pub mod script;

use crate::error::ChartError;
use anyhow::{anyhow, Result};

// Public API re-exports
pub use ast::{ArgValue, Command, Script};

/// Parse a script, reporting where parsing stopped
pub fn parse(input: &str) -> Result<Script> {
    if input.trim().is_empty() {
        return Err(ChartError::EmptyScript.into());
    }
    match script::parse_script(input) {
        Ok((_, script)) => Ok(script),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let offset = input.len() - e.input.len();
            Err(anyhow!("Failed to parse script at offset {}: '{}'", offset, e.input.trim()))
        }
        Err(nom::Err::Incomplete(_)) => {
            Err(anyhow!("Failed to parse script: unexpected end of input"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok() {
        let script = parse("resolution(hour) | reset()").unwrap();
        assert_eq!(script.commands.len(), 2);
    }

    #[test]
    fn test_parse_empty_is_typed_error() {
        let err = parse("   ").unwrap_err();
        assert!(matches!(err.downcast_ref::<ChartError>(), Some(ChartError::EmptyScript)));
    }

    #[test]
    fn test_parse_error_reports_offset() {
        let err = parse("layout(grouped) | nope()").unwrap_err();
        assert!(err.to_string().contains("offset"));
    }
}
