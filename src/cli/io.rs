//! JSON I/O handling for the CLI
//!
//! - Input: one JSON document via stdin
//! - Output: one JSON object per line via stdout

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read one JSON document from `reader` (may span several lines)
pub fn read_request_from<R: Read>(reader: &mut R) -> CliResult<Value> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    Ok(serde_json::from_str(&input)?)
}

/// Read one JSON document from stdin
pub fn read_request() -> CliResult<Value> {
    read_request_from(&mut io::stdin().lock())
}

/// Write `{"status":"ok","data":...}` to `writer`
pub fn write_response_to<W: Write>(writer: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    serde_json::to_writer(&mut *writer, &response)?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_response_to(&mut io::stdout().lock(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_multiline_document() {
        let mut input = "{\n  \"age\": {\"$gt\": 1}\n}\n".as_bytes();
        let value = read_request_from(&mut input).unwrap();
        assert_eq!(value, json!({"age": {"$gt": 1}}));
    }

    #[test]
    fn test_read_empty_input() {
        let mut input = "  \n".as_bytes();
        assert!(read_request_from(&mut input).is_err());
    }

    #[test]
    fn test_write_response_line() {
        let mut out = Vec::new();
        write_response_to(&mut out, json!({"a": 1})).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "{\"status\":\"ok\",\"data\":{\"a\":1}}\n");
    }
}
