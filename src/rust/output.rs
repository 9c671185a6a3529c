//! JSON lines for standard output, laid out with `", "` and `": "`
//! separators.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

/// Message printed when the command line carries no text.
pub const NO_TEXT: &str = "no text supplied";

#[derive(Debug, Clone, Copy, Default)]
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

pub fn to_json_line<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    error: &'a str,
}

/// `{"error": <message>}`
pub fn error_payload(message: &str) -> Result<String, serde_json::Error> {
    to_json_line(&ErrorPayload { error: message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_error_payload() {
        assert_eq!(error_payload(NO_TEXT).unwrap(), r#"{"error": "no text supplied"}"#);
    }

    #[test]
    fn test_nested_separators() {
        let mut map = BTreeMap::new();
        map.insert("a", vec![1, 2]);
        map.insert("b", vec![]);
        assert_eq!(to_json_line(&map).unwrap(), r#"{"a": [1, 2], "b": []}"#);
    }
}
