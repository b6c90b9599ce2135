use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use std::io;

use crate::common::Color;
use crate::error::AppError;

/// The actuator command: `{"cmd": "setRGB", "payload": "R G B"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRgbCommand {
    pub cmd: String,
    pub payload: String,
}

impl SetRgbCommand {
    pub const CMD: &'static str = "setRGB";

    pub fn new(color: Color) -> Self {
        Self {
            cmd: Self::CMD.to_string(),
            payload: color.to_wire_payload(),
        }
    }

    /// Encodes with `", "` and `": "` separators, matching the bytes existing
    /// actuators have always received.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, AppError> {
        let mut buffer = Vec::with_capacity(48);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
        self.serialize(&mut serializer)?;
        Ok(buffer)
    }

    pub fn to_json_string(&self) -> Result<String, AppError> {
        let bytes = self.to_json_bytes()?;
        String::from_utf8(bytes).map_err(|e| AppError::Pipeline(e.to_string()))
    }

    /// Parses the payload back into a color, if well formed.
    pub fn color(&self) -> Option<Color> {
        let mut parts = self.payload.split(' ').map(|p| p.parse::<u8>());
        let (r, g, b) = (parts.next()?.ok()?, parts.next()?.ok()?, parts.next()?.ok()?);
        if parts.next().is_some() {
            return None;
        }
        Some(Color::new(r, g, b))
    }
}

impl From<Color> for SetRgbCommand {
    fn from(color: Color) -> Self {
        Self::new(color)
    }
}

/// Compact JSON with a space after every `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_byte_exact() {
        let command = SetRgbCommand::new(Color::new(123, 45, 200));
        assert_eq!(
            command.to_json_string().unwrap(),
            r#"{"cmd": "setRGB", "payload": "123 45 200"}"#
        );
    }

    #[test]
    fn wire_format_parses_as_plain_json() {
        let bytes = SetRgbCommand::new(Color::new(0, 0, 0)).to_json_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["cmd"], "setRGB");
        assert_eq!(object["payload"], "0 0 0");
    }

    #[test]
    fn payload_reads_back_as_color() {
        let command = SetRgbCommand::from(Color::new(255, 1, 17));
        assert_eq!(command.color(), Some(Color::new(255, 1, 17)));

        let broken = SetRgbCommand {
            cmd: SetRgbCommand::CMD.to_string(),
            payload: "1 2".to_string(),
        };
        assert_eq!(broken.color(), None);
    }
}
