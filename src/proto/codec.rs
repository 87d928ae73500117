use bytes::BytesMut;
use std::{
    fmt::{self, Write},
    io::{self},
};
use tokio_util::codec::{Decoder, Encoder};

use crate::proto::command::Command;

/// Longest response line accepted before giving up on the terminator.
pub const MAX_LINE_LEN: usize = 4096;

/// Line codec for SCPI over a byte stream.
///
/// Commands are written with a trailing `\n`. Responses end with `\r\n`;
/// a bare `\n` is accepted too since the trim removes any `\r`.
#[derive(Debug, Default)]
pub struct ScpiCodec;

impl ScpiCodec {
    pub(crate) fn decode_line(raw: impl AsRef<[u8]>) -> String {
        String::from_utf8_lossy(raw.as_ref()).trim().to_string()
    }
}

impl Decoder for ScpiCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match src.iter().position(|b| *b == b'\n') {
            Some(n) => {
                let line = src.split_to(n + 1);
                Ok(Some(Self::decode_line(&line)))
            }
            None if src.len() > MAX_LINE_LEN => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("No line terminator within {} bytes", MAX_LINE_LEN),
            )),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            // Peer went away mid-line, hand out what arrived.
            None => {
                let rest = src.split();
                Ok(Some(Self::decode_line(&rest)))
            }
        }
    }
}

fn write_fmt_guarded(dst: &mut BytesMut, args: fmt::Arguments<'_>) -> Result<(), io::Error> {
    dst.write_fmt(args)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

impl Encoder<Command> for ScpiCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write_fmt_guarded(dst, format_args!("{}", item))?;
        dst.write_str("\n")
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::command::RawCommand;

    #[test]
    fn encode_appends_single_newline() {
        let commands = vec![
            Command::Identify,
            Command::ConfigureVoltageDc(None),
            Command::MeasureVoltage,
            Command::ConfigureCurrentDc(None),
            Command::MeasureCurrent,
            Command::SetBeeper(true),
            Command::SetBeeper(false),
            Command::Reset,
            Command::Raw(RawCommand::new("CALC:STAT OFF").expect("valid")),
        ];
        for cmd in commands {
            let expected = cmd.to_string();
            let mut dst = BytesMut::new();
            ScpiCodec.encode(cmd, &mut dst).expect("encode");
            assert_eq!(&dst[..], format!("{}\n", expected).as_bytes());
            assert_eq!(dst.iter().filter(|b| **b == b'\n').count(), 1);
        }
    }

    #[test]
    fn decode_waits_for_terminator() {
        let mut src = BytesMut::from(&b"1.234"[..]);
        assert_eq!(ScpiCodec.decode(&mut src).expect("decode"), None);
        src.extend_from_slice(b"00V\r\n");
        assert_eq!(
            ScpiCodec.decode(&mut src).expect("decode"),
            Some(String::from("1.23400V"))
        );
        assert!(src.is_empty());
    }

    #[test]
    fn decode_strips_whitespace_and_terminator() {
        let mut src = BytesMut::from(&b"  OWON,XDM1041,1234,V1.0 \r\n5V\r\n"[..]);
        let first = ScpiCodec.decode(&mut src).expect("decode").expect("line");
        assert_eq!(first, "OWON,XDM1041,1234,V1.0");
        let second = ScpiCodec.decode(&mut src).expect("decode").expect("line");
        assert_eq!(second, "5V");
        assert!(!second.contains('\r'));
    }

    #[test]
    fn decode_is_lossy_on_bad_bytes() {
        let mut src = BytesMut::from(&b"1.0\xffV\r\n"[..]);
        let line = ScpiCodec.decode(&mut src).expect("decode").expect("line");
        assert!(line.starts_with("1.0"));
        assert!(line.ends_with('V'));
        assert!(line.contains('\u{FFFD}'));
    }

    #[test]
    fn decode_rejects_runaway_line() {
        let mut src = BytesMut::from(vec![b'9'; MAX_LINE_LEN + 1].as_slice());
        assert!(ScpiCodec.decode(&mut src).is_err());
    }

    #[test]
    fn decode_eof_returns_partial_line() {
        let mut src = BytesMut::from(&b"0.5A"[..]);
        assert_eq!(
            ScpiCodec.decode_eof(&mut src).expect("decode"),
            Some(String::from("0.5A"))
        );
        assert_eq!(ScpiCodec.decode_eof(&mut src).expect("decode"), None);
    }
}
