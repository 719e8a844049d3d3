//! RESP (REdis Serialization Protocol) framing.

use std::io;

/// Largest bulk string a server may send (Redis' `proto-max-bulk-len`).
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum RedisError {
    #[error("Redis I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Redis protocol error: {0}")]
    Protocol(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Invalid Redis URL: {0}")]
    InvalidUrl(String),

    #[error("Redis operation timed out")]
    Timeout,

    #[error("Redis connection closed")]
    ConnectionClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    /// `None` is the null bulk string (`$-1`).
    BulkString(Option<Vec<u8>>),
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    /// A command is an array of bulk strings.
    pub fn command(args: &[&[u8]]) -> Self {
        Self::Array(Some(
            args.iter()
                .map(|arg| Self::BulkString(Some(arg.to_vec())))
                .collect(),
        ))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf);
        buf
    }

    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Self::SimpleString(s) => {
                buf.push(b'+');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            Self::Error(e) => {
                buf.push(b'-');
                buf.extend_from_slice(e.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            Self::Integer(i) => {
                buf.push(b':');
                buf.extend_from_slice(i.to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            Self::BulkString(Some(data)) => {
                buf.push(b'$');
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                buf.extend_from_slice(data);
                buf.extend_from_slice(b"\r\n");
            }
            Self::BulkString(None) => buf.extend_from_slice(b"$-1\r\n"),
            Self::Array(Some(items)) => {
                buf.push(b'*');
                buf.extend_from_slice(items.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                for item in items {
                    item.encode_into(buf);
                }
            }
            Self::Array(None) => buf.extend_from_slice(b"*-1\r\n"),
        }
    }

    /// Decodes one value from the front of `buf`.
    ///
    /// `Ok(None)` means the frame is incomplete and more bytes are needed;
    /// otherwise the value is returned with the number of bytes it used.
    pub fn parse(buf: &[u8]) -> Result<Option<(RespValue, usize)>, RedisError> {
        let Some(line_end) = find_crlf(buf) else {
            return Ok(None);
        };
        if line_end == 0 {
            return Err(RedisError::Protocol("empty frame".to_string()));
        }
        let line = &buf[1..line_end];
        let after_line = line_end + 2;

        match buf[0] {
            b'+' => Ok(Some((Self::SimpleString(utf8(line)?), after_line))),
            b'-' => Ok(Some((Self::Error(utf8(line)?), after_line))),
            b':' => Ok(Some((Self::Integer(integer(line)?), after_line))),
            b'$' => {
                let len = integer(line)?;
                if len < 0 {
                    return Ok(Some((Self::BulkString(None), after_line)));
                }
                let len = usize::try_from(len)
                    .ok()
                    .filter(|len| *len <= MAX_BULK_LEN)
                    .ok_or_else(|| {
                        RedisError::Protocol(format!("bulk length {} out of range", len))
                    })?;
                let end = after_line
                    .checked_add(len)
                    .filter(|end| end.checked_add(2).is_some())
                    .ok_or_else(|| RedisError::Protocol("bulk length overflow".to_string()))?;
                if buf.len() < end + 2 {
                    return Ok(None);
                }
                if &buf[end..end + 2] != b"\r\n" {
                    return Err(RedisError::Protocol(
                        "bulk string not terminated by CRLF".to_string(),
                    ));
                }
                Ok(Some((
                    Self::BulkString(Some(buf[after_line..end].to_vec())),
                    end + 2,
                )))
            }
            b'*' => {
                let count = integer(line)?;
                if count < 0 {
                    return Ok(Some((Self::Array(None), after_line)));
                }
                let mut items = Vec::with_capacity(count.min(64) as usize);
                let mut pos = after_line;
                for _ in 0..count {
                    match Self::parse(&buf[pos..])? {
                        Some((item, used)) => {
                            items.push(item);
                            pos += used;
                        }
                        None => return Ok(None),
                    }
                }
                Ok(Some((Self::Array(Some(items)), pos)))
            }
            other => Err(RedisError::Protocol(format!(
                "unexpected type byte 0x{:02x}",
                other
            ))),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::BulkString(Some(b)) => Some(b),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::SimpleString(s) if s == "OK")
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::BulkString(None) | Self::Array(None))
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn utf8(bytes: &[u8]) -> Result<String, RedisError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| RedisError::Protocol("non UTF-8 status line".to_string()))
}

fn integer(bytes: &[u8]) -> Result<i64, RedisError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| RedisError::Protocol("invalid integer".to_string()))
}
