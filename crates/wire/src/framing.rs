// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wire framing.
//!
//! Frames are encoded as the ASCII decimal byte length of the XML payload
//! immediately followed — no delimiter — by exactly that many bytes of
//! UTF-8 XML. The payload's first byte is always `<`, which is how the
//! decoder knows the length digits have ended.

use std::io::{Read, Write};

use crate::{Request, Response, Result, WireError};

/// Upper bound on a declared frame length. A frame this size is not a
/// message the engine would ever send; treat it as a corrupt stream
/// instead of allocating unbounded memory.
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Read one raw XML payload from the stream.
///
/// Returns `Ok(None)` on a clean end of stream (no bytes before EOF).
/// A frame shorter than its declared length is decoded anyway: the
/// engine's legacy peer behaves this way, so the mismatch is logged and
/// whatever arrived is passed along.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<String>> {
    let mut digits = String::new();
    let mut byte = [0u8; 1];
    loop {
        let n = reader.read(&mut byte)?;
        if n == 0 {
            if digits.is_empty() {
                return Ok(None);
            }
            return Err(WireError::Frame(
                "stream ended inside frame header".to_string(),
            ));
        }
        if byte[0] == b'<' {
            break;
        }
        digits.push(byte[0] as char);
    }

    if digits.is_empty() {
        return Err(WireError::Frame("missing frame length".to_string()));
    }
    let declared: usize = digits
        .trim()
        .parse()
        .map_err(|_| WireError::Frame(format!("invalid frame length: '{}'", digits)))?;
    if declared == 0 || declared > MAX_FRAME_SIZE {
        return Err(WireError::Frame(format!(
            "unreasonable frame length: {}",
            declared
        )));
    }

    let mut payload = vec![0u8; declared];
    payload[0] = b'<';
    let mut filled = 1;
    while filled < declared {
        let n = reader.read(&mut payload[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled != declared {
        tracing::error!(
            "expected message of size {} but received {}",
            declared,
            filled
        );
        payload.truncate(filled);
    }

    let xml = String::from_utf8(payload)
        .map_err(|e| WireError::Frame(format!("payload is not UTF-8: {}", e)))?;
    Ok(Some(xml))
}

/// Read one request from the stream. `Ok(None)` means end of stream.
pub fn read_request<R: Read>(reader: &mut R) -> Result<Option<Request>> {
    match read_frame(reader)? {
        Some(xml) => Ok(Some(Request::parse(&xml)?)),
        None => Ok(None),
    }
}

/// Read one response from the stream. `Ok(None)` means end of stream.
/// Used by the engine side of the protocol and by tests.
pub fn read_response<R: Read>(reader: &mut R) -> Result<Option<Response>> {
    match read_frame(reader)? {
        Some(xml) => Ok(Some(Response::parse(&xml)?)),
        None => Ok(None),
    }
}

fn write_frame<W: Write>(writer: &mut W, xml: &str) -> Result<()> {
    writer.write_all(xml.len().to_string().as_bytes())?;
    writer.write_all(xml.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Write a response to the stream.
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    write_frame(writer, &response.to_xml())
}

/// Write a request to the stream. Used by the engine side and by tests.
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    write_frame(writer, &request.to_xml())
}
