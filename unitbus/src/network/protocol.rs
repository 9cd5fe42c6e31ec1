//! Length-prefixed framing for the bus transport.
//!
//! # Wire Format
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ Frame Length (4 bytes, big-endian u32, excludes header)       │
//! ├───────────────────────────────────────────────────────────────┤
//! │ Protocol Version (1 byte, currently 0x01)                     │
//! ├───────────────────────────────────────────────────────────────┤
//! │ Frame Type (1 byte)                                           │
//! │   0x01 = Message (JSON wire envelope)                         │
//! │   0x02 = Heartbeat (empty payload)                            │
//! ├───────────────────────────────────────────────────────────────┤
//! │ Payload (remaining bytes)                                     │
//! └───────────────────────────────────────────────────────────────┘
//! ```

/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::message::MessageError;

/// Protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Frame header size: 4 bytes length + 1 byte version + 1 byte type.
pub const HEADER_SIZE: usize = 6;

/// Maximum frame size (16 MiB hard limit).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Kind of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// A serialized message.
    Message,
    /// Keep-alive with an empty payload.
    Heartbeat,
}

impl FrameType {
    /// Frame type byte for messages.
    pub const MESSAGE_BYTE: u8 = 0x01;
    /// Frame type byte for heartbeats.
    pub const HEARTBEAT_BYTE: u8 = 0x02;

    /// Convert frame type to wire byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Message => Self::MESSAGE_BYTE,
            Self::Heartbeat => Self::HEARTBEAT_BYTE,
        }
    }

    /// Parse frame type from wire byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            Self::MESSAGE_BYTE => Some(Self::Message),
            Self::HEARTBEAT_BYTE => Some(Self::Heartbeat),
            _ => None,
        }
    }
}

/// Read a complete frame from the stream.
///
/// Returns `Ok(None)` when the peer closed the connection before a new header.
///
/// # Errors
///
/// [`MessageError::Network`] for I/O failures, unknown versions or frame types, and
/// frames larger than `max_size` or [`MAX_FRAME_SIZE`].
pub async fn read_frame<R>(reader: &mut R, max_size: usize) -> Result<Option<(FrameType, Vec<u8>)>, MessageError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_SIZE];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let version = header[4];
    let type_byte = header[5];

    if version != PROTOCOL_VERSION {
        return Err(MessageError::Network(format!(
            "Unsupported protocol version: {version}, expected {PROTOCOL_VERSION}"
        )));
    }
    let frame_type = FrameType::from_byte(type_byte)
        .ok_or_else(|| MessageError::Network(format!("Unknown frame type: {type_byte:#04x}")))?;
    if length > max_size.min(MAX_FRAME_SIZE) {
        return Err(MessageError::Network(format!(
            "Frame size {length} exceeds maximum {}",
            max_size.min(MAX_FRAME_SIZE)
        )));
    }

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await?;
    Ok(Some((frame_type, payload)))
}

/// Write a frame to the stream.
///
/// # Errors
///
/// [`MessageError::Network`] for I/O failures or payloads that do not fit a `u32`
/// length.
pub async fn write_frame<W>(writer: &mut W, frame_type: FrameType, payload: &[u8]) -> Result<(), MessageError>
where
    W: AsyncWrite + Unpin,
{
    let length: u32 = payload
        .len()
        .try_into()
        .map_err(|_| MessageError::Network("Payload too large for u32".to_string()))?;

    let mut header = [0u8; HEADER_SIZE];
    header[..4].copy_from_slice(&length.to_be_bytes());
    header[4] = PROTOCOL_VERSION;
    header[5] = frame_type.to_byte();

    writer.write_all(&header).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Write a heartbeat frame to the stream.
///
/// # Errors
///
/// [`MessageError::Network`] for I/O failures.
pub async fn write_heartbeat<W>(writer: &mut W) -> Result<(), MessageError>
where
    W: AsyncWrite + Unpin,
{
    write_frame(writer, FrameType::Heartbeat, &[]).await
}
