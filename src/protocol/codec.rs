//! Length-prefixed bincode frames.
//!
//! A frame is a big-endian `u32` byte count followed by the bincode encoding
//! of one value. Each connection carries exactly one request frame and one
//! response frame.

use anyhow::{Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let encoded = bincode::serialize(value)?;
    if encoded.len() > MAX_FRAME_LEN {
        bail!(
            "Frame of {} bytes exceeds limit of {} bytes",
            encoded.len(),
            MAX_FRAME_LEN
        );
    }

    writer.write_u32(encoded.len() as u32).await?;
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_frame<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = reader.read_u32().await? as usize;
    if len > MAX_FRAME_LEN {
        bail!("Incoming frame of {} bytes exceeds limit of {} bytes", len, MAX_FRAME_LEN);
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(bincode::deserialize(&buf)?)
}
