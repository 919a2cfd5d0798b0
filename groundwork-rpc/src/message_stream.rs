use log::trace;
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// A trait which can read one [serde::de::DeserializeOwned] frame from a stream
pub trait AsyncReadFrame<T: DeserializeOwned> {
    async fn read_frame(&mut self) -> crate::Result<T>;
}

/// A trait which can write one [serde::ser::Serialize] frame into a stream
pub trait AsyncWriteFrame<T: Serialize> {
    async fn write_frame(&mut self, frame: &T) -> crate::Result<()>;
}

impl<R, T> AsyncReadFrame<T> for R
where
    R: AsyncReadExt + Unpin,
    T: DeserializeOwned,
{
    async fn read_frame(&mut self) -> crate::Result<T> {
        // A BSON document starts with its own length, so the length prefix
        // is part of the frame
        let mut len_buf = [0u8; 4];

        self.read_exact(&mut len_buf)
            .await
            .map_err(|_| crate::Error::PeerDisconnected)?;

        let len = i32::from_le_bytes(len_buf);
        trace!("Incoming frame len: {len}");

        let mut data: Vec<u8> = len_buf.into();
        self.take((len - 4) as u64)
            .read_to_end(&mut data)
            .await
            .map_err(|_| crate::Error::PeerDisconnected)?;

        bson::from_slice(&data).map_err(|e| crate::Error::Internal(e.to_string()))
    }
}

impl<W, T> AsyncWriteFrame<T> for W
where
    W: AsyncWriteExt + Unpin,
    T: Serialize,
{
    async fn write_frame(&mut self, frame: &T) -> crate::Result<()> {
        let data = bson::to_vec(frame).map_err(|e| crate::Error::Internal(e.to_string()))?;

        self.write_all(&data)
            .await
            .map_err(|_| crate::Error::PeerDisconnected)
    }
}
