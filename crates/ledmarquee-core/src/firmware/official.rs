use ledmarquee_proto::{
    PixelGrid, VersionInfo, official,
    official::{BitDepth, VersionReply},
};

use super::{DRAW_KEY, Firmware};
use crate::{
    PortMutex,
    error::{FirmwareError, PortError},
};

/// Vendor firmware (Dialect A).
///
/// Stateless request/response. The draw path is fixed by `bit_depth` at
/// construction.
pub struct OfficialFirmware {
    port: PortMutex,
    bit_depth: BitDepth,
}

impl OfficialFirmware {
    /// Speak the official dialect on `port`.
    pub fn new(port: PortMutex, bit_depth: BitDepth) -> Self {
        Self { port, bit_depth }
    }

    /// Configured draw path.
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    async fn query_version(&self) -> Option<Vec<u8>> {
        self.port
            .acquire(|p| async move {
                p.tx(&official::version_request()).await?;
                p.rx(official::REPLY_SIZE).await
            })
            .await
    }
}

impl Firmware for OfficialFirmware {
    async fn verify_firmware(&self) -> bool {
        self.query_version().await.is_some_and(|reply| official::is_version_reply(&reply))
    }

    async fn version(&self) -> Result<VersionInfo, FirmwareError> {
        let reply = self.query_version().await.ok_or(FirmwareError::NoReply)?;
        Ok(VersionReply::from_bytes(&reply)?.version())
    }

    async fn draw(&self, grid: &PixelGrid) -> Result<(), FirmwareError> {
        match self.bit_depth {
            BitDepth::Gray8 => {
                let frames = official::grey_draw(grid)?;

                // A newer frame replaces this one even if it was fully staged
                // but never committed.
                self.port
                    .acquire_idempotent(DRAW_KEY, move |p| async move {
                        for frame in &frames {
                            p.tx(frame).await?;
                        }
                        Ok::<(), PortError>(())
                    })
                    .await;
            },
            BitDepth::Mono1 => {
                let frame = official::mono_draw(grid)?;
                self.port
                    .acquire_idempotent(DRAW_KEY, move |p| async move { p.tx(&frame).await })
                    .await;
            },
        }
        Ok(())
    }
}
