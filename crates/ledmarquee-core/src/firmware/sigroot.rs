use ledmarquee_proto::{PixelGrid, VersionInfo, sigroot};
use tokio::sync::OnceCell;

use super::{DRAW_KEY, Firmware};
use crate::{PortMutex, error::FirmwareError};

/// Sigroot community firmware (Dialect B).
///
/// Needs a one-time scale calibration before the first draw. Calibration is
/// retried on later draws until one succeeds, and never sent again after.
pub struct SigrootFirmware {
    port: PortMutex,
    scale: OnceCell<()>,
}

impl SigrootFirmware {
    /// Speak the sigroot dialect on `port`.
    pub fn new(port: PortMutex) -> Self {
        Self { port, scale: OnceCell::new() }
    }

    /// True once the scale calibration has been acknowledged.
    pub fn is_calibrated(&self) -> bool {
        self.scale.initialized()
    }

    async fn ident(&self) -> Option<Vec<u8>> {
        self.port
            .acquire(|p| async move {
                p.tx(&sigroot::ident_request()).await?;
                p.rx(sigroot::IDENT_LEN).await
            })
            .await
    }

    async fn calibrate(&self) -> Result<(), FirmwareError> {
        self.port
            .acquire(|p| async move {
                p.tx(&sigroot::set_const_scale(sigroot::CONST_SCALE)).await
            })
            .await
            .ok_or(FirmwareError::NoReply)
    }
}

impl Firmware for SigrootFirmware {
    async fn verify_firmware(&self) -> bool {
        self.ident().await.is_some_and(|reply| sigroot::is_ident_reply(&reply))
    }

    async fn version(&self) -> Result<VersionInfo, FirmwareError> {
        let reply = self.ident().await.ok_or(FirmwareError::NoReply)?;
        Ok(sigroot::parse_ident(&reply)?)
    }

    async fn draw(&self, grid: &PixelGrid) -> Result<(), FirmwareError> {
        let frame = sigroot::pwm_draw(grid)?;

        if self.scale.get_or_try_init(|| self.calibrate()).await.is_err() {
            tracing::warn!(port = %self.port.label(), "scale calibration failed, retrying on next draw");
        }

        self.port.acquire_idempotent(DRAW_KEY, move |p| async move { p.tx(&frame).await }).await;
        Ok(())
    }
}
