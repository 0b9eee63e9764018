//! Fixed-tick animation loop.
//!
//! The [`Runtime`] owns the canvas and the marquee. Each tick it samples the
//! marquee into the canvas and flushes whatever changed. Everything else
//! (new text, newly connected devices, swapping sides) arrives as a
//! [`RuntimeCommand`] through a [`RuntimeHandle`].

use std::{sync::Arc, time::Duration};

use ledmarquee_core::{Environment, PixelGrid};
use tokio::sync::mpsc;

use crate::{FrameBufferPair, MarqueeOptions, MarqueeText, SharedSink, Side};

/// Loop parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeConfig {
    /// Time between frames.
    pub tick: Duration,
    /// How text is fitted to the canvas.
    pub marquee: MarqueeOptions,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { tick: Duration::from_millis(50), marquee: MarqueeOptions::default() }
    }
}

/// Requests to a running loop.
pub enum RuntimeCommand {
    /// Show a new text raster.
    Load(PixelGrid),
    /// Replace one side's sinks and blank that side.
    Attach {
        /// Which half
        side: Side,
        /// Its new sinks
        sinks: Vec<SharedSink>,
    },
    /// Exchange the two sides' sinks.
    Swap,
    /// Stop the loop.
    Shutdown,
}

/// Sending side of a loop's command channel.
///
/// Cheap to clone. Sends never block; they fail only once the loop has
/// stopped.
#[derive(Clone)]
pub struct RuntimeHandle {
    commands: mpsc::UnboundedSender<RuntimeCommand>,
}

impl RuntimeHandle {
    /// Queue a command. Returns false if the loop has stopped.
    pub fn send(&self, command: RuntimeCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Show a new text raster.
    pub fn load(&self, raster: PixelGrid) -> bool {
        self.send(RuntimeCommand::Load(raster))
    }

    /// Show one side on `sink`.
    pub fn attach(&self, side: Side, sink: SharedSink) -> bool {
        self.send(RuntimeCommand::Attach { side, sinks: vec![sink] })
    }

    /// Exchange sides.
    pub fn swap(&self) -> bool {
        self.send(RuntimeCommand::Swap)
    }

    /// Stop the loop.
    pub fn shutdown(&self) -> bool {
        self.send(RuntimeCommand::Shutdown)
    }
}

/// Tick loop over one [`FrameBufferPair`].
///
/// # Type Parameters
///
/// - `E`: Environment providing the clock and tick sleeps
pub struct Runtime<E: Environment> {
    env: E,
    config: RuntimeConfig,
    canvas: Arc<FrameBufferPair>,
    marquee: MarqueeText<E>,
    commands: mpsc::UnboundedReceiver<RuntimeCommand>,
}

impl<E: Environment> Runtime<E> {
    /// Loop over a two-module canvas, plus the handle that drives it.
    pub fn new(env: E, config: RuntimeConfig) -> (Self, RuntimeHandle) {
        Self::with_canvas(env, config, FrameBufferPair::modules())
    }

    /// Loop over a caller-sized canvas.
    pub fn with_canvas(
        env: E,
        config: RuntimeConfig,
        canvas: FrameBufferPair,
    ) -> (Self, RuntimeHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let marquee = MarqueeText::new(env.clone(), config.marquee);
        let runtime =
            Self { env, config, canvas: Arc::new(canvas), marquee, commands: rx };
        (runtime, RuntimeHandle { commands: tx })
    }

    /// Shared view of the canvas.
    pub fn canvas(&self) -> Arc<FrameBufferPair> {
        Arc::clone(&self.canvas)
    }

    /// The marquee being animated.
    pub fn marquee(&self) -> &MarqueeText<E> {
        &self.marquee
    }

    /// Run until [`RuntimeCommand::Shutdown`] or until every handle is
    /// dropped.
    ///
    /// Commands are handled ahead of the next tick. A flush waits for its
    /// sinks, so a slow device stretches the tick rather than queueing frames
    /// behind it.
    pub async fn run(mut self) {
        tracing::info!(tick_ms = self.config.tick.as_millis() as u64, "runtime started");
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle(command).await {
                        break;
                    }
                },
                () = self.env.sleep(self.config.tick) => self.tick().await,
            }
        }
        tracing::info!("runtime stopped");
    }

    /// Apply one command. Returns false on shutdown.
    pub async fn handle(&mut self, command: RuntimeCommand) -> bool {
        match command {
            RuntimeCommand::Load(raster) => {
                self.marquee.load(&raster, self.canvas.rows());
            },
            RuntimeCommand::Attach { side, sinks } => {
                tracing::info!(%side, sinks = sinks.len(), "attaching");
                if let Err(e) = self.canvas.attach(side, sinks).await {
                    tracing::warn!(%side, error = %e, "initial clear failed");
                }
            },
            RuntimeCommand::Swap => {
                if let Err(e) = self.canvas.swap().await {
                    tracing::warn!(error = %e, "re-render after swap failed");
                }
            },
            RuntimeCommand::Shutdown => return false,
        }
        true
    }

    /// Sample the marquee into the canvas and flush.
    pub async fn tick(&mut self) {
        self.marquee.next_frame(self.canvas.as_ref());
        // Sink failures were already logged per sink.
        let _ = self.canvas.flush().await;
    }
}
