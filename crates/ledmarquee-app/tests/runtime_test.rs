//! Tick loop behavior on a virtual clock.

use std::{sync::Arc, time::Duration};

use ledmarquee_app::{Runtime, RuntimeCommand, RuntimeConfig, SharedSink, Side, Sink};
use ledmarquee_core::{
    BitDepth, DeviceSession, DialectChoice, Environment, PickedPort, PixelGrid, PortInfo,
    SessionConfig,
};
use ledmarquee_harness::{FakeDevice, FakeFirmware, RecordingSink, SimEnv};
use ledmarquee_proto::official;

fn shared(sink: impl Sink + 'static) -> SharedSink {
    Arc::new(sink)
}

fn text_raster() -> PixelGrid {
    PixelGrid::from_fn(17, 17, |r, c| if r == c { 1.0 } else { 0.0 })
}

#[tokio::test]
async fn attach_clears_then_ticks_draw_loaded_text() {
    let (mut runtime, _handle) = Runtime::new(SimEnv::new(), RuntimeConfig::default());
    let (left, right) = (RecordingSink::new(), RecordingSink::new());

    runtime
        .handle(RuntimeCommand::Attach { side: Side::Left, sinks: vec![shared(left.clone())] })
        .await;
    runtime
        .handle(RuntimeCommand::Attach { side: Side::Right, sinks: vec![shared(right.clone())] })
        .await;
    assert_eq!((left.count(), right.count()), (1, 1));
    assert_eq!(left.last().unwrap(), PixelGrid::module());

    runtime.handle(RuntimeCommand::Load(text_raster())).await;
    runtime.tick().await;

    // diagonal shifted right by the one-column margin
    let left_frame = left.last().unwrap();
    assert_eq!(left_frame.value(0, 1), 1.0);
    assert_eq!(left_frame.value(7, 8), 1.0);
    assert_eq!(right.last().unwrap().value(8, 0), 1.0);

    runtime.tick().await;
    assert_eq!((left.count(), right.count()), (2, 2));
}

#[tokio::test]
async fn swap_exchanges_devices() {
    let (mut runtime, _handle) = Runtime::new(SimEnv::new(), RuntimeConfig::default());
    let (a, b) = (RecordingSink::new(), RecordingSink::new());
    runtime.handle(RuntimeCommand::Attach { side: Side::Left, sinks: vec![shared(a.clone())] }).await;
    runtime.handle(RuntimeCommand::Attach { side: Side::Right, sinks: vec![shared(b.clone())] }).await;
    runtime.handle(RuntimeCommand::Load(text_raster())).await;
    runtime.tick().await;

    runtime.handle(RuntimeCommand::Swap).await;

    assert_eq!(b.last().unwrap().value(0, 1), 1.0);
    assert_eq!(a.last().unwrap().value(8, 0), 1.0);
}

#[tokio::test]
async fn run_stops_on_shutdown() {
    let env = SimEnv::new();
    let config = RuntimeConfig { tick: Duration::from_millis(50), ..RuntimeConfig::default() };
    let (runtime, handle) = Runtime::new(env.clone(), config);
    let sink = RecordingSink::new();

    assert!(handle.attach(Side::Left, shared(sink.clone())));
    assert!(handle.load(text_raster()));
    let task = tokio::spawn(runtime.run());

    while env.now() < Duration::from_millis(500) {
        tokio::task::yield_now().await;
    }
    assert!(handle.shutdown());
    task.await.unwrap();

    assert!(sink.count() >= 2);
    assert!(!handle.swap());
}

#[tokio::test]
async fn run_stops_when_handles_dropped() {
    let (runtime, handle) = Runtime::new(SimEnv::new(), RuntimeConfig::default());
    drop(handle);
    runtime.run().await;
}

#[tokio::test(start_paused = true)]
async fn ticks_reach_device_through_session() {
    let (mut runtime, _handle) = Runtime::new(SimEnv::new(), RuntimeConfig::default());
    let (host, device) = FakeDevice::spawn(FakeFirmware::official(0, 1, 9));
    let config = SessionConfig {
        dialect: DialectChoice::Official,
        bit_depth: BitDepth::Mono1,
        ..SessionConfig::default()
    };
    let session = DeviceSession::open(PickedPort::new(host, PortInfo::labelled("left")), &config)
        .await
        .unwrap();

    runtime
        .handle(RuntimeCommand::Attach { side: Side::Left, sinks: vec![shared(session)] })
        .await;
    runtime.handle(RuntimeCommand::Load(text_raster())).await;
    runtime.tick().await;
    device.wait_for(2).await;

    let frames = device.frames(official::Command::Draw.to_u8());
    assert_eq!(frames.len(), 2);
    let expected = runtime.canvas().left().snapshot();
    assert_eq!(frames[1], official::mono_draw(&expected).unwrap());
}
