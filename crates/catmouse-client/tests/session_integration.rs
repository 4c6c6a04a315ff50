//! End-to-end session tests over the in-memory loopback bus.
//!
//! Each test drives a full [`SessionController::run`]: bus open, receiver
//! thread, input loop, shutdown, release.  Timings are shortened so the
//! suite stays fast.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use catmouse_client::application::{
    bus::{BusError, CanBus},
    console::{CapturedOutput, Console},
    session::{SessionController, SessionError, SessionTiming},
    stop_signal::StopReason,
};
use catmouse_client::infrastructure::{bus::LoopbackBus, keyboard::ScriptedKeys};
use catmouse_core::{encode, protocol::GAME_OVER_ID, CanFrame, Command, Role};

fn fast_timing() -> SessionTiming {
    SessionTiming {
        receive_timeout: Duration::from_millis(5),
        key_poll_timeout: Duration::from_millis(5),
        input_tick: Duration::from_millis(1),
        settle: Duration::ZERO,
        join_timeout: Duration::from_secs(1),
    }
}

fn controller(role: Role) -> (SessionController, CapturedOutput) {
    let (console, out) = Console::capture();
    let controller = SessionController::new(role, Default::default(), fast_timing(), console);
    (controller, out)
}

fn game_over() -> CanFrame {
    CanFrame::with_payload(GAME_OVER_ID, [0x01, 0, 0, 0, 0, 0, 0, 0])
}

// ── Operator-driven sessions ──────────────────────────────────────────────────

#[test]
fn test_cat_pressing_w_sends_up_frame() {
    // Arrange
    let bus = Arc::new(LoopbackBus::new());
    let (session, out) = controller(Role::Cat);
    let mut keys = ScriptedKeys::from_text("wq");

    // Act
    let report = session
        .run(|_| Ok(Arc::clone(&bus)), &mut keys)
        .unwrap();

    // Assert
    let sent = bus.sent_frames();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].id().as_raw(), 0x101);
    assert_eq!(sent[0].data(), &[0u8; 8]);
    let text = out.contents();
    assert!(text.contains("→ [Cat] UP"));
    assert!(text.contains("Quitting..."));
    assert!(text.contains("[Receiver] Thread stopped"));
    assert!(text.contains("Game Over! Thanks for playing as Cat!"));
    assert_eq!(report.stop_reason, Some(StopReason::Quit));
    assert_eq!(report.frames_sent, 1);
}

#[test]
fn test_mouse_pressing_d_sends_right_frame() {
    let bus = Arc::new(LoopbackBus::new());
    let (session, out) = controller(Role::Mouse);
    let mut keys = ScriptedKeys::from_text("dq");

    session.run(|_| Ok(Arc::clone(&bus)), &mut keys).unwrap();

    assert_eq!(bus.sent_frames(), vec![encode(Role::Mouse, Command::Right)]);
    assert_eq!(bus.sent_frames()[0].data(), &[3, 0, 0, 0, 0, 0, 0, 0]);
    assert!(out.contents().contains("→ [Mouse] RIGHT"));
}

#[test]
fn test_end_of_input_ends_session() {
    let bus = Arc::new(LoopbackBus::new());
    let (session, _out) = controller(Role::Cat);
    let mut keys = ScriptedKeys::from_text("s").then_close();

    let report = session.run(|_| Ok(Arc::clone(&bus)), &mut keys).unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::InputClosed));
    assert_eq!(bus.sent_frames(), vec![encode(Role::Cat, Command::Down)]);
}

// ── Controller-driven shutdown ────────────────────────────────────────────────

#[test]
fn test_game_over_frame_stops_idle_input_loop() {
    // Arrange – nobody presses a key; the controller ends the game
    let bus = Arc::new(LoopbackBus::new());
    bus.push_frame(game_over());
    let (session, out) = controller(Role::Mouse);
    let mut keys = ScriptedKeys::idle();

    // Act
    let report = session.run(|_| Ok(Arc::clone(&bus)), &mut keys).unwrap();

    // Assert
    assert_eq!(report.stop_reason, Some(StopReason::GameOver));
    assert!(report.receiver_joined);
    assert_eq!(bus.send_calls(), 0);
    assert_eq!(bus.shutdown_count(), 1);
    let text = out.contents();
    assert!(text.contains("!!! GAME OVER: CAT CATCHES MOUSE !!!"));
    assert!(!text.contains("Quitting..."));
}

#[test]
fn test_unrelated_traffic_and_errors_are_reported() {
    // Arrange
    let bus = Arc::new(LoopbackBus::new());
    bus.push_frame(CanFrame::new(GAME_OVER_ID, &[0x02]).unwrap());
    bus.push_error("bus-off");
    bus.push_frame(game_over());
    let (session, out) = controller(Role::Cat);
    let mut keys = ScriptedKeys::idle();

    // Act
    let report = session.run(|_| Ok(Arc::clone(&bus)), &mut keys).unwrap();

    // Assert
    assert_eq!(report.frames_received, 2);
    assert_eq!(report.receive_errors, 1);
    let text = out.contents();
    assert!(text.contains("← CAN RX - ID: 0x200, Data: [02]"));
    assert!(text.contains("[Receiver] Error: receive failed: bus-off"));
}

#[tokio::test]
async fn test_interrupt_signal_ends_session() {
    // Arrange
    let bus = Arc::new(LoopbackBus::new());
    let (session, out) = controller(Role::Cat);
    let stop = session.stop_signal();
    let session_bus = Arc::clone(&bus);

    // Act – the session blocks; the "signal" arrives from the async side
    let handle = tokio::task::spawn_blocking(move || {
        let mut keys = ScriptedKeys::idle();
        session.run(|_| Ok(session_bus), &mut keys)
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    stop.stop(StopReason::Interrupted);
    let report = handle.await.unwrap().unwrap();

    // Assert
    assert_eq!(report.stop_reason, Some(StopReason::Interrupted));
    assert!(out.contents().contains("Interrupted by user"));
    assert_eq!(bus.shutdown_count(), 1);
}

// ── Bus lifetime ──────────────────────────────────────────────────────────────

#[test]
fn test_open_failure_prints_troubleshooting_and_starts_nothing() {
    // Arrange
    let (session, out) = controller(Role::Cat);
    let mut keys = ScriptedKeys::from_text("wq");

    // Act
    let result = session.run(
        |cfg| -> Result<LoopbackBus, BusError> {
            Err(BusError::Open {
                interface: cfg.interface.clone(),
                reason: "No such device".to_string(),
            })
        },
        &mut keys,
    );

    // Assert
    assert!(matches!(result, Err(SessionError::Open(_))));
    assert_eq!(keys.polls(), 0, "input loop must not start");
    let text = out.contents();
    assert!(text.contains("failed to open CAN interface can0: No such device"));
    assert!(text.contains("Troubleshooting"));
    assert!(!text.contains("CAN Bus Game Controller"));
}

#[test]
fn test_bus_released_once_when_triggers_coincide() {
    // Arrange – game over and quit arrive together
    let bus = Arc::new(LoopbackBus::new());
    bus.push_frame(game_over());
    let (session, _out) = controller(Role::Cat);
    let mut keys = ScriptedKeys::from_text("q");

    // Act
    let report = session.run(|_| Ok(Arc::clone(&bus)), &mut keys).unwrap();

    // Assert – either trigger may win, the bus is shut down once
    assert!(matches!(
        report.stop_reason,
        Some(StopReason::GameOver) | Some(StopReason::Quit)
    ));
    assert_eq!(bus.shutdown_count(), 1);
}

#[test]
fn test_no_bus_operations_after_session_returns() {
    // Arrange
    let bus = Arc::new(LoopbackBus::new());
    let (session, _out) = controller(Role::Mouse);
    let mut keys = ScriptedKeys::from_text("wasdq");

    // Act
    let report = session.run(|_| Ok(Arc::clone(&bus)), &mut keys).unwrap();
    let sends = bus.send_calls();
    let receives = bus.receive_calls();
    thread::sleep(Duration::from_millis(50));

    // Assert
    assert!(report.receiver_joined);
    assert_eq!(report.frames_sent, 4);
    assert_eq!(bus.send_calls(), sends);
    assert_eq!(bus.receive_calls(), receives);
    assert!(matches!(
        bus.send(&encode(Role::Mouse, Command::Up)),
        Err(BusError::Closed)
    ));
}
