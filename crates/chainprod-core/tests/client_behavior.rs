//! End-to-end behavior of the chain production client against the mock
//! controller.
//!
//! Time-dependent tests run on a paused Tokio clock; sleeping advances it
//! deterministically.

use std::sync::Arc;
use std::time::Duration;

use chainprod_core::{
    ChainClient, ChainEvent, ClientConfig, Command, CommandName, CountdownState, DeviceStatus,
    EjectLabel, MockController, MockControllerBuilder, Notification, SwitchLabel, SyncOutcome,
};
use chainprod_types::CoolingTime;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::sleep;

fn client(mock: &Arc<MockController>) -> ChainClient {
    ChainClient::with_transport(ClientConfig::default(), mock.clone())
        .expect("default config is valid")
}

fn connected_idle() -> MockControllerBuilder {
    MockControllerBuilder::new()
        .connected(true)
        .ejecting(false)
        .fans_on(false)
        .leds_on(false)
}

// =============================================================================
// Derived view
// =============================================================================

#[tokio::test]
async fn test_closed_controller_hides_all_labels() {
    let mock = Arc::new(
        MockControllerBuilder::new()
            .connected(false)
            .ejecting(true)
            .fans_on(true)
            .leds_on(true)
            .build(),
    );
    let client = client(&mock);
    client.start().await.unwrap();

    let view = client.view();
    assert_eq!(view.eject.to_string(), "-");
    assert_eq!(view.fan.to_string(), "-");
    assert_eq!(view.led.to_string(), "-");
    assert_eq!(view.connection.to_string(), "Connect");
    assert!(!view.eject_enabled);
}

#[tokio::test]
async fn test_printer_busy_disables_eject() {
    let mock = Arc::new(connected_idle().build());
    let client = client(&mock);
    client.start().await.unwrap();
    assert!(client.view().eject_enabled);

    client.set_printer_busy(true);
    assert!(!client.view().eject_enabled);

    client.set_printer_busy(false);
    assert!(client.view().eject_enabled);
}

#[tokio::test(start_paused = true)]
async fn test_cooling_scenario() {
    let mock = Arc::new(
        MockControllerBuilder::new()
            .connected(true)
            .ejecting(true)
            .fans_on(true)
            .leds_on(false)
            .cooling_time_left(5)
            .build(),
    );
    let client = client(&mock);
    client.start().await.unwrap();

    let view = client.view();
    assert_eq!(view.eject, EjectLabel::Ejecting);
    assert_eq!(view.fan, SwitchLabel::On);
    assert_eq!(view.led, SwitchLabel::Off);
    assert_eq!(view.cooling_time, CoolingTime::Remaining(5));
    assert_eq!(client.countdown_state(), CountdownState::Running);

    // Seconds run out while the chain is still moving: still shown.
    sleep(Duration::from_millis(5500)).await;
    assert_eq!(client.seconds_remaining(), 0);
    assert_eq!(client.countdown_state(), CountdownState::Idle);
    assert_eq!(client.view().cooling_time, CoolingTime::Remaining(0));

    // Ejecting ends.
    mock.set_status(DeviceStatus {
        error_or_closed: Some(false),
        ejecting: Some(false),
        fans_on: Some(true),
        leds_on: Some(false),
        cooling_time_left: None,
    })
    .await;
    client.refresh().await.unwrap();
    assert_eq!(client.view().cooling_time, CoolingTime::Inactive);
    assert_eq!(client.view().cooling_time.to_string(), "-");
}

// =============================================================================
// Countdown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_restart_anchors_single_schedule() {
    let mock = Arc::new(MockController::new());
    let client = client(&mock);
    let countdown = client.countdown();

    countdown.restart(10);
    countdown.restart(3);
    assert_eq!(countdown.seconds_remaining(), 3);

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(countdown.seconds_remaining(), 2);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(countdown.seconds_remaining(), 1);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(countdown.seconds_remaining(), 0);
    assert_eq!(countdown.state(), CountdownState::Idle);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(countdown.seconds_remaining(), 0);
    assert!(!countdown.is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_resync_reanchors_countdown() {
    let mock = Arc::new(
        MockControllerBuilder::new()
            .connected(true)
            .ejecting(true)
            .cooling_time_left(60)
            .build(),
    );
    let client = client(&mock);
    client.start().await.unwrap();

    sleep(Duration::from_millis(10_500)).await;
    assert_eq!(client.seconds_remaining(), 50);

    // The controller's own clock is ahead of ours.
    mock.set_status(DeviceStatus {
        cooling_time_left: Some(45),
        ..mock.current_status().await
    })
    .await;
    client.refresh().await.unwrap();
    assert_eq!(client.seconds_remaining(), 45);

    sleep(Duration::from_millis(900)).await;
    assert_eq!(client.seconds_remaining(), 45);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(client.seconds_remaining(), 44);
}

#[tokio::test(start_paused = true)]
async fn test_eject_then_idle_refresh_leaves_nothing_armed() {
    let mock = Arc::new(connected_idle().simulate_effects(false).build());
    let client = client(&mock);
    client.start().await.unwrap();
    client.countdown().restart(20);

    client.dispatcher().eject().await.unwrap();

    assert_eq!(mock.last_command().await, Some(Command::eject()));
    assert!(!client.countdown().is_armed());
    assert_eq!(client.seconds_remaining(), 0);
    assert_eq!(client.countdown_state(), CountdownState::Idle);
}

// =============================================================================
// Commands
// =============================================================================

#[tokio::test]
async fn test_connect_toggle_follows_status() {
    let mock = Arc::new(MockControllerBuilder::new().connected(false).build());
    let client = client(&mock);
    client.start().await.unwrap();

    client.toggle_connection().await.unwrap();
    assert_eq!(
        mock.last_command().await.map(|c| c.name),
        Some(CommandName::Connect)
    );

    client.toggle_connection().await.unwrap();
    assert_eq!(
        mock.last_command().await.map(|c| c.name),
        Some(CommandName::Disconnect)
    );
}

#[tokio::test]
async fn test_set_fan_refreshes_exactly_once() {
    let mock = Arc::new(connected_idle().build());
    let client = client(&mock);
    client.start().await.unwrap();
    mock.reset_counts();

    let report = client.send(Command::set_fan(true)).await.unwrap();
    assert!(matches!(report.refresh, Ok(SyncOutcome::Applied(_))));
    assert_eq!(mock.command_count(), 1);
    assert_eq!(mock.fetch_count(), 1);
    assert_eq!(client.view().fan, SwitchLabel::On);
}

#[tokio::test]
async fn test_failed_set_fan_still_refreshes_once() {
    let mock = Arc::new(connected_idle().build());
    let client = client(&mock);
    client.start().await.unwrap();
    mock.reset_counts();
    mock.set_fail_commands(true, Some("serial port closed")).await;

    let err = client.send(Command::set_fan(true)).await.unwrap_err();
    assert_eq!(err.command, CommandName::SetFan);
    assert_eq!(mock.fetch_count(), 1);
    assert_eq!(client.view().fan, SwitchLabel::Off);
}

#[tokio::test]
async fn test_transient_command_failure_refreshes_once_per_send() {
    let mock = Arc::new(connected_idle().build());
    let client = client(&mock);
    client.start().await.unwrap();
    mock.reset_counts();
    mock.set_transient_command_failures(1);

    assert!(client.send(Command::set_led(true)).await.is_err());
    assert_eq!(mock.fetch_count(), 1);
    assert_eq!(client.view().led, SwitchLabel::Off);

    // No retry; the next send goes through.
    assert_eq!(mock.command_count(), 1);
    client.send(Command::set_led(true)).await.unwrap();
    assert_eq!(mock.command_count(), 2);
    assert_eq!(mock.fetch_count(), 2);
    assert_eq!(client.view().led, SwitchLabel::On);
}

#[tokio::test]
async fn test_view_follows_device_not_command() {
    let mock = Arc::new(connected_idle().build());
    let client = client(&mock);
    client.start().await.unwrap();

    // The controller acknowledges but does not start ejecting.
    mock.set_simulate_effects(false);
    client.dispatcher().eject().await.unwrap();

    assert_eq!(mock.last_command().await, Some(Command::eject()));
    assert_eq!(client.view().eject, EjectLabel::Idle);
    assert!(client.view().eject_enabled);
}

#[tokio::test]
async fn test_command_events() {
    let mock = Arc::new(connected_idle().build());
    let client = client(&mock);
    let mut rx = client.subscribe();

    client.dispatcher().set_led(true).await.unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        ChainEvent::CommandSent {
            command: CommandName::SetLed
        }
    );
    match rx.recv().await.unwrap() {
        ChainEvent::StatusUpdated { status, .. } => assert_eq!(status.leds_on, Some(true)),
        other => panic!("unexpected event: {:?}", other),
    }
}

// =============================================================================
// Synchronization
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_stale_response_does_not_overwrite_newer() {
    let mock = Arc::new(MockController::new());
    let slow = DeviceStatus {
        error_or_closed: Some(false),
        ejecting: Some(true),
        ..Default::default()
    };
    let fast = DeviceStatus {
        ejecting: Some(false),
        ..slow
    };
    mock.push_response(slow, Duration::from_millis(500));
    mock.push_response(fast, Duration::from_millis(50));
    let client = client(&mock);

    let (first, second) = tokio::join!(client.refresh(), client.refresh());
    assert!(first.unwrap().is_stale());
    assert_eq!(second.unwrap(), SyncOutcome::Applied(fast));
    assert_eq!(client.status(), fast);
    assert_eq!(client.view().eject, EjectLabel::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_failed_sync_keeps_last_good_state() {
    let mock = Arc::new(
        MockControllerBuilder::new()
            .connected(true)
            .ejecting(true)
            .cooling_time_left(30)
            .build(),
    );
    let client = client(&mock);
    client.start().await.unwrap();
    let before = client.snapshot();

    mock.set_fail_fetch(true, Some("connection refused")).await;
    assert!(client.refresh().await.is_err());
    assert_eq!(client.snapshot(), before);

    // The countdown keeps going.
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(client.seconds_remaining(), 28);

    // And the next trigger still works.
    mock.set_fail_fetch(false, None).await;
    assert!(client.refresh().await.is_ok());
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_notifications_filtered_by_identity() {
    let mock = Arc::new(connected_idle().build());
    let client = client(&mock);

    assert!(
        client
            .notify(&Notification::new("another_plugin", Value::Null))
            .await
            .is_none()
    );
    assert_eq!(mock.fetch_count(), 0);

    let result = client
        .notify(&Notification::new("prusa_chain_production", Value::Null))
        .await;
    assert!(matches!(result, Some(Ok(_))));
    assert_eq!(mock.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_poll_overtaken_by_notification_is_discarded() {
    let mock = Arc::new(connected_idle().build());
    let client = client(&mock);
    client.start().await.unwrap();
    mock.set_latency(Duration::from_millis(300));

    let cooling = DeviceStatus {
        ejecting: Some(true),
        cooling_time_left: Some(40),
        ..mock.current_status().await
    };
    let (poll, pushed) = tokio::join!(client.refresh(), async {
        // The poll is already waiting on the slow host.
        mock.set_latency(Duration::ZERO);
        mock.set_status(cooling).await;
        client
            .notify(&Notification::new("prusa_chain_production", Value::Null))
            .await
    });

    assert!(matches!(pushed, Some(Ok(SyncOutcome::Applied(_)))));
    assert_eq!(
        poll.unwrap(),
        SyncOutcome::Stale {
            seq: 2,
            applied_seq: 3
        }
    );
    assert_eq!(client.snapshot().seq, 3);
    assert_eq!(client.status(), cooling);
    assert_eq!(client.seconds_remaining(), 40);
}

#[tokio::test]
async fn test_listen_until_shutdown() {
    let mock = Arc::new(connected_idle().build());
    let client = client(&mock);
    let mut events = client.subscribe();
    let (tx, rx) = mpsc::channel(4);
    let task = client.listen(rx);

    let frame = serde_json::json!({
        "plugin": {"plugin": "prusa_chain_production", "data": {"changed": true}}
    });
    tx.send(Notification::from_push_frame(&frame).unwrap())
        .await
        .unwrap();

    // Wait until the notification was processed.
    loop {
        if let ChainEvent::StatusUpdated { .. } = events.recv().await.unwrap() {
            break;
        }
    }
    assert_eq!(mock.fetch_count(), 1);

    client.shutdown();
    task.await.unwrap();
}
