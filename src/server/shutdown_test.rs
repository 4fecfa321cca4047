//! Tests for shutdown signalling

use super::shutdown::*;
use std::time::Duration;

/// Test that shutdown channel starts untriggered
#[tokio::test]
async fn test_shutdown_channel_initially_not_shutdown() {
    let (_controller, signal) = shutdown_channel();

    assert!(!signal.is_shutdown());
}

#[tokio::test]
async fn test_shutdown_channel_triggers_shutdown() {
    let (controller, signal) = shutdown_channel();

    controller.shutdown();

    assert!(signal.is_shutdown());
}

/// Test that the owned recv() future completes when shutdown is triggered
#[tokio::test]
async fn test_owned_recv_completes_on_signal() {
    let (controller, signal) = shutdown_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.shutdown();
    });

    let result = tokio::time::timeout(Duration::from_secs(1), signal.recv()).await;

    assert!(result.is_ok(), "recv() should complete when shutdown triggered");
}

/// Test that a dropped controller releases waiters without flagging shutdown
#[tokio::test]
async fn test_wait_completes_when_controller_dropped() {
    let (controller, mut signal) = shutdown_channel();
    drop(controller);

    let result = tokio::time::timeout(Duration::from_secs(1), signal.wait()).await;

    assert!(result.is_ok(), "dropped controller must not hang waiters");
    assert!(!signal.is_shutdown());
}

/// Test that cloned signals all observe shutdown
#[tokio::test]
async fn test_shutdown_signal_clones_share_state() {
    let (controller, signal) = shutdown_channel();
    let signal2 = signal.clone();

    controller.shutdown();

    assert!(signal.is_shutdown());
    assert!(signal2.is_shutdown());
}

#[tokio::test]
async fn test_shutdown_before_wait_returns_immediately() {
    let (controller, mut signal) = shutdown_channel();
    controller.shutdown();

    let result = tokio::time::timeout(Duration::from_millis(100), signal.wait()).await;

    assert!(result.is_ok());
}
