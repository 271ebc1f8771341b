//! Tests for control-payload parsing and selection updates.

use super::ControlChannel;
use crate::selection::{AlgorithmId, SelectionHandle};

fn channel() -> (ControlChannel, SelectionHandle) {
    let selection = SelectionHandle::new(AlgorithmId::LossBased);
    (ControlChannel::new(selection.clone()), selection)
}

#[test]
fn test_submit_selects_named_algorithm() {
    let (channel, selection) = channel();

    assert_eq!(channel.submit(b"1").unwrap(), AlgorithmId::RateBased);
    assert_eq!(selection.load(), AlgorithmId::RateBased);

    assert_eq!(channel.submit(b"2").unwrap(), AlgorithmId::RttScaling);
    assert_eq!(selection.load(), AlgorithmId::RttScaling);

    assert_eq!(channel.submit(b"0").unwrap(), AlgorithmId::LossBased);
    assert_eq!(selection.load(), AlgorithmId::LossBased);
}

#[test]
fn test_submit_is_idempotent() {
    let (channel, selection) = channel();

    channel.submit(b"1").unwrap();
    let after_first = selection.raw();
    channel.submit(b"1").unwrap();

    assert_eq!(selection.raw(), after_first);
    assert_eq!(selection.load(), AlgorithmId::RateBased);
}

#[test]
fn test_submit_tolerates_surrounding_whitespace() {
    let (channel, selection) = channel();

    assert_eq!(channel.submit(b" 2\n").unwrap(), AlgorithmId::RttScaling);
    assert_eq!(selection.load(), AlgorithmId::RttScaling);
}

#[test]
fn test_unknown_identifier_is_stored_and_aliases() {
    let (channel, selection) = channel();

    assert_eq!(channel.submit(b"7").unwrap(), AlgorithmId::LossBased);
    assert_eq!(selection.raw(), 7);
    assert_eq!(selection.load(), AlgorithmId::LossBased);
}

#[test]
fn test_negative_identifier_aliases_to_fallback() {
    let (channel, selection) = channel();

    assert_eq!(channel.submit(b"-3").unwrap(), AlgorithmId::LossBased);
    assert_eq!(selection.load(), AlgorithmId::LossBased);
}

#[test]
fn test_malformed_payload_keeps_previous_selection() {
    let (channel, selection) = channel();
    channel.submit(b"1").unwrap();

    assert!(channel.submit(b"abc").is_err());
    assert_eq!(selection.load(), AlgorithmId::RateBased);
    assert_eq!(selection.raw(), 1);
}

#[test]
fn test_empty_and_non_utf8_payloads_are_rejected() {
    let (channel, selection) = channel();

    assert!(channel.submit(b"").is_err());
    assert!(channel.submit(&[0xff, 0xfe, 0x80]).is_err());
    assert_eq!(selection.load(), AlgorithmId::LossBased);
}
