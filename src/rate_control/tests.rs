//! Tests for the shared rate-control math.

use super::{cwnd_reduction, may_raise_cwnd, update_pacing_rate};
use crate::config::{Config, PacingConfig};
use crate::state::{AckFlags, ConnectionState, RecoveryState};

fn test_conn() -> ConnectionState {
    ConnectionState::new(&Config::default())
}

fn recovery_conn() -> ConnectionState {
    let mut conn = test_conn();
    conn.recovery_state = RecoveryState::Recovery;
    conn.ssthresh = 20;
    conn.prior_cwnd = 20;
    conn.prr_delivered = 0;
    conn.prr_out = 0;
    conn
}

#[test]
fn test_reduction_above_ssthresh_is_proportional() {
    let mut conn = recovery_conn();
    conn.packets_in_flight = 25; // delta = -5

    cwnd_reduction(&mut conn, 4, &AckFlags::default());

    // sndcnt = (20 * 4 + 19) / 20 - 0 = 4, floored at 1 on round entry.
    assert_eq!(conn.prr_delivered, 4);
    assert_eq!(conn.cwnd, 29);
}

#[test]
fn test_reduction_retrans_recovery_ack_climbs_faster() {
    let mut conn = recovery_conn();
    conn.packets_in_flight = 15; // delta = 5
    conn.prr_delivered = 6;
    conn.prr_out = 3;

    let flags = AckFlags {
        retrans_data_acked: true,
        ..Default::default()
    };
    cwnd_reduction(&mut conn, 2, &flags);

    // prr_delivered becomes 8; sndcnt = min(5, max(8 - 3, 2) + 1) = 5.
    assert_eq!(conn.cwnd, 20);
}

#[test]
fn test_reduction_with_further_loss_stays_conservative() {
    let mut conn = recovery_conn();
    conn.packets_in_flight = 15; // delta = 5
    conn.prr_out = 3;

    let flags = AckFlags {
        retrans_data_acked: true,
        lost_retrans: true,
        ..Default::default()
    };
    cwnd_reduction(&mut conn, 2, &flags);

    // The retrans ack is disqualified by the new loss: sndcnt = min(5, 2).
    assert_eq!(conn.cwnd, 17);
}

#[test]
fn test_reduction_forces_probe_on_round_entry() {
    let mut conn = recovery_conn();
    conn.packets_in_flight = 40; // delta = -20
    conn.prior_cwnd = 40;

    cwnd_reduction(&mut conn, 1, &AckFlags::default());

    // sndcnt = (20 * 1 + 39) / 40 - 0 = 1; already >= the entry floor.
    assert_eq!(conn.cwnd, 41);

    // With prr_out ahead of deliveries the raw count would go negative;
    // after the first round the floor is 0, not 1.
    let mut conn = recovery_conn();
    conn.packets_in_flight = 40;
    conn.prior_cwnd = 40;
    conn.prr_out = 5;
    cwnd_reduction(&mut conn, 1, &AckFlags::default());
    assert_eq!(conn.cwnd, 40);
}

#[test]
fn test_reduction_noop_without_newly_acked() {
    let mut conn = recovery_conn();
    conn.packets_in_flight = 25;
    conn.cwnd = 25;

    cwnd_reduction(&mut conn, 0, &AckFlags::default());

    assert_eq!(conn.cwnd, 25);
    assert_eq!(conn.prr_delivered, 0);
    assert_eq!(conn.prr_out, 0);
}

#[test]
fn test_reduction_noop_without_recovery_snapshot() {
    let mut conn = recovery_conn();
    conn.packets_in_flight = 25;
    conn.cwnd = 25;
    conn.prior_cwnd = 0;

    cwnd_reduction(&mut conn, 4, &AckFlags::default());

    assert_eq!(conn.cwnd, 25);
    assert_eq!(conn.prr_delivered, 0);
}

#[test]
fn test_pacing_rate_congestion_avoidance_fixture() {
    let mut conn = test_conn();
    conn.mss = 1460;
    conn.cwnd = 10;
    conn.ssthresh = 20;
    conn.srtt_us = 50_000;
    conn.packets_out = 0;

    // cwnd(10) < ssthresh/2(10) is false, so the CA ratio applies:
    // 1460 * 80_000 * 120 * 10 / 50_000 = 2_803_200 bytes/sec.
    update_pacing_rate(&conn, &PacingConfig::default());
    assert_eq!(conn.pacing_rate(), 2_803_200);
}

#[test]
fn test_pacing_rate_slow_start_doubles() {
    let mut conn = test_conn();
    conn.mss = 1460;
    conn.cwnd = 5;
    conn.ssthresh = 20;
    conn.srtt_us = 50_000;

    // cwnd(5) < ssthresh/2(10): slow-start ratio.
    // 1460 * 80_000 * 200 * 5 / 50_000 = 2_336_000 bytes/sec.
    update_pacing_rate(&conn, &PacingConfig::default());
    assert_eq!(conn.pacing_rate(), 2_336_000);
}

#[test]
fn test_pacing_rate_uses_packets_out_when_larger() {
    let mut conn = test_conn();
    conn.mss = 1460;
    conn.cwnd = 10;
    conn.ssthresh = 20;
    conn.srtt_us = 50_000;
    conn.packets_out = 40;

    update_pacing_rate(&conn, &PacingConfig::default());
    assert_eq!(conn.pacing_rate(), 4 * 2_803_200);
}

#[test]
fn test_pacing_rate_skips_division_without_rtt() {
    let mut conn = test_conn();
    conn.mss = 1460;
    conn.cwnd = 10;
    conn.ssthresh = 20;
    conn.srtt_us = 0;

    update_pacing_rate(&conn, &PacingConfig::default());
    assert_eq!(conn.pacing_rate(), 1460 * 80_000 * 120 * 10);
}

#[test]
fn test_pacing_rate_clamped_to_max() {
    let mut conn = test_conn();
    conn.mss = 1460;
    conn.cwnd = 10;
    conn.ssthresh = 20;
    conn.srtt_us = 50_000;
    conn.max_pacing_rate = 1_000_000;

    update_pacing_rate(&conn, &PacingConfig::default());
    assert_eq!(conn.pacing_rate(), 1_000_000);
}

#[test]
fn test_raise_eligibility_in_order_by_default() {
    let conn = test_conn();

    let in_order = AckFlags {
        data_acked: true,
        forward_progress: true,
        ..Default::default()
    };
    let sacked_only = AckFlags {
        forward_progress: true,
        ..Default::default()
    };

    assert!(may_raise_cwnd(&conn, &in_order, 3));
    assert!(!may_raise_cwnd(&conn, &sacked_only, 3));
}

#[test]
fn test_raise_eligibility_relaxed_under_heavy_reordering() {
    let mut conn = test_conn();
    conn.reordering = 10;

    let sacked_only = AckFlags {
        forward_progress: true,
        ..Default::default()
    };
    let no_progress = AckFlags {
        data_acked: true,
        ..Default::default()
    };

    assert!(may_raise_cwnd(&conn, &sacked_only, 3));
    assert!(!may_raise_cwnd(&conn, &no_progress, 3));
}
