//! Wire-format snapshots for both dialects.
//!
//! Any change here alters what is sent to the wheel.

use fffb_hid_common::Report;
use fffb_hid_logitech_protocol as lg;
use insta::assert_snapshot;
use lg::classic;
use lg::hidpp::{Framing, PingAttempt, build_request, effects};
use lg::ids::{ff_functions, product_ids, slots};

fn hex(report: &Report) -> String {
    format!("{:02X?}", report.as_bytes())
}

// ── Classic downloads ────────────────────────────────────────────────────────

#[test]
fn test_snapshot_classic_constant() {
    let report = classic::download_report(&lg::Force::constant(200));
    assert_snapshot!(hex(&report), @"[10, 00, C8, C8, C8, C8, 00, 00]");
}

#[test]
fn test_snapshot_classic_spring_default() {
    let report = classic::download_report(&lg::Force::spring(lg::SpringParams::default()));
    assert_snapshot!(hex(&report), @"[30, 01, 7F, 80, 33, 00, 00, 00]");
}

#[test]
fn test_snapshot_classic_spring_masks_fields() {
    let spring = lg::SpringParams {
        dead_start: 0x70,
        dead_end: 0x90,
        slope_left: 0xFF,
        slope_right: 0x02,
        invert_left: 0x03,
        invert_right: 0x00,
        amplitude: 0x40,
    };
    let report = classic::download_report(&lg::Force::spring(spring));
    assert_snapshot!(hex(&report), @"[30, 01, 70, 90, 27, 01, 40, 00]");
}

#[test]
fn test_snapshot_classic_damper_default() {
    let report = classic::download_report(&lg::Force::damper(lg::DamperParams::default()));
    assert_snapshot!(hex(&report), @"[40, 02, 00, 00, 00, 00, 00, 00]");
}

#[test]
fn test_snapshot_classic_trapezoid_default() {
    let report = classic::download_report(&lg::Force::trapezoid(lg::TrapezoidParams::default()));
    assert_snapshot!(hex(&report), @"[80, 06, 7F, 80, 00, 00, 00, 00]");
}

#[test]
fn test_snapshot_classic_refresh_constant() {
    let report = classic::refresh_report(&lg::Force::constant(200));
    assert_snapshot!(hex(&report), @"[1C, 00, C8, C8, C8, C8, 00, 00]");
}

// ── Classic control reports ──────────────────────────────────────────────────

#[test]
fn test_snapshot_classic_play_stop() {
    let play = classic::play_report(slots::CONSTANT | slots::DAMPER);
    let stop = classic::stop_report(slots::ALL);
    assert_snapshot!(hex(&play), @"[52, 00, 00, 00, 00, 00, 00, 00]");
    assert_snapshot!(hex(&stop), @"[F3, 00, 00, 00, 00, 00, 00, 00]");
}

#[test]
fn test_snapshot_classic_autocenter() {
    let on = classic::enable_autocenter_report(slots::ALL);
    let off = classic::disable_autocenter_report(slots::ALL);
    let set = classic::set_autocenter_report(&lg::SpringParams::default());
    assert_snapshot!(hex(&on), @"[F4, 00, 00, 00, 00, 00, 00, 00]");
    assert_snapshot!(hex(&off), @"[F5, 00, 00, 00, 00, 00, 00, 00]");
    assert_snapshot!(hex(&set), @"[FE, 00, 07, 07, 00, 00, 00, 00]");
}

#[test]
fn test_snapshot_classic_extended_commands() {
    let leds = classic::led_pattern_report(0xFF);
    let range = classic::set_range_report(900);
    assert_snapshot!(hex(&leds), @"[F8, 12, 1F, 00, 00, 00, 00, 00]");
    assert_snapshot!(hex(&range), @"[F8, 81, 84, 03, 00, 00, 00, 00]");
}

#[test]
fn test_snapshot_classic_mode_switch() {
    let sequence = classic::init_sequence(product_ids::G29_PS);
    let encoded: Vec<String> = sequence.iter().map(hex).collect();
    assert_snapshot!(encoded.join("\n"), @"[30, F8, 09, 05, 01, 00, 00, 00]");
    assert!(classic::init_sequence(product_ids::G27).is_empty());
}

// ── HID++ requests ───────────────────────────────────────────────────────────

#[test]
fn test_snapshot_hidpp_ping_short_repeated() -> Result<(), Box<dyn std::error::Error>> {
    let attempt = PingAttempt {
        device_index: 0xFF,
        framing: Framing::for_tier(0x10, true),
    };
    let report = attempt.request(0x0E, 0xAA)?;
    assert_snapshot!(hex(&report), @"[10, FF, 00, 1E, 00, 00, AA]");
    Ok(())
}

#[test]
fn test_snapshot_hidpp_get_feature_long_bare() -> Result<(), Box<dyn std::error::Error>> {
    let framing = Framing::for_tier(0x11, false);
    let report = build_request(&framing, 0x03, 0x00, 0x0E, &[0x81, 0x23, 0x00])?;
    assert_snapshot!(
        hex(&report),
        @"[03, 00, 0E, 81, 23, 00, 00, 00, 00, 00, 00, 00, 00, 00, 00, 00, 00, 00, 00]"
    );
    Ok(())
}

#[test]
fn test_snapshot_hidpp_download_constant() -> Result<(), Box<dyn std::error::Error>> {
    let params = effects::force_download_params(0, &lg::Force::constant(200))?;
    let framing = Framing::for_tier(0x11, false);
    let report = build_request(&framing, 0x03, 0x0B, ff_functions::DOWNLOAD_EFFECT, &params)?;
    assert_snapshot!(
        hex(&report),
        @"[03, 0B, 21, 00, 80, 00, 00, 00, 00, 48, 90, 00, 00, 00, 00, 00, 00, 00, 00]"
    );
    Ok(())
}

#[test]
fn test_snapshot_hidpp_autocenter_params() {
    let params = effects::autocenter_params(0x01, lg::ids::BASELINE_AUTOCENTER);
    assert_snapshot!(
        format!("{params:02X?}"),
        @"[01, 86, 00, 00, 00, 00, 06, 00, 01, 80, 00, 00, 00, 00, 01, 80, 06, 00]"
    );
}
