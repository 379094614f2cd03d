//! Tests for scripted session replays.

use std::io::Write;

use tempfile::NamedTempFile;

use caity_client::{
    PROFILE_NOT_FOUND_MESSAGE, PROFILE_UNAVAILABLE_MESSAGE, Phase, ReplayScript, ScreenId,
    final_screen, run_script,
};

const SESSION_SCRIPT: &str = r#"
build = "development"
starting_coins = 500

[[profiles]]
identity = "u1"
display_name = "Ana"
coins = 500

[[steps]]
signed_out = true

[[steps]]
auth = "u1"

[[steps]]
navigate = "rooms"

[[steps]]
select_room = "r7"

[[steps]]
back_to_menu = true

[[steps]]
update_coins = 650

[[steps]]
sign_out = true
"#;

/// Writes `content` to a temporary script file.
fn script_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write script");
    file
}

#[test]
fn test_replay_full_session_from_file() {
    let file = script_file(SESSION_SCRIPT);
    let script = ReplayScript::from_file(file.path()).expect("Parse failed");
    let report = run_script(&script).expect("Replay failed");

    let frames = report.frames();
    assert_eq!(frames.len(), 7);
    assert_eq!(*frames[0].snapshot().active_screen(), ScreenId::Login);
    assert_eq!(*frames[1].snapshot().active_screen(), ScreenId::Menu);
    assert_eq!(*frames[3].snapshot().active_screen(), ScreenId::Game);
    assert_eq!(
        frames[4].snapshot().selected_room_id().as_deref(),
        Some("r7")
    );
    assert_eq!(*frames[5].snapshot().coins(), 650);
    assert_eq!(frames[5].coin_saves().len(), 1);

    let last = &frames[6];
    assert_eq!(*last.sign_outs(), 1);
    assert_eq!(*last.snapshot().active_screen(), ScreenId::Login);
    assert!(last.snapshot().identity().is_none());
    assert_eq!(final_screen(&report), ScreenId::Login);
}

#[test]
fn test_replay_missing_profile_signs_out_once() {
    let script = ReplayScript::parse(
        r#"
[[steps]]
auth = "u2"

[[steps]]
run_diagnostic = true
"#,
    )
    .expect("Parse failed");
    let report = run_script(&script).expect("Replay failed");

    let first = &report.frames()[0];
    assert_eq!(*first.sign_outs(), 1);
    assert_eq!(
        first.snapshot().last_error().as_deref(),
        Some(PROFILE_NOT_FOUND_MESSAGE)
    );
    assert_eq!(*first.snapshot().phase(), Phase::Error);

    let second = &report.frames()[1];
    assert_eq!(*second.snapshot().active_screen(), ScreenId::Diagnostic);
    assert!(second.snapshot().last_error().is_none());
}

#[test]
fn test_replay_deferred_lookup_loses_to_newer_sign_in() {
    let script = ReplayScript::parse(
        r#"
[[profiles]]
identity = "slow"
coins = 1
defer = true

[[profiles]]
identity = "fast"
coins = 2

[[steps]]
auth = "slow"

[[steps]]
auth = "fast"

[[steps]]
resolve_lookups = true
"#,
    )
    .expect("Parse failed");
    let report = run_script(&script).expect("Replay failed");

    assert!(*report.frames()[0].snapshot().initializing());
    let last = report.last().expect("No frames");
    assert_eq!(*last.coins(), 2);
    assert_eq!(last.identity().as_ref().map(|i| i.as_str()), Some("fast"));
}

#[test]
fn test_replay_unavailable_profile_reports_error() {
    let script = ReplayScript::parse(
        r#"
[[profiles]]
identity = "u1"
unavailable = true

[[steps]]
auth = "u1"
"#,
    )
    .expect("Parse failed");
    let report = run_script(&script).expect("Replay failed");
    let last = report.last().expect("No frames");
    assert_eq!(last.last_error().as_deref(), Some(PROFILE_UNAVAILABLE_MESSAGE));
    assert_eq!(*report.frames()[0].sign_outs(), 0);
}

#[test]
fn test_replay_json_lines_one_per_step() {
    let script = ReplayScript::parse(SESSION_SCRIPT).expect("Parse failed");
    let report = run_script(&script).expect("Replay failed");
    let lines = report.to_json_lines().expect("Serialize failed");

    assert_eq!(lines.lines().count(), 7);
    let first: serde_json::Value =
        serde_json::from_str(lines.lines().next().expect("No lines")).expect("Invalid JSON");
    assert_eq!(first["snapshot"]["active_screen"], "login");
}

#[test]
fn test_step_with_two_actions_is_rejected() {
    let script = ReplayScript::parse(
        r#"
[[steps]]
auth = "u1"
back_to_menu = true
"#,
    )
    .expect("Parse failed");
    assert!(run_script(&script).is_err());
}

#[test]
fn test_empty_step_is_rejected() {
    let script = ReplayScript::parse("[[steps]]\n").expect("Parse failed");
    assert!(run_script(&script).is_err());
}

#[test]
fn test_unknown_step_key_fails_to_parse() {
    assert!(ReplayScript::parse("[[steps]]\nteleport = \"moon\"\n").is_err());
}

#[test]
fn test_empty_script_ends_on_login() {
    let script = ReplayScript::parse("").expect("Parse failed");
    let report = run_script(&script).expect("Replay failed");
    assert!(report.frames().is_empty());
    assert_eq!(final_screen(&report), ScreenId::Login);
}
