use std::fs;

use enumset::EnumSet;
use tempfile::tempdir;
use wifi_connman::{
    profiles::ProfileStore,
    types::{KeyMgmt, ProfileId},
    LinkState, Notification, RadioCommand,
};

use crate::{
    logging::Logger,
    replay::run_script,
    scenario::{build_profiles, load_script, parse_script, StepAction},
};

const SIMPLE_JOIN: &str = include_str!("../fixtures/simple_join.toml");
const MIC_COUNTERMEASURES: &str = include_str!("../fixtures/mic_countermeasures.toml");

fn quiet() -> Logger {
    Logger::new(None, true).unwrap()
}

#[test]
fn parses_profiles_policy_and_steps() {
    let script = parse_script(SIMPLE_JOIN).unwrap();
    assert_eq!(script.profiles.len(), 2);
    assert_eq!(script.profiles[1].security, "open");
    assert_eq!(script.policy.connect_timeout_ms, Some(8_000));
    assert_eq!(script.steps.len(), 9);
    assert!(matches!(
        &script.steps[0].action,
        StepAction::Scan { bss } if bss.len() == 2
    ));
    assert!(matches!(
        &script.steps[5].action,
        StepAction::Disassoc { reason: 4, locally_generated: false, .. }
    ));
}

#[test]
fn steps_must_not_go_back_in_time() {
    let raw = r#"
[[step]]
at_ms = 200
event = "poll"

[[step]]
at_ms = 100
event = "poll"
"#;
    let err = parse_script(raw).unwrap_err();
    assert!(err.to_string().contains("goes back in time"));
}

#[test]
fn unknown_event_is_rejected() {
    let raw = r#"
[[step]]
at_ms = 1
event = "teleport"
"#;
    assert!(parse_script(raw).is_err());
}

#[test]
fn simple_join_ends_completed_after_fast_reconnect() {
    let script = parse_script(SIMPLE_JOIN).unwrap();
    let outcome = run_script(&script, &mut quiet()).unwrap();

    assert_eq!(outcome.final_state, LinkState::Completed);
    let connects = outcome
        .commands
        .iter()
        .filter(|command| matches!(command, RadioCommand::Connect { .. }))
        .count();
    assert_eq!(connects, 2);
    assert!(outcome
        .notifications
        .iter()
        .any(|notification| matches!(notification, Notification::Disconnected { reason: 4, .. })));
    assert_eq!(
        outcome.transitions.last(),
        Some(&(LinkState::Associated, LinkState::Completed))
    );
}

#[test]
fn countermeasures_lift_before_later_steps() {
    let script = parse_script(MIC_COUNTERMEASURES).unwrap();
    let outcome = run_script(&script, &mut quiet()).unwrap();

    assert_eq!(outcome.final_state, LinkState::Disconnected);
    let toggles: Vec<_> = outcome
        .commands
        .iter()
        .filter_map(|command| match command {
            RadioCommand::SetCountermeasures(enable) => Some(*enable),
            _ => None,
        })
        .collect();
    assert_eq!(toggles, [true, false]);
    assert!(outcome.commands.contains(&RadioCommand::StartScan));
}

#[test]
fn script_loads_from_disk_and_writes_json_log() {
    let dir = tempdir().unwrap();
    let script_path = dir.path().join("join.toml");
    let log_path = dir.path().join("logs/replay.jsonl");
    fs::write(&script_path, SIMPLE_JOIN).unwrap();

    let script = load_script(&script_path).unwrap();
    let mut logger = Logger::new(Some(log_path.clone()), true).unwrap();
    run_script(&script, &mut logger).unwrap();
    drop(logger);

    let lines = fs::read_to_string(&log_path).unwrap();
    assert!(lines.lines().count() > 5);
    assert!(lines.contains("\"kind\":\"summary\""));
    assert!(lines.contains("radio connect bssid=02:00:00:00:00:01 profile=1"));
}

#[test]
fn missing_script_reports_path() {
    let dir = tempdir().unwrap();
    let err = load_script(&dir.path().join("absent.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("absent.toml"));
}

#[test]
fn key_mgmt_labels_replace_preset() {
    let raw = r#"
[[profile]]
id = 7
ssid = ""
security = "open"
key_mgmt = ["wps"]

[[profile]]
id = 8
ssid = "Cafe"
key_mgmt = ["OWE", "WPA-PSK"]
"#;
    let script = parse_script(raw).unwrap();
    let table = build_profiles(&script.profiles).unwrap();
    let wps = table.profile(ProfileId(7)).unwrap();
    assert_eq!(wps.security.key_mgmt, EnumSet::only(KeyMgmt::Wps));
    let owe = table.profile(ProfileId(8)).unwrap();
    assert_eq!(owe.security.key_mgmt, KeyMgmt::Owe | KeyMgmt::Psk);
}

#[test]
fn unknown_key_mgmt_label_is_rejected() {
    let raw = r#"
[[profile]]
id = 3
ssid = "Home"
key_mgmt = ["WPA-MAGIC"]
"#;
    let script = parse_script(raw).unwrap();
    let err = build_profiles(&script.profiles).unwrap_err();
    assert!(err.to_string().contains("WPA-MAGIC"));
}

#[test]
fn removing_last_profile_goes_inactive() {
    let raw = r#"
[[profile]]
id = 1
ssid = "Home"
security = "open"

[[step]]
at_ms = 100
event = "set_profile"
id = 1
enabled = false

[[step]]
at_ms = 200
event = "scan"
bss = [{ bssid = "02:00:00:00:00:01", ssid = "Home", signal_dbm = -50, security = "open" }]

[[step]]
at_ms = 300
event = "set_profile"
id = 1
enabled = true

[[step]]
at_ms = 400
event = "remove_profile"
id = 1

[[step]]
at_ms = 500
event = "scan"
bss = [{ bssid = "02:00:00:00:00:01", ssid = "Home", signal_dbm = -50, security = "open" }]
"#;
    let script = parse_script(raw).unwrap();
    let outcome = run_script(&script, &mut quiet()).unwrap();
    let inactive = outcome
        .notifications
        .iter()
        .filter(|notification| matches!(notification, Notification::Inactive))
        .count();
    assert_eq!(inactive, 2);
    assert!(outcome.commands.is_empty());

    let missing = parse_script(
        r#"
[[step]]
at_ms = 1
event = "remove_profile"
id = 9
"#,
    )
    .unwrap();
    let err = run_script(&missing, &mut quiet()).unwrap_err();
    assert!(err.to_string().contains("no profile 9"));
}
