use anyhow::{bail, Result};
use serde_json::json;
use wifi_connman::{
    link::LinkAction, telemetry, types::ProfileId, ConnPolicy, DispatchReport, EventDispatcher, LinkState,
    Notification, ProfileTable, RadioCommand, RecordingRadio,
};

use crate::{
    logging::Logger,
    scenario::{build_profiles, driver_event, parse_bssid, Script, StepAction},
};

// Upper bound on timer expiries replayed ahead of one step.
const POLL_ROUNDS_MAX: usize = 64;

type Dispatcher = EventDispatcher<RecordingRadio, ProfileTable>;

#[derive(Debug, Default)]
pub struct ReplayOutcome {
    pub final_state: LinkState,
    pub transitions: Vec<(LinkState, LinkState)>,
    pub commands: Vec<RadioCommand>,
    pub notifications: Vec<Notification>,
}

impl ReplayOutcome {
    fn absorb(&mut self, report: &DispatchReport) {
        for action in report.actions.iter() {
            match *action {
                LinkAction::Radio(command) => self.commands.push(command),
                LinkAction::Notify(Notification::StateChanged { from, to }) => {
                    self.transitions.push((from, to));
                    self.notifications.push(Notification::StateChanged { from, to });
                }
                LinkAction::Notify(notification) => self.notifications.push(notification),
                _ => {}
            }
        }
    }
}

pub fn run_script(script: &Script, logger: &mut Logger) -> Result<ReplayOutcome> {
    let mut radio = RecordingRadio::new();
    for bssid in &script.radio.prev_bssid_mismatch {
        radio.flag_prev_bssid_mismatch(parse_bssid(bssid)?);
    }
    let profiles = build_profiles(&script.profiles)?;
    let policy = script.policy.apply(ConnPolicy::defaults());
    let mut dispatcher = EventDispatcher::new(radio, profiles, policy);
    let mut outcome = ReplayOutcome::default();

    for step in &script.steps {
        fire_timers_until(&mut dispatcher, step.at_ms, logger, &mut outcome)?;
        let (label, report) = run_step(&mut dispatcher, &step.action, step.at_ms)?;
        print_report(logger, step.at_ms, label, &report);
        outcome.absorb(&report);
    }

    outcome.final_state = dispatcher.snapshot().state;
    let counters = telemetry::snapshot();
    logger.line(format!(
        "final state={} connects={} disconnects={} scans_requested={} selections={}",
        outcome.final_state.as_str(),
        counters.connect_successes,
        counters.disconnects,
        counters.scan_requests,
        counters.selection_runs
    ));
    logger.record(json!({
        "kind": "summary",
        "state": outcome.final_state.as_str(),
        "transitions": outcome.transitions.len(),
        "commands": outcome.commands.len(),
        "notifications": outcome.notifications.len(),
    }));
    Ok(outcome)
}

fn fire_timers_until(
    dispatcher: &mut Dispatcher,
    at_ms: u64,
    logger: &mut Logger,
    outcome: &mut ReplayOutcome,
) -> Result<()> {
    for _ in 0..POLL_ROUNDS_MAX {
        let Some(deadline) = dispatcher.next_deadline() else {
            return Ok(());
        };
        if deadline > at_ms {
            return Ok(());
        }
        let report = dispatcher.poll(deadline);
        print_report(logger, deadline, "timer", &report);
        outcome.absorb(&report);
    }
    bail!("timers still due after {POLL_ROUNDS_MAX} rounds at {at_ms} ms")
}

fn run_step(
    dispatcher: &mut Dispatcher,
    action: &StepAction,
    at_ms: u64,
) -> Result<(&'static str, DispatchReport)> {
    if let Some(event) = driver_event(action)? {
        let label = event.as_str();
        return Ok((label, dispatcher.dispatch(event, at_ms)));
    }
    let step = match action {
        StepAction::ReportBssid { bssid } => {
            dispatcher.radio_mut().reported_bssid = match bssid.as_str() {
                "none" => None,
                value => Some(parse_bssid(value)?),
            };
            ("report_bssid", DispatchReport::default())
        }
        StepAction::Poll => ("poll", dispatcher.poll(at_ms)),
        StepAction::RequestDisconnect => ("request_disconnect", dispatcher.request_disconnect(at_ms)),
        StepAction::RequestReconnect => ("request_reconnect", dispatcher.request_reconnect(at_ms)),
        StepAction::ClearBlacklist => ("clear_blacklist", dispatcher.clear_blacklist(at_ms)),
        StepAction::RoamParams {
            threshold,
            hysteresis,
        } => {
            dispatcher.update_roam_params(*threshold, *hysteresis);
            ("roam_params", DispatchReport::default())
        }
        StepAction::SetProfile { id, enabled } => {
            if !dispatcher.profiles_mut().set_enabled(ProfileId(*id), *enabled) {
                bail!("set_profile: no profile {id}");
            }
            ("set_profile", DispatchReport::default())
        }
        StepAction::RemoveProfile { id } => {
            if dispatcher.profiles_mut().remove(ProfileId(*id)).is_none() {
                bail!("remove_profile: no profile {id}");
            }
            ("remove_profile", DispatchReport::default())
        }
        _ => bail!("step {action:?} is neither a driver event nor a command"),
    };
    Ok(step)
}

fn print_report(logger: &mut Logger, at_ms: u64, label: &str, report: &DispatchReport) {
    if report.changed() {
        logger.line(format!(
            "{at_ms:>8} {label:<20} {} -> {}",
            report.before.as_str(),
            report.after.as_str()
        ));
    } else {
        logger.line(format!("{at_ms:>8} {label:<20} {}", report.after.as_str()));
    }
    if let Some(selection) = report.selection {
        logger.line(format!(
            "{:>8}   select {} passes={} evaluated={} rejected={}",
            "",
            selection.outcome.as_str(),
            selection.trace.passes,
            selection.trace.evaluated,
            selection.trace.rejected
        ));
    }
    for action in report.actions.iter() {
        let text = describe(action);
        logger.line(format!("{:>8}   {text}", ""));
        logger.record(json!({
            "kind": "action",
            "at_ms": at_ms,
            "trigger": label,
            "action": text,
        }));
    }
}

fn describe(action: &LinkAction) -> String {
    match *action {
        LinkAction::Radio(command) => match command {
            RadioCommand::Connect { bssid, profile } => {
                format!("radio connect bssid={bssid} profile={profile}")
            }
            RadioCommand::StartNetwork { profile } => format!("radio start_network profile={profile}"),
            RadioCommand::Deauthenticate { reason } => format!("radio deauthenticate reason={reason}"),
            RadioCommand::SetCountermeasures(enable) => {
                format!("radio set_countermeasures enable={enable}")
            }
            RadioCommand::StartScan => "radio start_scan".into(),
        },
        LinkAction::Notify(notification) => describe_notification(notification),
        LinkAction::TempDisable { profile, until_ms } => {
            format!("store temp_disable profile={profile} until_ms={until_ms}")
        }
        LinkAction::ClearTempDisable { profile } => format!("store clear_temp_disable profile={profile}"),
        LinkAction::ForgetBss { bssid } => format!("catalog forget bssid={bssid}"),
        LinkAction::FlushCatalog => "catalog flush".into(),
    }
}

fn describe_notification(notification: Notification) -> String {
    let name = notification.as_str();
    match notification {
        Notification::StateChanged { from, to } => {
            format!("notify {name} from={} to={}", from.as_str(), to.as_str())
        }
        Notification::Connected { bssid, freq_mhz } => {
            format!("notify {name} bssid={bssid} freq={freq_mhz}")
        }
        Notification::Disconnected {
            bssid,
            reason,
            locally_generated,
        } => format!("notify {name} bssid={bssid} reason={reason} local={locally_generated}"),
        Notification::AssocStatus {
            bssid,
            status_code,
            timed_out,
        } => format!("notify {name} bssid={bssid} status={status_code} timed_out={timed_out}"),
        Notification::AuthFailed { profile, kind } => {
            format!("notify {name} profile={profile} kind={}", kind.as_str())
        }
        Notification::TempDisabled {
            profile,
            until_ms,
            reason,
        } => format!(
            "notify {name} profile={profile} until_ms={until_ms} reason={}",
            reason.as_str()
        ),
        Notification::MicFailure { unicast } => format!("notify {name} unicast={unicast}"),
        Notification::RoamIndication { bssid } | Notification::BetterApFound { bssid } => {
            format!("notify {name} bssid={bssid}")
        }
        _ => format!("notify {name}"),
    }
}
