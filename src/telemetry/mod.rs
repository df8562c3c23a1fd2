use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::{
    link::Notification,
    selector::{Selection, SelectionOutcome},
    types::RadioCommand,
};

static CONNMAN_CONNECT_ATTEMPTS: AtomicU32 = AtomicU32::new(0);
static CONNMAN_NETWORK_STARTS: AtomicU32 = AtomicU32::new(0);
static CONNMAN_CONNECT_SUCCESSES: AtomicU32 = AtomicU32::new(0);
static CONNMAN_DEAUTHS_SENT: AtomicU32 = AtomicU32::new(0);
static CONNMAN_DISCONNECTS: AtomicU32 = AtomicU32::new(0);
static CONNMAN_DISCONNECTS_LOCAL: AtomicU32 = AtomicU32::new(0);
static CONNMAN_ASSOC_REJECTS: AtomicU32 = AtomicU32::new(0);
static CONNMAN_AUTH_FAILURES: AtomicU32 = AtomicU32::new(0);
static CONNMAN_TEMP_DISABLES: AtomicU32 = AtomicU32::new(0);
static CONNMAN_MIC_FAILURES: AtomicU32 = AtomicU32::new(0);
static CONNMAN_COUNTERMEASURES: AtomicU32 = AtomicU32::new(0);
static CONNMAN_SCAN_REQUESTS: AtomicU32 = AtomicU32::new(0);
static CONNMAN_SCAN_RESULTS: AtomicU32 = AtomicU32::new(0);
static CONNMAN_SCAN_EMPTY: AtomicU32 = AtomicU32::new(0);
static CONNMAN_SCAN_BSS_TOTAL: AtomicU32 = AtomicU32::new(0);
static CONNMAN_SELECTION_RUNS: AtomicU32 = AtomicU32::new(0);
static CONNMAN_SELECTION_NOT_FOUND: AtomicU32 = AtomicU32::new(0);
static CONNMAN_SELECTION_STAYS: AtomicU32 = AtomicU32::new(0);
static CONNMAN_SELECTION_PAIRS_MAX: AtomicU32 = AtomicU32::new(0);
static CONNMAN_ROAMS: AtomicU32 = AtomicU32::new(0);
static CONNMAN_BLACKLIST_CLEARS: AtomicU32 = AtomicU32::new(0);
static CONNMAN_LAST_DISCONNECT_REASON: AtomicU32 = AtomicU32::new(0);
static CONNMAN_LINK_COMPLETED: AtomicBool = AtomicBool::new(false);

#[derive(Clone, Copy, Debug, Default)]
pub struct Snapshot {
    pub connect_attempts: u32,
    pub network_starts: u32,
    pub connect_successes: u32,
    pub deauths_sent: u32,
    pub disconnects: u32,
    pub disconnects_local: u32,
    pub assoc_rejects: u32,
    pub auth_failures: u32,
    pub temp_disables: u32,
    pub mic_failures: u32,
    pub countermeasures: u32,
    pub scan_requests: u32,
    pub scan_results: u32,
    pub scan_empty: u32,
    pub scan_bss_total: u32,
    pub selection_runs: u32,
    pub selection_not_found: u32,
    pub selection_stays: u32,
    pub selection_pairs_max: u32,
    pub roams: u32,
    pub blacklist_clears: u32,
    pub last_disconnect_reason: u16,
    pub link_completed: bool,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        connect_attempts: CONNMAN_CONNECT_ATTEMPTS.load(Ordering::Relaxed),
        network_starts: CONNMAN_NETWORK_STARTS.load(Ordering::Relaxed),
        connect_successes: CONNMAN_CONNECT_SUCCESSES.load(Ordering::Relaxed),
        deauths_sent: CONNMAN_DEAUTHS_SENT.load(Ordering::Relaxed),
        disconnects: CONNMAN_DISCONNECTS.load(Ordering::Relaxed),
        disconnects_local: CONNMAN_DISCONNECTS_LOCAL.load(Ordering::Relaxed),
        assoc_rejects: CONNMAN_ASSOC_REJECTS.load(Ordering::Relaxed),
        auth_failures: CONNMAN_AUTH_FAILURES.load(Ordering::Relaxed),
        temp_disables: CONNMAN_TEMP_DISABLES.load(Ordering::Relaxed),
        mic_failures: CONNMAN_MIC_FAILURES.load(Ordering::Relaxed),
        countermeasures: CONNMAN_COUNTERMEASURES.load(Ordering::Relaxed),
        scan_requests: CONNMAN_SCAN_REQUESTS.load(Ordering::Relaxed),
        scan_results: CONNMAN_SCAN_RESULTS.load(Ordering::Relaxed),
        scan_empty: CONNMAN_SCAN_EMPTY.load(Ordering::Relaxed),
        scan_bss_total: CONNMAN_SCAN_BSS_TOTAL.load(Ordering::Relaxed),
        selection_runs: CONNMAN_SELECTION_RUNS.load(Ordering::Relaxed),
        selection_not_found: CONNMAN_SELECTION_NOT_FOUND.load(Ordering::Relaxed),
        selection_stays: CONNMAN_SELECTION_STAYS.load(Ordering::Relaxed),
        selection_pairs_max: CONNMAN_SELECTION_PAIRS_MAX.load(Ordering::Relaxed),
        roams: CONNMAN_ROAMS.load(Ordering::Relaxed),
        blacklist_clears: CONNMAN_BLACKLIST_CLEARS.load(Ordering::Relaxed),
        last_disconnect_reason: CONNMAN_LAST_DISCONNECT_REASON.load(Ordering::Relaxed) as u16,
        link_completed: CONNMAN_LINK_COMPLETED.load(Ordering::Relaxed),
    }
}

pub fn record_radio_command(command: RadioCommand) {
    match command {
        RadioCommand::Connect { .. } => {
            CONNMAN_CONNECT_ATTEMPTS.fetch_add(1, Ordering::Relaxed);
        }
        RadioCommand::StartNetwork { .. } => {
            CONNMAN_NETWORK_STARTS.fetch_add(1, Ordering::Relaxed);
        }
        RadioCommand::Deauthenticate { .. } => {
            CONNMAN_DEAUTHS_SENT.fetch_add(1, Ordering::Relaxed);
        }
        RadioCommand::StartScan => {
            CONNMAN_SCAN_REQUESTS.fetch_add(1, Ordering::Relaxed);
        }
        RadioCommand::SetCountermeasures(_) => {}
    }
    #[cfg(feature = "telemetry-defmt")]
    defmt::trace!("telemetry connman_radio command={=str}", command.as_str());
}

pub fn record_scan(result_count: usize, stored: usize) {
    CONNMAN_SCAN_RESULTS.fetch_add(1, Ordering::Relaxed);
    if result_count == 0 {
        CONNMAN_SCAN_EMPTY.fetch_add(1, Ordering::Relaxed);
    }
    saturating_add_u32(&CONNMAN_SCAN_BSS_TOTAL, result_count as u32);
    #[cfg(feature = "telemetry-defmt")]
    defmt::debug!(
        "telemetry connman_scan result_count={=u16} stored={=u16}",
        result_count as u16,
        stored as u16,
    );
    #[cfg(not(feature = "telemetry-defmt"))]
    let _ = stored;
}

pub fn record_selection(selection: &Selection) {
    CONNMAN_SELECTION_RUNS.fetch_add(1, Ordering::Relaxed);
    update_max_u32(
        &CONNMAN_SELECTION_PAIRS_MAX,
        u32::from(selection.trace.evaluated),
    );
    if selection.trace.blacklist_cleared {
        CONNMAN_BLACKLIST_CLEARS.fetch_add(1, Ordering::Relaxed);
    }
    match selection.outcome {
        SelectionOutcome::NotFound => {
            CONNMAN_SELECTION_NOT_FOUND.fetch_add(1, Ordering::Relaxed);
        }
        SelectionOutcome::Stay(_) => {
            CONNMAN_SELECTION_STAYS.fetch_add(1, Ordering::Relaxed);
        }
        SelectionOutcome::Roam { .. } => {
            CONNMAN_ROAMS.fetch_add(1, Ordering::Relaxed);
        }
        SelectionOutcome::Join { .. } | SelectionOutcome::CreateNetwork { .. } => {}
    }
    #[cfg(feature = "telemetry-defmt")]
    defmt::debug!(
        "telemetry connman_selection outcome={=str} passes={=u8} evaluated={=u16} rejected={=u16}",
        selection.outcome.as_str(),
        selection.trace.passes,
        selection.trace.evaluated,
        selection.trace.rejected,
    );
}

pub fn record_notification(notification: Notification) {
    match notification {
        Notification::Connected { .. } => {
            CONNMAN_CONNECT_SUCCESSES.fetch_add(1, Ordering::Relaxed);
            CONNMAN_LINK_COMPLETED.store(true, Ordering::Relaxed);
            #[cfg(feature = "telemetry-defmt")]
            defmt::info!("telemetry connman_connected");
        }
        Notification::Disconnected {
            reason,
            locally_generated,
            ..
        } => {
            CONNMAN_DISCONNECTS.fetch_add(1, Ordering::Relaxed);
            if locally_generated {
                CONNMAN_DISCONNECTS_LOCAL.fetch_add(1, Ordering::Relaxed);
            }
            CONNMAN_LAST_DISCONNECT_REASON.store(u32::from(reason), Ordering::Relaxed);
            CONNMAN_LINK_COMPLETED.store(false, Ordering::Relaxed);
            #[cfg(feature = "telemetry-defmt")]
            defmt::warn!(
                "telemetry connman_disconnected reason={=u16} local={=bool}",
                reason,
                locally_generated,
            );
        }
        Notification::AssocStatus { status_code, .. } => {
            CONNMAN_ASSOC_REJECTS.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "telemetry-defmt")]
            defmt::warn!("telemetry connman_assoc_reject status={=u16}", status_code);
            #[cfg(not(feature = "telemetry-defmt"))]
            let _ = status_code;
        }
        Notification::AuthFailed { .. } => {
            CONNMAN_AUTH_FAILURES.fetch_add(1, Ordering::Relaxed);
        }
        Notification::TempDisabled { .. } => {
            CONNMAN_TEMP_DISABLES.fetch_add(1, Ordering::Relaxed);
        }
        Notification::MicFailure { .. } => {
            CONNMAN_MIC_FAILURES.fetch_add(1, Ordering::Relaxed);
        }
        Notification::CountermeasuresStarted => {
            CONNMAN_COUNTERMEASURES.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "telemetry-defmt")]
            defmt::warn!("telemetry connman_countermeasures_started");
        }
        _ => {}
    }
}

fn saturating_add_u32(counter: &AtomicU32, value: u32) {
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_add(value))
    });
}

fn update_max_u32(max_counter: &AtomicU32, value: u32) {
    let mut current = max_counter.load(Ordering::Relaxed);
    while value > current {
        match max_counter.compare_exchange_weak(
            current,
            value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return,
            Err(next) => current = next,
        }
    }
}
