use heapless::Vec;

use super::RadioInterface;
use crate::{
    matcher::HwModeTable,
    types::{Bssid, ProfileId, RadioCommand},
};

pub const RECORDED_COMMANDS_MAX: usize = 64;
const PREV_BSSID_MISMATCH_MAX: usize = 8;

/// In-memory radio: records every command and answers queries from fields.
///
/// `get_bssid` follows the last connect unless `reported_bssid` overrides it,
/// and falls back to zero after a deauthentication.
#[derive(Clone, Debug, Default)]
pub struct RecordingRadio {
    commands: Vec<RadioCommand, RECORDED_COMMANDS_MAX>,
    dropped: usize,
    joined: Bssid,
    pub reported_bssid: Option<Bssid>,
    prev_bssid_mismatch: Vec<Bssid, PREV_BSSID_MISMATCH_MAX>,
    pub countermeasures: bool,
    hw_modes: HwModeTable,
}

impl RecordingRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hw_modes(mut self, hw_modes: HwModeTable) -> Self {
        self.hw_modes = hw_modes;
        self
    }

    pub fn flag_prev_bssid_mismatch(&mut self, candidate: Bssid) {
        if self.prev_bssid_mismatch.contains(&candidate) {
            return;
        }
        if self.prev_bssid_mismatch.push(candidate).is_err() {
            log::warn!("connman: recording radio mismatch list full");
        }
    }

    pub fn commands(&self) -> &[RadioCommand] {
        &self.commands
    }

    /// Returns the recorded commands and starts a fresh log.
    pub fn take_commands(&mut self) -> Vec<RadioCommand, RECORDED_COMMANDS_MAX> {
        core::mem::take(&mut self.commands)
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn record(&mut self, command: RadioCommand) {
        if self.commands.push(command).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }
}

impl RadioInterface for RecordingRadio {
    fn connect(&mut self, bssid: Bssid, profile: ProfileId) {
        self.joined = bssid;
        self.record(RadioCommand::Connect { bssid, profile });
    }

    fn start_network(&mut self, profile: ProfileId) {
        self.record(RadioCommand::StartNetwork { profile });
    }

    fn deauthenticate(&mut self, reason: u16) {
        self.joined = Bssid::ZERO;
        self.record(RadioCommand::Deauthenticate { reason });
    }

    fn set_countermeasures(&mut self, enable: bool) {
        self.countermeasures = enable;
        self.record(RadioCommand::SetCountermeasures(enable));
    }

    fn start_scan(&mut self) {
        self.record(RadioCommand::StartScan);
    }

    fn get_bssid(&self) -> Bssid {
        self.reported_bssid.unwrap_or(self.joined)
    }

    fn prev_bssid_mismatch(&self, candidate: &Bssid) -> bool {
        self.prev_bssid_mismatch.contains(candidate)
    }

    fn hw_modes(&self) -> &HwModeTable {
        &self.hw_modes
    }
}
