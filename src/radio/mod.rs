mod recording;

pub use recording::{RecordingRadio, RECORDED_COMMANDS_MAX};

use crate::{
    matcher::HwModeTable,
    types::{Bssid, ProfileId, RadioCommand},
};

/// Driver side of the connection core. Commands are fire-and-forget; their
/// outcome comes back later as a `DriverEvent`.
pub trait RadioInterface {
    fn connect(&mut self, bssid: Bssid, profile: ProfileId);
    fn start_network(&mut self, profile: ProfileId);
    fn deauthenticate(&mut self, reason: u16);
    fn set_countermeasures(&mut self, enable: bool);
    fn start_scan(&mut self);

    /// BSSID the radio is associated with, zero when none.
    fn get_bssid(&self) -> Bssid;

    /// Whether the driver saw `candidate` advertise a previous-BSSID that
    /// differs from our current AP, i.e. the network itself asked us to move.
    fn prev_bssid_mismatch(&self, candidate: &Bssid) -> bool;

    fn hw_modes(&self) -> &HwModeTable;

    fn execute(&mut self, command: RadioCommand) {
        match command {
            RadioCommand::Connect { bssid, profile } => self.connect(bssid, profile),
            RadioCommand::StartNetwork { profile } => self.start_network(profile),
            RadioCommand::Deauthenticate { reason } => self.deauthenticate(reason),
            RadioCommand::SetCountermeasures(enable) => self.set_countermeasures(enable),
            RadioCommand::StartScan => self.start_scan(),
        }
    }
}
