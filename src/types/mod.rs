mod bss;
mod bssid;
mod events;
mod profile;
mod security;
mod ssid;

pub use bss::{Band, BssCapability, BssRecord, PhySelector, BASIC_RATES_MAX};
pub use bssid::{Bssid, BssidParseError};
pub use events::{DriverEvent, RadioCommand, ScanBatch, SCAN_RESULTS_MAX};
pub use profile::{
    NetworkProfile, PbssPolicy, ProfileId, ProfileMode, PROFILE_BSSID_LIST_MAX,
    PROFILE_FREQ_LIST_MAX,
};
pub use security::{
    BssSecurity, Cipher, KeyMgmt, MfpPolicy, Proto, SecurityIe, SecurityPolicy,
    CIPHER_GROUP_DEFAULT, CIPHER_PAIRWISE_DEFAULT, KEY_MGMT_NON_WPA_OK, KEY_MGMT_PSK_FAMILY,
    KEY_MGMT_SAE_FAMILY, KEY_MGMT_WPA_FAMILY,
};
pub use ssid::{Ssid, SSID_MAX_LEN};
