use crate::types::{
    BssRecord, Cipher, KeyMgmt, MfpPolicy, Proto, SecurityIe, SecurityPolicy, KEY_MGMT_NON_WPA_OK,
};

use super::RejectReason;

pub(super) fn check_security(
    bss: &BssRecord,
    policy: &SecurityPolicy,
) -> Result<(), RejectReason> {
    let elements = &bss.security;
    if policy.key_mgmt.contains(KeyMgmt::Wps) && elements.wps_open_enrollment {
        return Ok(());
    }
    if !policy.ignores_privacy() && bss.privacy() != policy.privacy_required() {
        return Err(RejectReason::PrivacyMismatch);
    }

    let mut first_failure = None;

    if let Some(rsn) = elements.rsn.as_ref() {
        if policy.proto.contains(Proto::Rsn) {
            match check_element(rsn, policy, true) {
                Ok(()) => return Ok(()),
                Err(reason) => first_failure = Some(reason),
            }
        }
    }

    if let Some(wpa) = elements.wpa.as_ref() {
        if policy.proto.contains(Proto::Wpa) {
            match check_element(wpa, policy, false) {
                Ok(()) => return Ok(()),
                Err(reason) => {
                    first_failure.get_or_insert(reason);
                }
            }
        }
    }

    let key_mgmt = policy.key_mgmt;
    if key_mgmt.contains(KeyMgmt::Ieee8021xNoWpa) && !elements.has_wpa_elements() {
        return Ok(());
    }
    if key_mgmt.contains(KeyMgmt::Osen) && elements.osen {
        return Ok(());
    }
    if !elements.has_wpa_elements() {
        return if key_mgmt.is_disjoint(KEY_MGMT_NON_WPA_OK) {
            Err(RejectReason::NonWpaNotAllowed)
        } else {
            Ok(())
        };
    }
    if policy.wep_key_present && !policy.uses_wpa_key_mgmt() {
        return Err(RejectReason::WpaForWepProfile);
    }
    Err(first_failure.unwrap_or(RejectReason::KeyMgmtMismatch))
}

fn check_element(
    ie: &SecurityIe,
    policy: &SecurityPolicy,
    rsn: bool,
) -> Result<(), RejectReason> {
    if ie.pairwise.is_disjoint(policy.pairwise) {
        return Err(RejectReason::NoPairwiseCipher);
    }
    if !policy.group.contains(ie.group) {
        return Err(RejectReason::GroupCipherMismatch);
    }
    if ie.key_mgmt.is_disjoint(policy.key_mgmt) {
        return Err(RejectReason::KeyMgmtMismatch);
    }
    if !rsn {
        return Ok(());
    }

    if policy.mfp == MfpPolicy::Required && !ie.mfp_capable {
        return Err(RejectReason::MfpUnsupported);
    }
    if ie.mfp_required && policy.mfp == MfpPolicy::Disabled {
        return Err(RejectReason::MfpUnsupported);
    }
    let mfp_in_use = policy.mfp != MfpPolicy::Disabled && ie.mfp_capable;
    if let Some(pinned) = policy.group_mgmt {
        // AP omitting the group management suite implies BIP-CMAC-128.
        let advertised = ie.group_mgmt.unwrap_or(Cipher::BipCmac128);
        if mfp_in_use && pinned != advertised {
            return Err(RejectReason::GroupCipherMismatch);
        }
    }
    Ok(())
}
