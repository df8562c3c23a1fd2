// IEEE 802.11 reason codes the link logic acts on (Table 9-49).
pub const REASON_UNSPECIFIED: u16 = 1;
pub const REASON_DEAUTH_LEAVING: u16 = 3;
pub const REASON_DISASSOC_INACTIVITY: u16 = 4;
pub const REASON_CLASS2_FRAME_FROM_NONAUTH_STA: u16 = 6;
pub const REASON_CLASS3_FRAME_FROM_NONASSOC_STA: u16 = 7;
pub const REASON_MICHAEL_MIC_FAILURE: u16 = 14;
pub const REASON_4WAY_HANDSHAKE_TIMEOUT: u16 = 15;
pub const REASON_IE_IN_4WAY_DIFFERS: u16 = 17;

/// Reasons after which the same AP is worth an immediate retry without a scan.
pub const fn disconnect_reason_recoverable(reason: u16) -> bool {
    matches!(
        reason,
        REASON_DISASSOC_INACTIVITY
            | REASON_CLASS2_FRAME_FROM_NONAUTH_STA
            | REASON_CLASS3_FRAME_FROM_NONASSOC_STA
    )
}

pub const fn reason_label(reason: u16) -> &'static str {
    match reason {
        REASON_UNSPECIFIED => "unspecified",
        REASON_DEAUTH_LEAVING => "deauth_leaving",
        REASON_DISASSOC_INACTIVITY => "inactivity",
        REASON_CLASS2_FRAME_FROM_NONAUTH_STA => "class2_frame",
        REASON_CLASS3_FRAME_FROM_NONASSOC_STA => "class3_frame",
        REASON_MICHAEL_MIC_FAILURE => "michael_mic_failure",
        REASON_4WAY_HANDSHAKE_TIMEOUT => "4way_handshake_timeout",
        REASON_IE_IN_4WAY_DIFFERS => "ie_in_4way_differs",
        _ => "other",
    }
}
