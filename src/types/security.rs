use enumset::{enum_set, EnumSet, EnumSetType};

#[derive(EnumSetType, Debug)]
pub enum Proto {
    Wpa,
    Rsn,
}

#[derive(EnumSetType, Debug)]
pub enum Cipher {
    Wep40,
    Wep104,
    Tkip,
    Ccmp,
    Ccmp256,
    Gcmp,
    Gcmp256,
    BipCmac128,
    BipGmac128,
    BipGmac256,
    BipCmac256,
    GtkNotUsed,
}

impl Cipher {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wep40 => "WEP40",
            Self::Wep104 => "WEP104",
            Self::Tkip => "TKIP",
            Self::Ccmp => "CCMP",
            Self::Ccmp256 => "CCMP-256",
            Self::Gcmp => "GCMP",
            Self::Gcmp256 => "GCMP-256",
            Self::BipCmac128 => "BIP",
            Self::BipGmac128 => "BIP-GMAC-128",
            Self::BipGmac256 => "BIP-GMAC-256",
            Self::BipCmac256 => "BIP-CMAC-256",
            Self::GtkNotUsed => "GTK_NOT_USED",
        }
    }
}

#[derive(EnumSetType, Debug)]
pub enum KeyMgmt {
    None,
    Ieee8021x,
    Psk,
    Ieee8021xNoWpa,
    WpaNone,
    FtIeee8021x,
    FtPsk,
    Ieee8021xSha256,
    PskSha256,
    Wps,
    Sae,
    FtSae,
    Ieee8021xSuiteB,
    Ieee8021xSuiteB192,
    Owe,
    Osen,
}

impl KeyMgmt {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Ieee8021x => "WPA-EAP",
            Self::Psk => "WPA-PSK",
            Self::Ieee8021xNoWpa => "IEEE8021X",
            Self::WpaNone => "WPA-NONE",
            Self::FtIeee8021x => "FT-EAP",
            Self::FtPsk => "FT-PSK",
            Self::Ieee8021xSha256 => "WPA-EAP-SHA256",
            Self::PskSha256 => "WPA-PSK-SHA256",
            Self::Wps => "WPS",
            Self::Sae => "SAE",
            Self::FtSae => "FT-SAE",
            Self::Ieee8021xSuiteB => "WPA-EAP-SUITE-B",
            Self::Ieee8021xSuiteB192 => "WPA-EAP-SUITE-B-192",
            Self::Owe => "OWE",
            Self::Osen => "OSEN",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        EnumSet::<Self>::all()
            .iter()
            .find(|key_mgmt| key_mgmt.as_str().eq_ignore_ascii_case(label))
    }
}

/// Key managements carried in a WPA or RSN element.
pub const KEY_MGMT_WPA_FAMILY: EnumSet<KeyMgmt> = enum_set!(
    KeyMgmt::Ieee8021x
        | KeyMgmt::Psk
        | KeyMgmt::FtIeee8021x
        | KeyMgmt::FtPsk
        | KeyMgmt::Ieee8021xSha256
        | KeyMgmt::PskSha256
        | KeyMgmt::Sae
        | KeyMgmt::FtSae
        | KeyMgmt::Ieee8021xSuiteB
        | KeyMgmt::Ieee8021xSuiteB192
        | KeyMgmt::Osen
);

/// Key managements whose PMK is derived from a passphrase.
pub const KEY_MGMT_PSK_FAMILY: EnumSet<KeyMgmt> =
    enum_set!(KeyMgmt::Psk | KeyMgmt::FtPsk | KeyMgmt::PskSha256);

pub const KEY_MGMT_SAE_FAMILY: EnumSet<KeyMgmt> = enum_set!(KeyMgmt::Sae | KeyMgmt::FtSae);

/// Key managements allowed to join a BSS that advertises neither WPA nor RSN.
pub const KEY_MGMT_NON_WPA_OK: EnumSet<KeyMgmt> =
    enum_set!(KeyMgmt::None | KeyMgmt::Wps | KeyMgmt::Owe | KeyMgmt::Ieee8021xNoWpa);

pub const CIPHER_PAIRWISE_DEFAULT: EnumSet<Cipher> = enum_set!(Cipher::Ccmp | Cipher::Tkip);

pub const CIPHER_GROUP_DEFAULT: EnumSet<Cipher> =
    enum_set!(Cipher::Ccmp | Cipher::Tkip | Cipher::Wep104 | Cipher::Wep40);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MfpPolicy {
    #[default]
    Disabled,
    Optional,
    Required,
}

impl MfpPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Optional => "optional",
            Self::Required => "required",
        }
    }
}

/// Parsed WPA or RSN element as advertised by a BSS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecurityIe {
    pub proto: Proto,
    pub pairwise: EnumSet<Cipher>,
    pub group: Cipher,
    pub group_mgmt: Option<Cipher>,
    pub key_mgmt: EnumSet<KeyMgmt>,
    pub mfp_capable: bool,
    pub mfp_required: bool,
}

impl SecurityIe {
    pub fn rsn_psk_ccmp() -> Self {
        Self {
            proto: Proto::Rsn,
            pairwise: EnumSet::only(Cipher::Ccmp),
            group: Cipher::Ccmp,
            group_mgmt: None,
            key_mgmt: EnumSet::only(KeyMgmt::Psk),
            mfp_capable: false,
            mfp_required: false,
        }
    }

    pub fn wpa_psk_tkip() -> Self {
        Self {
            proto: Proto::Wpa,
            pairwise: EnumSet::only(Cipher::Tkip),
            group: Cipher::Tkip,
            group_mgmt: None,
            key_mgmt: EnumSet::only(KeyMgmt::Psk),
            mfp_capable: false,
            mfp_required: false,
        }
    }
}

/// Security-relevant information elements of one BSS, decoded by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BssSecurity {
    pub rsn: Option<SecurityIe>,
    pub wpa: Option<SecurityIe>,
    pub osen: bool,
    pub wps_open_enrollment: bool,
}

impl BssSecurity {
    pub const fn open() -> Self {
        Self {
            rsn: None,
            wpa: None,
            osen: false,
            wps_open_enrollment: false,
        }
    }

    pub fn has_wpa_elements(&self) -> bool {
        self.rsn.is_some() || self.wpa.is_some()
    }
}

/// Profile side of the security match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecurityPolicy {
    pub proto: EnumSet<Proto>,
    pub key_mgmt: EnumSet<KeyMgmt>,
    pub pairwise: EnumSet<Cipher>,
    pub group: EnumSet<Cipher>,
    pub group_mgmt: Option<Cipher>,
    pub mfp: MfpPolicy,
    pub wep_key_present: bool,
}

impl SecurityPolicy {
    pub fn open() -> Self {
        Self {
            key_mgmt: EnumSet::only(KeyMgmt::None),
            ..Self::wpa2_psk()
        }
    }

    pub fn wpa2_psk() -> Self {
        Self {
            proto: Proto::Rsn | Proto::Wpa,
            key_mgmt: EnumSet::only(KeyMgmt::Psk),
            pairwise: CIPHER_PAIRWISE_DEFAULT,
            group: CIPHER_GROUP_DEFAULT,
            group_mgmt: None,
            mfp: MfpPolicy::Disabled,
            wep_key_present: false,
        }
    }

    pub fn wep() -> Self {
        Self {
            wep_key_present: true,
            ..Self::open()
        }
    }

    pub fn sae() -> Self {
        Self {
            proto: EnumSet::only(Proto::Rsn),
            key_mgmt: EnumSet::only(KeyMgmt::Sae),
            pairwise: EnumSet::only(Cipher::Ccmp),
            mfp: MfpPolicy::Required,
            ..Self::wpa2_psk()
        }
    }

    pub fn uses_wpa_key_mgmt(&self) -> bool {
        !self.key_mgmt.is_disjoint(KEY_MGMT_WPA_FAMILY)
    }

    pub fn uses_psk(&self) -> bool {
        !self.key_mgmt.is_disjoint(KEY_MGMT_PSK_FAMILY)
    }

    pub fn uses_sae(&self) -> bool {
        !self.key_mgmt.is_disjoint(KEY_MGMT_SAE_FAMILY)
    }

    /// Whether frames to this network must carry the privacy bit.
    pub fn privacy_required(&self) -> bool {
        self.wep_key_present
            || self.uses_wpa_key_mgmt()
            || self.key_mgmt.contains(KeyMgmt::Ieee8021xNoWpa)
    }

    /// WPS and OWE profiles join both protected and open cells, so the
    /// privacy bit says nothing about them.
    pub fn ignores_privacy(&self) -> bool {
        self.key_mgmt.contains(KeyMgmt::Wps) || self.key_mgmt.contains(KeyMgmt::Owe)
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::wpa2_psk()
    }
}
