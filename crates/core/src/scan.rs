// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Badge-scan observations and the vendor event-kind vocabulary.

use chrono::NaiveDateTime;
use thiserror::Error;

/// A numeric code the vendor uses that we have no variant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown comm server event kind {0}")]
pub struct UnknownEventKind(pub i64);

macro_rules! event_kinds {
    ($($name:ident = $code:literal),+ $(,)?) => {
        /// Event kinds reported by the vendor comm server.
        ///
        /// The numeric values are the vendor's wire codes. Only a handful
        /// matter to the workers, but the vocabulary is kept whole so raw
        /// telemetry can be interpreted without guessing at codes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CommServerEventKind {
            $($name = $code),+
        }

        impl CommServerEventKind {
            /// The vendor's wire code for this kind.
            pub fn code(self) -> i64 {
                self as i64
            }
        }

        impl TryFrom<i64> for CommServerEventKind {
            type Error = UnknownEventKind;

            fn try_from(code: i64) -> Result<Self, UnknownEventKind> {
                match code {
                    $($code => Ok(Self::$name),)+
                    other => Err(UnknownEventKind(other)),
                }
            }
        }
    };
}

event_kinds! {
    BroadcastDownloadComplete = 2,
    ParameterLoadSuccessful = 5,
    InvalidLogin = 6,
    AccessGranted = 8,
    StartingFullParameterLoad = 10,
    CodeActivate = 12,
    CodeDeactivate = 13,
    MessageRetry = 16,
    ParameterLoadRequest = 17,
    DeviceCommRestoral = 103,
    DeviceCommLoss = 104,
    SecureTz = 109,
    OpenTz = 110,
    Alarm = 112,
    CommServerStartup = 113,
    Restoral = 115,
    CommServerExit = 125,
    LocationCommunicationLoss = 132,
    LocationCommunicationRestoral = 133,
    OprSetOutputSecure = 137,
    OprSetOutputOpen = 138,
    OprSetOutputTz = 139,
    ConsecutiveDeniedExceeded = 167,
    DeniedUnknownCode = 174,
    DeniedTimezoneInactive = 175,
    DeniedWrongAccessLevel = 176,
    DeniedUnknownFacilityCode = 177,
    SlaveParameterRequest = 183,
    SlaveDownloadComplete = 184,
    DeniedParityError = 188,
    OprSetInputArm = 200,
    OprSetInputTz = 201,
    OprSetInputBypass = 202,
    OprSetOutputAccess = 205,
    AlarmAcknowledge = 206,
    OprSetInputAllTz = 215,
    AlarmResolution = 216,
    TzChangeOverridden = 221,
    OprSetOutputAllTimeZone = 222,
    OprSetOutputAllOpen = 223,
    SlaveChecksumDiscrepancy = 252,
    OprSetDeviceDisabled = 261,
    OprSetDeviceTz = 262,
    TempAclDeactivated = 273,
    ValidLogin = 274,
    AsciiFileImported = 285,
}

impl CommServerEventKind {
    /// Whether this kind represents a badge read we report as a card scan.
    pub fn is_card_scan(self) -> bool {
        matches!(
            self,
            Self::AccessGranted
                | Self::DeniedUnknownCode
                | Self::DeniedTimezoneInactive
                | Self::DeniedWrongAccessLevel
        )
    }
}

/// A badge-read observation. Immutable.
///
/// `name_id` is the person attached to the card at scan time, when the
/// store could resolve one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardScan {
    pub name_id: Option<i64>,
    pub card_number: i64,
    pub scan_time: NaiveDateTime,
    pub device: i64,
    pub event_type: CommServerEventKind,
    pub location_id: i64,
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
