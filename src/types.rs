use core::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Host power state as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    /// Host is powered on.
    PowerOn,
    /// Host is powered off.
    PowerOff,
    /// Host is rebooting (also usable as a target state).
    Reboot,
}

impl PowerState {
    /// Canonical name (`POWER_ON`, `POWER_OFF`, `REBOOT`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PowerOn => "POWER_ON",
            Self::PowerOff => "POWER_OFF",
            Self::Reboot => "REBOOT",
        }
    }

    /// CIM `EnabledState` / `RequestedState` value.
    pub(crate) fn cim_state(self) -> &'static str {
        match self {
            Self::PowerOn => "2",
            Self::PowerOff => "3",
            Self::Reboot => "11",
        }
    }

    pub(crate) fn from_cim_state(value: &str) -> Option<Self> {
        match value.trim() {
            "2" => Some(Self::PowerOn),
            "3" => Some(Self::PowerOff),
            "11" => Some(Self::Reboot),
            _ => None,
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "POWER_ON" => Ok(Self::PowerOn),
            "POWER_OFF" => Ok(Self::PowerOff),
            "REBOOT" => Ok(Self::Reboot),
            other => Err(Error::invalid(format!(
                "'{other}' is not a valid target_state; expected one of POWER_ON, POWER_OFF, REBOOT"
            ))),
        }
    }
}

/// A boot mode (`DCIM_BootConfigSetting`), e.g. `IPL`, `BCV`, `UEFI`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BootMode {
    /// Instance id, used as the boot-order selector.
    pub id: String,
    /// Element name, e.g. `BootSeq`.
    pub name: String,
    /// The mode is used for the current boot.
    pub is_current: bool,
    /// The mode will be used for the next boot.
    pub is_next: bool,
}

/// A boot device (`DCIM_BootSourceSetting`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BootDevice {
    /// Instance id, used when reordering devices.
    pub id: String,
    /// Boot mode the device belongs to.
    pub boot_mode: String,
    /// Position in the current boot sequence.
    pub current_assigned_sequence: u32,
    /// Position in the pending boot sequence.
    pub pending_assigned_sequence: u32,
    /// Human-readable BIOS boot string.
    pub bios_boot_string: String,
}

/// A Lifecycle Controller job (`DCIM_LifecycleJob`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Job {
    /// Job id, e.g. `JID_442507917525`.
    pub id: String,
    /// Job name.
    pub name: String,
    /// Scheduled start time, `TIME_NOW` or `TIME_NA` for unscheduled jobs.
    pub start_time: String,
    /// Latest allowed start time, or `TIME_NA`.
    pub until_time: String,
    /// Last status message, or `NA`.
    pub message: String,
    /// Job status, e.g. `Scheduled`, `Completed`, `Failed`.
    pub state: String,
    /// Completion percentage as reported (`NA` for some job types).
    pub percent_complete: String,
}

/// Lifecycle Controller firmware version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LifecycleControllerVersion {
    /// Major version (`1` on 11th generation controllers).
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl LifecycleControllerVersion {
    /// Build a version from its three parts.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The version as a `(major, minor, patch)` tuple.
    pub fn as_tuple(self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }
}

impl From<(u32, u32, u32)> for LifecycleControllerVersion {
    fn from((major, minor, patch): (u32, u32, u32)) -> Self {
        Self::new(major, minor, patch)
    }
}

impl fmt::Display for LifecycleControllerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for LifecycleControllerVersion {
    type Err = Error;

    /// Parses `major[.minor[.patch]]`; missing parts are zero, extra parts are ignored.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::malformed(format!("invalid Lifecycle Controller version {s:?}"));

        let mut parts = [0u32; 3];
        for (slot, part) in parts.iter_mut().zip(s.trim().split('.')) {
            *slot = part.parse().map_err(|_| malformed())?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

/// Type-specific constraints of a BIOS attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BiosAttributeKind {
    /// One of a closed set of values (`DCIM_BIOSEnumeration`).
    Enumeration {
        /// Accepted values.
        possible_values: Vec<String>,
    },
    /// Free-form string (`DCIM_BIOSString`).
    String {
        /// Minimum length, if constrained.
        min_length: Option<u32>,
        /// Maximum length, if constrained.
        max_length: Option<u32>,
        /// Regular expression the value must match, if any.
        pattern: Option<String>,
    },
    /// Integer (`DCIM_BIOSInteger`).
    Integer {
        /// Smallest accepted value, if constrained.
        lower_bound: Option<i64>,
        /// Largest accepted value, if constrained.
        upper_bound: Option<i64>,
    },
}

/// A BIOS attribute with its current and pending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiosAttribute {
    /// Attribute name, e.g. `MemTest`.
    pub name: String,
    /// Value in effect.
    pub current_value: Option<String>,
    /// Value staged for the next configuration job.
    pub pending_value: Option<String>,
    /// The attribute cannot be changed.
    pub read_only: bool,
    /// Type-specific constraints.
    pub kind: BiosAttributeKind,
}

impl BiosAttribute {
    /// Check that `value` may be written to this attribute.
    pub fn validate(&self, value: &str) -> Result<()> {
        if self.read_only {
            return Err(Error::invalid(format!("BIOS attribute {} is read-only", self.name)));
        }

        match &self.kind {
            BiosAttributeKind::Enumeration { possible_values } => {
                if !possible_values.iter().any(|v| v == value) {
                    return Err(Error::invalid(format!(
                        "{value:?} is not a valid value for {}; possible values are {}",
                        self.name,
                        possible_values.join(", ")
                    )));
                }
            }
            BiosAttributeKind::String {
                min_length,
                max_length,
                pattern,
            } => {
                let len = u32::try_from(value.chars().count()).unwrap_or(u32::MAX);
                if min_length.is_some_and(|min| len < min) || max_length.is_some_and(|max| len > max)
                {
                    return Err(Error::invalid(format!(
                        "{value:?} has an invalid length for {} (min {:?}, max {:?})",
                        self.name, min_length, max_length
                    )));
                }
                // Patterns the regex engine cannot compile are not enforced.
                if let Some(re) = pattern.as_deref().and_then(|p| regex::Regex::new(p).ok()) {
                    if !re.is_match(value) {
                        return Err(Error::invalid(format!(
                            "{value:?} does not match the pattern of {}",
                            self.name
                        )));
                    }
                }
            }
            BiosAttributeKind::Integer {
                lower_bound,
                upper_bound,
            } => {
                let n: i64 = value.trim().parse().map_err(|_| {
                    Error::invalid(format!("{value:?} is not an integer; {} is numeric", self.name))
                })?;
                if lower_bound.is_some_and(|lo| n < lo) || upper_bound.is_some_and(|hi| n > hi) {
                    return Err(Error::invalid(format!(
                        "{n} is out of range for {} ({lower_bound:?}..={upper_bound:?})",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Result of staging BIOS attribute changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiosSetResult {
    /// A configuration job (and reboot) is needed to apply the changes.
    pub commit_required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_state_parses_known_names_only() {
        assert_eq!("POWER_ON".parse::<PowerState>().expect("parse"), PowerState::PowerOn);
        assert_eq!("REBOOT".parse::<PowerState>().expect("parse"), PowerState::Reboot);
        let err = "foo".parse::<PowerState>().expect_err("invalid");
        assert!(matches!(err, Error::InvalidParameterValue(ref m) if m.contains("'foo'")));
    }

    #[test]
    fn power_state_cim_codes_round_trip() {
        for state in [PowerState::PowerOn, PowerState::PowerOff, PowerState::Reboot] {
            assert_eq!(PowerState::from_cim_state(state.cim_state()), Some(state));
        }
        assert_eq!(PowerState::from_cim_state("6"), None);
    }

    #[test]
    fn lifecycle_version_parsing_and_order() {
        let v: LifecycleControllerVersion = "2.1.0".parse().expect("parse");
        assert_eq!(v.as_tuple(), (2, 1, 0));
        assert_eq!("1.5".parse::<LifecycleControllerVersion>().expect("parse").as_tuple(), (1, 5, 0));
        assert!(LifecycleControllerVersion::new(1, 9, 9) < LifecycleControllerVersion::new(2, 0, 0));
        assert!("".parse::<LifecycleControllerVersion>().is_err());
        assert!("2.x.0".parse::<LifecycleControllerVersion>().is_err());
    }

    fn attribute(kind: BiosAttributeKind) -> BiosAttribute {
        BiosAttribute {
            name: "Attr".to_owned(),
            current_value: None,
            pending_value: None,
            read_only: false,
            kind,
        }
    }

    #[test]
    fn bios_attribute_validation() {
        let e = attribute(BiosAttributeKind::Enumeration {
            possible_values: vec!["Enabled".to_owned(), "Disabled".to_owned()],
        });
        assert!(e.validate("Enabled").is_ok());
        assert!(e.validate("Maybe").is_err());

        let s = attribute(BiosAttributeKind::String {
            min_length: Some(1),
            max_length: Some(4),
            pattern: Some("^[a-z]+$".to_owned()),
        });
        assert!(s.validate("abc").is_ok());
        assert!(s.validate("abcde").is_err());
        assert!(s.validate("AB").is_err());

        let i = attribute(BiosAttributeKind::Integer {
            lower_bound: Some(0),
            upper_bound: Some(10),
        });
        assert!(i.validate("10").is_ok());
        assert!(i.validate("11").is_err());
        assert!(i.validate("ten").is_err());

        let ro = BiosAttribute {
            read_only: true,
            ..e
        };
        assert!(matches!(ro.validate("Enabled"), Err(Error::InvalidParameterValue(_))));
    }
}
