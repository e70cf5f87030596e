use std::collections::BTreeMap;

use crate::commands::{Command, Request};
use crate::envelope::{EnumerateRequest, InvokeRequest, PropertyValue};
use crate::error::{Error, Result};
use crate::record::{Field, FieldMap, Fields};
use crate::return_code::RET_SUCCESS;
use crate::types::{BootDevice, BootMode, LifecycleControllerVersion};
use crate::uris::{DCIM_BOOT_CONFIG_SETTING, DCIM_BOOT_SOURCE_SETTING};
use crate::xml::Element;

const BOOT_MODE_FIELDS: FieldMap = FieldMap::new(
    "DCIM_BootConfigSetting",
    DCIM_BOOT_CONFIG_SETTING,
    &[
        Field::required("InstanceID"),
        Field::required("ElementName"),
        Field::required("IsCurrent"),
        Field::required("IsNext"),
    ],
);

const BOOT_DEVICE_FIELDS: FieldMap = FieldMap::new(
    "DCIM_BootSourceSetting",
    DCIM_BOOT_SOURCE_SETTING,
    &[
        Field::required("InstanceID"),
        Field::optional("BootSourceType", ""),
        Field::required("CurrentAssignedSequence"),
        Field::required("PendingAssignedSequence"),
        Field::optional("BIOSBootString", ""),
    ],
);

/// First Lifecycle Controller version (12th generation) that reports `BootSourceType`.
const LC_VERSION_12G: LifecycleControllerVersion = LifecycleControllerVersion::new(2, 0, 0);

/// List boot modes (`DCIM_BootConfigSetting`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ListBootModes;

impl Command for ListBootModes {
    type Output = Vec<BootMode>;

    fn request(&self) -> Result<Request> {
        Ok(Request::Enumerate(EnumerateRequest::new(
            DCIM_BOOT_CONFIG_SETTING,
        )))
    }

    fn parse_response(&self, response: &Element) -> Result<Self::Output> {
        BOOT_MODE_FIELDS.parse_all(response, |f| {
            Ok(BootMode {
                id: f.string("InstanceID"),
                name: f.string("ElementName"),
                is_current: flag(f, "IsCurrent", &[("1", true), ("2", false)])?,
                is_next: flag(f, "IsNext", &[("1", true), ("2", false), ("3", true)])?,
            })
        })
    }
}

fn flag(fields: &Fields<'_>, element: &str, table: &[(&str, bool)]) -> Result<bool> {
    let raw = fields.get(element).trim();
    table
        .iter()
        .find(|(code, _)| *code == raw)
        .map(|(_, value)| *value)
        .ok_or_else(|| Error::malformed(format!("unknown {element} value {raw:?}")))
}

/// How the boot mode of a boot device is determined.
///
/// Controllers older than Lifecycle Controller 2.0.0 do not report `BootSourceType`;
/// their `InstanceID` starts with the boot mode instead (`IPL:NIC.Embedded.1-1:...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootModeSource {
    /// Boot mode is the `InstanceID` prefix up to the first `:`.
    InstanceIdPrefix,
    /// Boot mode is the `BootSourceType` property.
    BootSourceType,
}

impl BootModeSource {
    /// Select the strategy for a controller running `version`.
    pub fn for_version(version: LifecycleControllerVersion) -> Self {
        if version < LC_VERSION_12G {
            Self::InstanceIdPrefix
        } else {
            Self::BootSourceType
        }
    }

    fn boot_mode(self, fields: &Fields<'_>) -> Result<String> {
        let mode = match self {
            Self::InstanceIdPrefix => fields.get("InstanceID").split(':').next().unwrap_or_default(),
            Self::BootSourceType => fields.get("BootSourceType"),
        };
        let mode = mode.trim();
        if mode.is_empty() {
            return Err(Error::malformed(format!(
                "cannot determine boot mode of boot device {:?}",
                fields.get("InstanceID")
            )));
        }
        Ok(mode.to_owned())
    }
}

/// List boot devices (`DCIM_BootSourceSetting`) grouped by boot mode.
///
/// Each group is sorted by pending assigned sequence.
#[derive(Debug, Clone, Copy)]
pub struct ListBootDevices {
    /// Boot-mode derivation for the controller being queried.
    pub source: BootModeSource,
}

impl ListBootDevices {
    /// Parse according to the given Lifecycle Controller version.
    pub fn for_version(version: LifecycleControllerVersion) -> Self {
        Self {
            source: BootModeSource::for_version(version),
        }
    }
}

impl Command for ListBootDevices {
    type Output = BTreeMap<String, Vec<BootDevice>>;

    fn request(&self) -> Result<Request> {
        Ok(Request::Enumerate(EnumerateRequest::new(
            DCIM_BOOT_SOURCE_SETTING,
        )))
    }

    fn parse_response(&self, response: &Element) -> Result<Self::Output> {
        let devices = BOOT_DEVICE_FIELDS.parse_all(response, |f| {
            Ok(BootDevice {
                id: f.string("InstanceID"),
                boot_mode: self.source.boot_mode(f)?,
                current_assigned_sequence: f.parse("CurrentAssignedSequence")?,
                pending_assigned_sequence: f.parse("PendingAssignedSequence")?,
                bios_boot_string: f.string("BIOSBootString"),
            })
        })?;

        let mut grouped: BTreeMap<String, Vec<BootDevice>> = BTreeMap::new();
        for device in devices {
            grouped
                .entry(device.boot_mode.clone())
                .or_default()
                .push(device);
        }
        for group in grouped.values_mut() {
            group.sort_by_key(|d| d.pending_assigned_sequence);
        }
        Ok(grouped)
    }
}

/// `DCIM_BootConfigSetting.ChangeBootOrderByInstanceID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBootOrder {
    /// Boot mode whose order changes (`IPL`, `UEFI`, ...).
    pub boot_mode: String,
    /// Device instance ids in the desired order.
    pub devices: PropertyValue,
}

impl ChangeBootOrder {
    /// Reorder `boot_mode` to `devices`.
    pub fn new(boot_mode: impl Into<String>, devices: impl Into<PropertyValue>) -> Self {
        Self {
            boot_mode: boot_mode.into(),
            devices: devices.into(),
        }
    }
}

impl Command for ChangeBootOrder {
    type Output = ();

    fn request(&self) -> Result<Request> {
        if self.devices.values().is_empty() {
            return Err(Error::invalid("boot order needs at least one device"));
        }
        Ok(Request::Invoke(
            InvokeRequest::new(DCIM_BOOT_CONFIG_SETTING, "ChangeBootOrderByInstanceID")
                .selector("InstanceID", self.boot_mode.as_str())
                .property("source", self.devices.clone())
                .expect_return_value(RET_SUCCESS),
        ))
    }

    fn parse_response(&self, _response: &Element) -> Result<Self::Output> {
        Ok(())
    }
}
