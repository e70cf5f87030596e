//! Resource URIs of the CIM classes this crate talks to.

const DMTF: &str = "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/";

/// BIOS attributes with a closed set of values.
pub const DCIM_BIOS_ENUMERATION: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/DCIM_BIOSEnumeration";
/// Integer BIOS attributes.
pub const DCIM_BIOS_INTEGER: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/DCIM_BIOSInteger";
/// Free-form string BIOS attributes.
pub const DCIM_BIOS_STRING: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/DCIM_BIOSString";
/// BIOS configuration service (`SetAttributes`, configuration jobs).
pub const DCIM_BIOS_SERVICE: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/DCIM_BIOSService";
/// Boot modes (IPL, BCV, UEFI, ...).
pub const DCIM_BOOT_CONFIG_SETTING: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/DCIM_BootConfigSetting";
/// Boot devices per boot mode.
pub const DCIM_BOOT_SOURCE_SETTING: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/DCIM_BootSourceSetting";
/// The managed host (power state).
pub const DCIM_COMPUTER_SYSTEM: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/DCIM_ComputerSystem";
/// Job queue service.
pub const DCIM_JOB_SERVICE: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/DCIM_JobService";
/// Lifecycle Controller jobs. Note the vendor schema root.
pub const DCIM_LIFECYCLE_JOB: &str =
    "http://schemas.dell.com/wbem/wscim/1/cim-schema/2/DCIM_LifecycleJob";
/// System inventory view (Lifecycle Controller version, ...).
pub const DCIM_SYSTEM_VIEW: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/DCIM_SystemView";

/// Resource URI for an arbitrary class under the DMTF schema root.
pub fn dmtf(class: &str) -> String {
    format!("{DMTF}{class}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dmtf_matches_constants() {
        assert_eq!(dmtf("DCIM_ComputerSystem"), DCIM_COMPUTER_SYSTEM);
        assert_eq!(dmtf("DCIM_BIOSService"), DCIM_BIOS_SERVICE);
        assert!(DCIM_LIFECYCLE_JOB.starts_with("http://schemas.dell.com/"));
    }
}
