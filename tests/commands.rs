use std::collections::BTreeMap;

use drac::commands::{
    BiosAttributeClass, BootModeSource, ChangeBootOrder, Command, ConfigTarget, CreateConfigJob,
    GetJob, GetPowerState, ListBiosAttributes, ListBootDevices, ListBootModes, ListJobs, Request,
    SetBiosAttributes,
};
use drac::uris::{DCIM_BIOS_SERVICE, DCIM_BOOT_SOURCE_SETTING, DCIM_LIFECYCLE_JOB};
use drac::{BiosAttributeKind, Element, Error, LifecycleControllerVersion, PowerState};

fn fixture(name: &str) -> Element {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    let body = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {path}: {e}"));
    Element::parse(&body).expect("fixture parses")
}

#[test]
fn get_power_state_parses_enabled_state() {
    let state = GetPowerState
        .parse_response(&fixture("computer_system_enumeration_off.xml"))
        .expect("parse");
    assert_eq!(state, PowerState::PowerOff);
}

#[test]
fn power_state_names_round_trip() {
    for state in [PowerState::PowerOn, PowerState::PowerOff, PowerState::Reboot] {
        assert_eq!(state.to_string().parse::<PowerState>().expect("parse"), state);
    }
    assert!(matches!(
        "power_on".parse::<PowerState>(),
        Err(Error::InvalidParameterValue(_))
    ));
}

#[test]
fn list_boot_modes_decodes_flags() {
    let modes = ListBootModes
        .parse_response(&fixture("boot_config_setting_enumeration.xml"))
        .expect("parse");

    let ids: Vec<_> = modes.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["IPL", "HDD", "BCV", "UEFI", "OneTime"]);
    assert_eq!(modes.iter().filter(|m| m.is_current).count(), 1);
    assert_eq!(modes[4].name, "OneTimeBootMode");
}

#[test]
fn boot_mode_can_come_from_the_instance_id_prefix() {
    // 12G instance ids also start with the boot mode.
    let devices = ListBootDevices {
        source: BootModeSource::InstanceIdPrefix,
    }
    .parse_response(&fixture("boot_source_setting_enumeration.xml"))
    .expect("parse");

    assert_eq!(devices["IPL"].len(), 3);
    assert_eq!(devices["BCV"].len(), 1);
    assert_eq!(devices["UEFI"].len(), 1);
}

#[test]
fn boot_device_without_boot_mode_is_malformed() {
    let doc = Element::parse(&format!(
        r#"<Items xmlns:n1="{DCIM_BOOT_SOURCE_SETTING}"><n1:DCIM_BootSourceSetting>
             <n1:InstanceID>NIC.Embedded.1-1</n1:InstanceID>
             <n1:CurrentAssignedSequence>0</n1:CurrentAssignedSequence>
             <n1:PendingAssignedSequence>0</n1:PendingAssignedSequence>
           </n1:DCIM_BootSourceSetting></Items>"#
    ))
    .expect("parse");

    let err = ListBootDevices::for_version(LifecycleControllerVersion::new(2, 1, 0))
        .parse_response(&doc)
        .expect_err("no BootSourceType");
    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[test]
fn change_boot_order_requires_devices() {
    let err = ChangeBootOrder::new("IPL", Vec::<String>::new())
        .request()
        .expect_err("empty");
    assert!(matches!(err, Error::InvalidParameterValue(_)));
}

#[test]
fn list_jobs_fills_defaults_for_nil_fields() {
    let jobs = ListJobs::default()
        .parse_response(&fixture("lifecycle_job_enumeration.xml"))
        .expect("parse");

    let running = jobs.iter().find(|j| j.state == "Running").expect("running job");
    assert_eq!(running.id, "JID_442507917529");
    assert_eq!(running.percent_complete, "NA");

    let states: Vec<_> = jobs.iter().map(|j| j.state.as_str()).collect();
    assert_eq!(
        states,
        ["Pending", "Completed", "Scheduled", "Failed", "Reboot Completed", "Running"]
    );
}

#[test]
fn get_job_rejects_quotes_in_id() {
    let err = GetJob {
        id: r#"JID" or "1"="1"#.to_owned(),
    }
    .request()
    .expect_err("quote");
    assert!(matches!(err, Error::InvalidParameterValue(_)));
}

#[test]
fn get_job_targets_lifecycle_jobs() {
    let Request::Enumerate(request) = GetJob {
        id: "JID_442507917525".to_owned(),
    }
    .request()
    .expect("request") else {
        panic!("expected enumeration");
    };
    assert_eq!(request.resource_uri(), DCIM_LIFECYCLE_JOB);
}

#[test]
fn create_config_job_reads_job_id_from_selector() {
    let job_id = CreateConfigJob {
        target: ConfigTarget::bios(),
        reboot: false,
    }
    .parse_response(&fixture("create_targeted_config_job_ok.xml"))
    .expect("parse");
    assert_eq!(job_id, "JID_442507917525");
}

#[test]
fn custom_config_target_keeps_its_selectors() {
    let target = ConfigTarget::new(
        "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/DCIM_RAIDService",
        "DCIM_RAIDService",
        "DCIM:RAIDService",
        "RAID.Integrated.1-1",
    );
    let Request::Invoke(request) = CreateConfigJob {
        target,
        reboot: true,
    }
    .request()
    .expect("request") else {
        panic!("expected invocation");
    };

    assert_eq!(request.method(), "CreateTargetedConfigJob");
    assert_eq!(request.selectors()["Name"], "DCIM:RAIDService");
    assert_eq!(request.selectors()["SystemName"], "DCIM:ComputerSystem");
    assert_eq!(
        request.properties()["Target"].values(),
        ["RAID.Integrated.1-1".to_owned()]
    );
    assert_eq!(request.expected_return_value(), Some("4096"));
}

#[test]
fn bios_attribute_classes_parse_their_constraints() {
    let enumeration = ListBiosAttributes {
        class: BiosAttributeClass::Enumeration,
    }
    .parse_response(&fixture("bios_enumeration.xml"))
    .expect("parse");
    assert_eq!(enumeration.len(), 3);
    assert_eq!(
        enumeration[0].kind,
        BiosAttributeKind::Enumeration {
            possible_values: vec!["Enabled".to_owned(), "Disabled".to_owned()]
        }
    );

    let strings = ListBiosAttributes {
        class: BiosAttributeClass::String,
    }
    .parse_response(&fixture("bios_string.xml"))
    .expect("parse");
    let asset_tag = strings.iter().find(|a| a.name == "AssetTag").expect("AssetTag");
    assert_eq!(
        asset_tag.kind,
        BiosAttributeKind::String {
            min_length: Some(0),
            max_length: Some(10),
            pattern: Some("^[ -~]{0,10}$".to_owned()),
        }
    );
    assert!(asset_tag.validate("rack-42").is_ok());
    assert!(asset_tag.validate("r\u{e9}ck").is_err());
    assert!(asset_tag.validate("01234567890").is_err());

    let integers = ListBiosAttributes {
        class: BiosAttributeClass::Integer,
    }
    .parse_response(&fixture("bios_integer.xml"))
    .expect("parse");
    let cores = integers.iter().find(|a| a.name == "Proc1NumCores").expect("cores");
    assert!(cores.read_only);
    assert!(matches!(
        cores.validate("4"),
        Err(Error::InvalidParameterValue(ref m)) if m.contains("read-only")
    ));
}

#[test]
fn set_bios_attributes_sends_parallel_lists() {
    let command = SetBiosAttributes {
        settings: BTreeMap::from([
            ("MemTest".to_owned(), "Enabled".to_owned()),
            ("AssetTag".to_owned(), "rack-42".to_owned()),
        ]),
    };
    let Request::Invoke(request) = command.request().expect("request") else {
        panic!("expected invocation");
    };

    assert_eq!(request.resource_uri(), DCIM_BIOS_SERVICE);
    assert_eq!(
        request.properties()["AttributeName"].values(),
        ["AssetTag".to_owned(), "MemTest".to_owned()]
    );
    assert_eq!(
        request.properties()["AttributeValue"].values(),
        ["rack-42".to_owned(), "Enabled".to_owned()]
    );

    let result = command
        .parse_response(&fixture("set_attributes_ok.xml"))
        .expect("parse");
    assert!(result.commit_required);
}
