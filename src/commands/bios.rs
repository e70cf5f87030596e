use std::collections::BTreeMap;

use crate::commands::{Command, ConfigTarget, Request};
use crate::envelope::EnumerateRequest;
use crate::error::{Error, Result};
use crate::record::{Field, FieldMap, Fields};
use crate::return_code::RET_SUCCESS;
use crate::types::{BiosAttribute, BiosAttributeKind, BiosSetResult};
use crate::uris::{DCIM_BIOS_ENUMERATION, DCIM_BIOS_INTEGER, DCIM_BIOS_SERVICE, DCIM_BIOS_STRING};
use crate::xml::Element;

const ENUMERATION_FIELDS: FieldMap = FieldMap::new(
    "DCIM_BIOSEnumeration",
    DCIM_BIOS_ENUMERATION,
    &[
        Field::required("AttributeName"),
        Field::optional("CurrentValue", ""),
        Field::optional("PendingValue", ""),
        Field::optional("IsReadOnly", "false"),
        Field::repeated("PossibleValues"),
    ],
);

const STRING_FIELDS: FieldMap = FieldMap::new(
    "DCIM_BIOSString",
    DCIM_BIOS_STRING,
    &[
        Field::required("AttributeName"),
        Field::optional("CurrentValue", ""),
        Field::optional("PendingValue", ""),
        Field::optional("IsReadOnly", "false"),
        Field::optional("MinLength", ""),
        Field::optional("MaxLength", ""),
        Field::optional("ValueExpression", ""),
    ],
);

const INTEGER_FIELDS: FieldMap = FieldMap::new(
    "DCIM_BIOSInteger",
    DCIM_BIOS_INTEGER,
    &[
        Field::required("AttributeName"),
        Field::optional("CurrentValue", ""),
        Field::optional("PendingValue", ""),
        Field::optional("IsReadOnly", "false"),
        Field::optional("LowerBound", ""),
        Field::optional("UpperBound", ""),
    ],
);

/// One of the three CIM classes BIOS attributes are exposed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BiosAttributeClass {
    /// `DCIM_BIOSEnumeration`.
    Enumeration,
    /// `DCIM_BIOSString`.
    String,
    /// `DCIM_BIOSInteger`.
    Integer,
}

impl BiosAttributeClass {
    /// Every class, in the order they are listed.
    pub const ALL: [Self; 3] = [Self::Enumeration, Self::String, Self::Integer];

    fn fields(self) -> &'static FieldMap {
        match self {
            Self::Enumeration => &ENUMERATION_FIELDS,
            Self::String => &STRING_FIELDS,
            Self::Integer => &INTEGER_FIELDS,
        }
    }

    /// Resource URI of the class.
    pub fn resource_uri(self) -> &'static str {
        match self {
            Self::Enumeration => DCIM_BIOS_ENUMERATION,
            Self::String => DCIM_BIOS_STRING,
            Self::Integer => DCIM_BIOS_INTEGER,
        }
    }

    fn kind(self, f: &Fields<'_>) -> Result<BiosAttributeKind> {
        Ok(match self {
            Self::Enumeration => BiosAttributeKind::Enumeration {
                possible_values: f.list("PossibleValues").iter().map(|v| (*v).to_owned()).collect(),
            },
            Self::String => BiosAttributeKind::String {
                min_length: f.parse_opt("MinLength")?,
                max_length: f.parse_opt("MaxLength")?,
                pattern: non_empty(f.get("ValueExpression")),
            },
            Self::Integer => BiosAttributeKind::Integer {
                lower_bound: f.parse_opt("LowerBound")?,
                upper_bound: f.parse_opt("UpperBound")?,
            },
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// List the BIOS attributes of one class.
#[derive(Debug, Clone, Copy)]
pub struct ListBiosAttributes {
    /// Class to enumerate.
    pub class: BiosAttributeClass,
}

impl Command for ListBiosAttributes {
    type Output = Vec<BiosAttribute>;

    fn request(&self) -> Result<Request> {
        Ok(Request::Enumerate(EnumerateRequest::new(
            self.class.resource_uri(),
        )))
    }

    fn parse_response(&self, response: &Element) -> Result<Self::Output> {
        self.class.fields().parse_all(response, |f| {
            Ok(BiosAttribute {
                name: f.string("AttributeName"),
                current_value: non_empty(f.get("CurrentValue")),
                pending_value: non_empty(f.get("PendingValue")),
                read_only: f.get("IsReadOnly").trim().eq_ignore_ascii_case("true"),
                kind: self.class.kind(f)?,
            })
        })
    }
}

/// `DCIM_BIOSService.SetAttributes`: stage new BIOS attribute values.
///
/// Staged values take effect once a configuration job runs
/// (see [`CreateConfigJob`](crate::commands::CreateConfigJob)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetBiosAttributes {
    /// Attribute name to new value.
    pub settings: BTreeMap<String, String>,
}

impl SetBiosAttributes {
    /// Validate `settings` against the known attributes and keep only real changes.
    ///
    /// Returns `None` when every requested value is already the effective one.
    pub fn changes(
        attributes: &BTreeMap<String, BiosAttribute>,
        settings: BTreeMap<String, String>,
    ) -> Result<Option<Self>> {
        let mut changed = BTreeMap::new();
        for (name, value) in settings {
            let attribute = attributes
                .get(&name)
                .ok_or_else(|| Error::invalid(format!("unknown BIOS attribute {name}")))?;
            let effective = attribute
                .pending_value
                .as_deref()
                .or(attribute.current_value.as_deref());
            if effective == Some(value.as_str()) {
                continue;
            }
            attribute.validate(&value)?;
            changed.insert(name, value);
        }
        Ok((!changed.is_empty()).then_some(Self { settings: changed }))
    }
}

impl Command for SetBiosAttributes {
    type Output = BiosSetResult;

    fn request(&self) -> Result<Request> {
        if self.settings.is_empty() {
            return Err(Error::invalid("no BIOS attributes to set"));
        }
        let (names, values): (Vec<String>, Vec<String>) = self
            .settings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .unzip();
        Ok(Request::Invoke(
            ConfigTarget::bios()
                .invoke("SetAttributes")
                .property("AttributeName", names)
                .property("AttributeValue", values)
                .expect_return_value(RET_SUCCESS),
        ))
    }

    fn parse_response(&self, response: &Element) -> Result<Self::Output> {
        let commit_required = response
            .find(DCIM_BIOS_SERVICE, "RebootRequired")
            .is_some_and(|e| e.text().trim() == "Yes");
        Ok(BiosSetResult { commit_required })
    }
}
