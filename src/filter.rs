//! WQL filter queries for enumerations.

use core::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Eq(String, String),
    Ne(String, String),
}

/// A `select ... from <class> [where ...]` query.
///
/// Conditions are joined with `and`. Values are quoted; a value containing `"` or `\`
/// is rejected by [`FilterQuery::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    class: String,
    properties: Vec<String>,
    conditions: Vec<Condition>,
}

impl FilterQuery {
    /// `select * from <class>`.
    pub fn select_all(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            properties: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// `select <property> from <class>`.
    pub fn select(property: impl Into<String>, class: impl Into<String>) -> Self {
        Self::select_all(class).and_select(property)
    }

    /// Add a projected property.
    pub fn and_select(mut self, property: impl Into<String>) -> Self {
        self.properties.push(property.into());
        self
    }

    /// Require `property="value"`.
    pub fn equals(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::Eq(property.into(), value.into()));
        self
    }

    /// Require `property != "value"`.
    pub fn not_equals(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::Ne(property.into(), value.into()));
        self
    }

    /// Validate the values and render the query.
    pub fn build(&self) -> Result<String> {
        for condition in &self.conditions {
            let (Condition::Eq(property, value) | Condition::Ne(property, value)) = condition;
            if value.contains(['"', '\\']) {
                return Err(Error::invalid(format!(
                    "filter value for {property} must not contain quotes or backslashes: {value:?}"
                )));
            }
        }
        Ok(self.to_string())
    }
}

impl fmt::Display for FilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.properties.is_empty() {
            write!(f, "select * from {}", self.class)?;
        } else {
            write!(f, "select {} from {}", self.properties.join(","), self.class)?;
        }

        for (i, condition) in self.conditions.iter().enumerate() {
            f.write_str(if i == 0 { " where " } else { " and " })?;
            match condition {
                Condition::Eq(property, value) => write!(f, "{property}=\"{value}\"")?,
                Condition::Ne(property, value) => write!(f, "{property} != \"{value}\"")?,
            }
        }
        Ok(())
    }
}
