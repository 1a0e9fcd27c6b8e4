use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ProfileError;

/// The two forms rendered on the profile page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Personal,
    Payment,
}

impl FormKind {
    pub const ALL: [FormKind; 2] = [FormKind::Personal, FormKind::Payment];

    pub fn as_str(self) -> &'static str {
        match self {
            FormKind::Personal => "personal",
            FormKind::Payment => "payment",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = ProfileError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "personal" => Ok(FormKind::Personal),
            "payment" => Ok(FormKind::Payment),
            other => Err(ProfileError::InvalidInput(format!(
                "unknown form `{}` (expected `personal` or `payment`)",
                other
            ))),
        }
    }
}

/// A single field whose value differs between two snapshots of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: String,
    pub new: String,
}

/// A flat record of string fields backing one form.
///
/// Implementors list their wire field names once; snapshotting, diffing and
/// the allow-list merge used by the loader are derived from that list.
pub trait FormRecord: Clone + Default + PartialEq + fmt::Debug {
    const FORM: FormKind;

    /// Field names in display order, as they appear in backend records.
    fn field_names() -> &'static [&'static str];

    fn get(&self, field: &str) -> Option<&str>;

    fn get_mut(&mut self, field: &str) -> Option<&mut String>;

    /// Copies only the keys this record already defines from `source`.
    ///
    /// Returns how many fields were copied.
    fn merge_from(&mut self, source: &Map<String, Value>) -> usize {
        let mut copied = 0;
        for key in Self::field_names() {
            let (Some(value), Some(slot)) = (source.get(*key), self.get_mut(key)) else {
                continue;
            };
            *slot = value_to_text(value);
            copied += 1;
        }
        copied
    }

    /// Field-wise comparison against `baseline`, in display order.
    fn diff(&self, baseline: &Self) -> Vec<FieldChange> {
        Self::field_names()
            .iter()
            .filter_map(|&field| {
                let old = baseline.get(field).unwrap_or_default();
                let new = self.get(field).unwrap_or_default();
                (old != new).then(|| FieldChange {
                    field,
                    old: old.to_string(),
                    new: new.to_string(),
                })
            })
            .collect()
    }

    /// The full record as a JSON object, ready for an update call.
    fn to_json(&self) -> Map<String, Value> {
        Self::field_names()
            .iter()
            .filter_map(|&field| {
                self.get(field)
                    .map(|value| (field.to_string(), Value::String(value.to_string())))
            })
            .collect()
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Personal data shown in the first form of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub address: String,
    pub city: String,
    pub region: String,
    pub country: String,
}

impl FormRecord for PersonalData {
    const FORM: FormKind = FormKind::Personal;

    fn field_names() -> &'static [&'static str] {
        &[
            "name",
            "email",
            "password",
            "phoneNumber",
            "address",
            "city",
            "region",
            "country",
        ]
    }

    fn get(&self, field: &str) -> Option<&str> {
        let value = match field {
            "name" => &self.name,
            "email" => &self.email,
            "password" => &self.password,
            "phoneNumber" => &self.phone_number,
            "address" => &self.address,
            "city" => &self.city,
            "region" => &self.region,
            "country" => &self.country,
            _ => return None,
        };
        Some(value.as_str())
    }

    fn get_mut(&mut self, field: &str) -> Option<&mut String> {
        match field {
            "name" => Some(&mut self.name),
            "email" => Some(&mut self.email),
            "password" => Some(&mut self.password),
            "phoneNumber" => Some(&mut self.phone_number),
            "address" => Some(&mut self.address),
            "city" => Some(&mut self.city),
            "region" => Some(&mut self.region),
            "country" => Some(&mut self.country),
            _ => None,
        }
    }
}

/// Card details shown in the payment form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentData {
    pub card_number: String,
    pub expiration_date: String,
    pub cvc: String,
}

impl FormRecord for PaymentData {
    const FORM: FormKind = FormKind::Payment;

    fn field_names() -> &'static [&'static str] {
        &["cardNumber", "expirationDate", "cvc"]
    }

    fn get(&self, field: &str) -> Option<&str> {
        match field {
            "cardNumber" => Some(self.card_number.as_str()),
            "expirationDate" => Some(self.expiration_date.as_str()),
            "cvc" => Some(self.cvc.as_str()),
            _ => None,
        }
    }

    fn get_mut(&mut self, field: &str) -> Option<&mut String> {
        match field {
            "cardNumber" => Some(&mut self.card_number),
            "expirationDate" => Some(&mut self.expiration_date),
            "cvc" => Some(&mut self.cvc),
            _ => None,
        }
    }
}
