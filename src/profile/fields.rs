use crate::domain::FormKind;

/// HTML-ish input flavour used when a field is rendered as a live input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Email,
    Password,
    Tel,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Email => "email",
            InputKind::Password => "password",
            InputKind::Tel => "tel",
        }
    }
}

/// Declarative description of a single form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub input_kind: InputKind,
    /// Replace the value with the mask while the form is not being edited.
    pub mask_when_readonly: bool,
    /// Non-editable fields always render a fixed literal and never accept input.
    pub editable: bool,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, label: &'static str, input_kind: InputKind) -> Self {
        Self {
            name,
            label,
            input_kind,
            mask_when_readonly: false,
            editable: true,
        }
    }

    pub const fn masked(mut self) -> Self {
        self.mask_when_readonly = true;
        self
    }

    pub const fn fixed(mut self) -> Self {
        self.editable = false;
        self
    }
}

pub const PERSONAL_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("name", "Full name", InputKind::Text),
    FieldDescriptor::new("email", "Email", InputKind::Email),
    FieldDescriptor::new("password", "Password", InputKind::Password),
    FieldDescriptor::new("phoneNumber", "Phone number", InputKind::Tel),
    FieldDescriptor::new("address", "Address", InputKind::Text),
    FieldDescriptor::new("city", "City", InputKind::Text),
    FieldDescriptor::new("region", "Region", InputKind::Text),
    FieldDescriptor::new("country", "Country", InputKind::Text).fixed(),
];

pub const PAYMENT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("cardNumber", "Card number", InputKind::Text).masked(),
    FieldDescriptor::new("expirationDate", "Expiration date", InputKind::Text).masked(),
    FieldDescriptor::new("cvc", "CVC", InputKind::Password).masked(),
];

pub fn descriptors(kind: FormKind) -> &'static [FieldDescriptor] {
    match kind {
        FormKind::Personal => PERSONAL_FIELDS,
        FormKind::Payment => PAYMENT_FIELDS,
    }
}

pub fn descriptor(kind: FormKind, name: &str) -> Option<&'static FieldDescriptor> {
    descriptors(kind).iter().find(|field| field.name == name)
}

/// Section heading for each form.
pub fn form_title(kind: FormKind) -> &'static str {
    match kind {
        FormKind::Personal => "My personal data",
        FormKind::Payment => "Payment method",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FormRecord, PaymentData, PersonalData};

    fn names(kind: FormKind) -> Vec<&'static str> {
        descriptors(kind).iter().map(|field| field.name).collect()
    }

    #[test]
    fn descriptors_follow_record_shapes() {
        assert_eq!(names(FormKind::Personal), PersonalData::field_names());
        assert_eq!(names(FormKind::Payment), PaymentData::field_names());
    }

    #[test]
    fn only_country_is_fixed_and_only_payment_is_masked() {
        let fixed: Vec<_> = FormKind::ALL
            .iter()
            .flat_map(|kind| descriptors(*kind))
            .filter(|field| !field.editable)
            .map(|field| field.name)
            .collect();
        assert_eq!(fixed, vec!["country"]);

        assert!(PERSONAL_FIELDS.iter().all(|field| !field.mask_when_readonly));
        assert!(PAYMENT_FIELDS.iter().all(|field| field.mask_when_readonly));
    }

    #[test]
    fn lookup_by_name() {
        let cvc = descriptor(FormKind::Payment, "cvc").unwrap();
        assert_eq!(cvc.input_kind, InputKind::Password);
        assert!(descriptor(FormKind::Personal, "cvc").is_none());
    }
}
