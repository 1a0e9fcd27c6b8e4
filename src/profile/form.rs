use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::{FieldChange, FormKind, FormRecord};
use crate::profile::fields;
use crate::profile::validation::FieldValidator;

/// Misuse of a form's edit/submit state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("the {0} form is not in edit mode")]
    NotEditing(FormKind),
    #[error("the {0} form is already in edit mode")]
    AlreadyEditing(FormKind),
    #[error("unknown field `{field}` in the {form} form")]
    UnknownField { form: FormKind, field: String },
    #[error("field `{0}` is read-only")]
    ReadOnlyField(String),
    #[error("the {0} form has validation errors; fix them before saving")]
    SaveDisabled(FormKind),
    #[error("a save of the {0} form is already in progress")]
    SaveInFlight(FormKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// Masked/readonly values; the only action is "Cambiar".
    Viewing,
    /// Live inputs with "Cancelar" and "Guardar".
    Editing,
}

/// Per-field error messages; an empty string marks a valid field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMap {
    entries: BTreeMap<&'static str, String>,
}

impl ErrorMap {
    pub fn for_fields(names: &[&'static str]) -> Self {
        Self {
            entries: names.iter().map(|name| (*name, String::new())).collect(),
        }
    }

    pub fn get(&self, field: &str) -> &str {
        self.entries.get(field).map(String::as_str).unwrap_or_default()
    }

    fn set(&mut self, field: &str, message: String) {
        if let Some(slot) = self.entries.get_mut(field) {
            *slot = message;
        }
    }

    pub fn clear(&mut self) {
        for message in self.entries.values_mut() {
            message.clear();
        }
    }

    pub fn has_errors(&self) -> bool {
        self.entries.values().any(|message| !message.is_empty())
    }

    /// Fields currently carrying an error, with their messages.
    pub fn failing(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.entries
            .iter()
            .filter(|(_, message)| !message.is_empty())
            .map(|(field, message)| (*field, message.as_str()))
    }
}

/// What the caller must do after "Guardar".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitPlan<R> {
    /// Send `record` to the backend, then report back through
    /// [`EditableForm::finish_save`].
    Persist {
        record: R,
        changes: Vec<FieldChange>,
    },
    /// Nothing to send; the form already returned to viewing.
    Unchanged,
}

/// One editable record with its snapshot, errors and edit mode.
#[derive(Debug, Clone)]
pub struct EditableForm<R: FormRecord> {
    record: R,
    original: Option<R>,
    errors: ErrorMap,
    mode: FormMode,
    saving: bool,
    last_error: Option<String>,
    validator: FieldValidator,
}

impl<R: FormRecord> Default for EditableForm<R> {
    fn default() -> Self {
        Self::new(FieldValidator::default())
    }
}

impl<R: FormRecord> EditableForm<R> {
    pub fn new(validator: FieldValidator) -> Self {
        Self::with_record(R::default(), validator)
    }

    pub fn with_record(record: R, validator: FieldValidator) -> Self {
        Self {
            record,
            original: None,
            errors: ErrorMap::for_fields(R::field_names()),
            mode: FormMode::Viewing,
            saving: false,
            last_error: None,
            validator,
        }
    }

    pub fn kind(&self) -> FormKind {
        R::FORM
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn original(&self) -> Option<&R> {
        self.original.as_ref()
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn is_editable(&self) -> bool {
        self.mode == FormMode::Editing
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn has_errors(&self) -> bool {
        self.errors.has_errors()
    }

    /// Mirrors the enabled state of the "Guardar" button.
    pub fn can_save(&self) -> bool {
        self.is_editable() && !self.saving && !self.has_errors()
    }

    /// Message of the last failed save, kept until the next save or cancel.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replaces the record outside of edit mode, e.g. when data is loaded.
    pub fn replace_record(&mut self, record: R) {
        self.record = record;
    }

    /// "Cambiar": enter edit mode with a fresh snapshot of the record.
    pub fn begin_edit(&mut self) -> Result<(), FormError> {
        if self.is_editable() {
            return Err(FormError::AlreadyEditing(R::FORM));
        }
        self.original = Some(self.record.clone());
        self.last_error = None;
        self.mode = FormMode::Editing;
        Ok(())
    }

    /// Applies an input change and returns the field's error message.
    pub fn input(&mut self, field: &str, value: impl Into<String>) -> Result<String, FormError> {
        if !self.is_editable() {
            return Err(FormError::NotEditing(R::FORM));
        }
        let descriptor =
            fields::descriptor(R::FORM, field).ok_or_else(|| FormError::UnknownField {
                form: R::FORM,
                field: field.to_string(),
            })?;
        if !descriptor.editable {
            return Err(FormError::ReadOnlyField(field.to_string()));
        }
        let slot = self
            .record
            .get_mut(field)
            .ok_or_else(|| FormError::UnknownField {
                form: R::FORM,
                field: field.to_string(),
            })?;
        *slot = value.into();
        let message = self.validator.validate(R::FORM, field, slot);
        self.errors.set(field, message.clone());
        Ok(message)
    }

    /// "Cancelar": restore the snapshot and clear every error of this form.
    pub fn cancel(&mut self) -> Result<(), FormError> {
        if !self.is_editable() {
            return Err(FormError::NotEditing(R::FORM));
        }
        if self.saving {
            return Err(FormError::SaveInFlight(R::FORM));
        }
        if let Some(original) = self.original.take() {
            self.record = original;
        }
        self.errors.clear();
        self.last_error = None;
        self.mode = FormMode::Viewing;
        Ok(())
    }

    /// Field-wise differences between the record and its snapshot.
    pub fn changes(&self) -> Vec<FieldChange> {
        match &self.original {
            Some(original) => self.record.diff(original),
            None => Vec::new(),
        }
    }

    /// "Guardar": decide whether the record has to be persisted.
    ///
    /// An unchanged or invalid record goes straight back to viewing with the
    /// snapshot refreshed. Otherwise the form is marked as saving until
    /// [`finish_save`](Self::finish_save) is called.
    pub fn submit(&mut self) -> Result<SubmitPlan<R>, FormError> {
        if !self.is_editable() {
            return Err(FormError::NotEditing(R::FORM));
        }
        if self.saving {
            return Err(FormError::SaveInFlight(R::FORM));
        }
        let changes = self.changes();
        if changes.is_empty() || self.has_errors() {
            self.original = Some(self.record.clone());
            self.mode = FormMode::Viewing;
            return Ok(SubmitPlan::Unchanged);
        }
        self.saving = true;
        self.last_error = None;
        Ok(SubmitPlan::Persist {
            record: self.record.clone(),
            changes,
        })
    }

    /// Completes a save started by [`submit`](Self::submit).
    ///
    /// On failure the form stays in edit mode with the user's values and the
    /// original snapshot, so the save can be retried or cancelled.
    pub fn finish_save(&mut self, outcome: Result<(), String>) {
        self.saving = false;
        match outcome {
            Ok(()) => {
                self.original = Some(self.record.clone());
                self.last_error = None;
                self.mode = FormMode::Viewing;
            }
            Err(message) => self.last_error = Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PaymentData, PersonalData};
    use crate::profile::validation::{INVALID_CVC, NAME_TOO_SHORT};

    fn loaded_personal() -> EditableForm<PersonalData> {
        EditableForm::with_record(
            PersonalData {
                name: "Ana Torres".into(),
                email: "ana@example.com".into(),
                city: "Lima".into(),
                country: "PE".into(),
                ..PersonalData::default()
            },
            FieldValidator::default(),
        )
    }

    #[test]
    fn starts_viewing_without_errors() {
        let form = loaded_personal();
        assert_eq!(form.mode(), FormMode::Viewing);
        assert!(!form.has_errors());
        assert!(!form.can_save());
        assert!(form.original().is_none());
    }

    #[test]
    fn input_requires_edit_mode() {
        let mut form = loaded_personal();
        assert_eq!(
            form.input("city", "Cusco"),
            Err(FormError::NotEditing(FormKind::Personal))
        );
        assert_eq!(form.record().city, "Lima");
    }

    #[test]
    fn begin_edit_snapshots_current_record() {
        let mut form = loaded_personal();
        form.begin_edit().unwrap();
        assert_eq!(form.original(), Some(form.record()));
        assert_eq!(
            form.begin_edit(),
            Err(FormError::AlreadyEditing(FormKind::Personal))
        );
    }

    #[test]
    fn input_tracks_value_and_error() {
        let mut form = loaded_personal();
        form.begin_edit().unwrap();

        assert_eq!(form.input("name", "Al").unwrap(), NAME_TOO_SHORT);
        assert_eq!(form.record().name, "Al");
        assert_eq!(form.errors().get("name"), NAME_TOO_SHORT);
        assert!(!form.can_save());

        assert_eq!(form.input("name", "Alba").unwrap(), "");
        assert!(form.can_save());
    }

    #[test]
    fn country_and_unknown_fields_reject_input() {
        let mut form = loaded_personal();
        form.begin_edit().unwrap();
        assert_eq!(
            form.input("country", "Chile"),
            Err(FormError::ReadOnlyField("country".into()))
        );
        assert!(matches!(
            form.input("cvc", "123"),
            Err(FormError::UnknownField { .. })
        ));
        assert_eq!(form.record().country, "PE");
    }

    #[test]
    fn cancel_restores_snapshot_and_clears_errors() {
        let mut form = loaded_personal();
        let before = form.record().clone();
        form.begin_edit().unwrap();
        form.input("name", "X").unwrap();
        form.input("city", "Arequipa").unwrap();
        assert!(form.has_errors());

        form.cancel().unwrap();
        assert_eq!(form.record(), &before);
        assert!(!form.has_errors());
        assert_eq!(form.mode(), FormMode::Viewing);
        assert!(form.original().is_none());
        assert_eq!(form.cancel(), Err(FormError::NotEditing(FormKind::Personal)));
    }

    #[test]
    fn unchanged_submit_returns_to_viewing() {
        let mut form = loaded_personal();
        form.begin_edit().unwrap();
        assert_eq!(form.submit().unwrap(), SubmitPlan::Unchanged);
        assert_eq!(form.mode(), FormMode::Viewing);
        assert_eq!(form.original(), Some(form.record()));
    }

    #[test]
    fn retyping_the_same_value_is_not_a_change() {
        let mut form = loaded_personal();
        form.begin_edit().unwrap();
        form.input("city", "Cusco").unwrap();
        form.input("city", "Lima").unwrap();
        assert!(form.changes().is_empty());
        assert_eq!(form.submit().unwrap(), SubmitPlan::Unchanged);
    }

    #[test]
    fn failing_lists_only_fields_with_messages() {
        let mut form = EditableForm::<PaymentData>::default();
        form.begin_edit().unwrap();
        form.input("cvc", "12").unwrap();
        form.input("cardNumber", "4111 1111 1111 1111").unwrap();

        let failing: Vec<_> = form.errors().failing().collect();
        assert_eq!(failing, vec![("cvc", INVALID_CVC)]);

        form.input("cvc", "123").unwrap();
        assert_eq!(form.errors().failing().count(), 0);
    }

    #[test]
    fn submit_with_errors_does_not_persist() {
        let mut form = EditableForm::<PaymentData>::default();
        form.begin_edit().unwrap();
        assert_eq!(form.input("cvc", "12").unwrap(), INVALID_CVC);
        assert_eq!(form.submit().unwrap(), SubmitPlan::Unchanged);
        assert_eq!(form.mode(), FormMode::Viewing);
    }

    #[test]
    fn changed_submit_waits_for_save_result() {
        let mut form = loaded_personal();
        form.begin_edit().unwrap();
        form.input("city", "Cusco").unwrap();

        let plan = form.submit().unwrap();
        let SubmitPlan::Persist { record, changes } = plan else {
            panic!("expected a persist plan");
        };
        assert_eq!(record.city, "Cusco");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "city");
        assert!(form.is_saving());
        assert!(!form.can_save());
        assert_eq!(form.submit(), Err(FormError::SaveInFlight(FormKind::Personal)));
        assert_eq!(form.cancel(), Err(FormError::SaveInFlight(FormKind::Personal)));

        form.finish_save(Ok(()));
        assert_eq!(form.mode(), FormMode::Viewing);
        assert!(!form.is_saving());
        assert_eq!(form.original().map(|record| record.city.as_str()), Some("Cusco"));
    }

    #[test]
    fn failed_save_keeps_edits_and_allows_retry() {
        let mut form = loaded_personal();
        form.begin_edit().unwrap();
        form.input("region", "Cusco").unwrap();
        form.submit().unwrap();

        form.finish_save(Err("backend unavailable".into()));
        assert!(form.is_editable());
        assert_eq!(form.record().region, "Cusco");
        assert_eq!(form.original().map(|record| record.region.as_str()), Some(""));
        assert_eq!(form.last_error(), Some("backend unavailable"));
        assert!(form.can_save());

        form.cancel().unwrap();
        assert_eq!(form.record().region, "");
        assert!(form.last_error().is_none());
    }
}
