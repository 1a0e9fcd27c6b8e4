use uuid::Uuid;

use crate::config::Config;
use crate::domain::{
    FieldChange, FormKind, FormRecord, PaymentData, PersonalData, RecordId, UserRecord,
};
use crate::errors::{ProfileError, Result};
use crate::profile::form::{EditableForm, FormError, SubmitPlan};
use crate::profile::render::{DisplayOptions, FormView};
use crate::profile::validation::FieldValidator;
use crate::session::{Route, SessionContext};
use crate::storage::DataService;

/// Collection holding user records on the backend.
pub const USERS_COLLECTION: &str = "users";

/// Result of a successful "Guardar".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record was sent to the backend; these fields differed.
    Saved(Vec<FieldChange>),
    /// Nothing changed, so no call was made.
    Unchanged,
}

/// Controller for the profile page: both forms, the matched user id and the
/// data service used to load and persist them.
pub struct ProfilePage<S: DataService> {
    service: S,
    validator: FieldValidator,
    display: DisplayOptions,
    save_retries: u32,
    personal: EditableForm<PersonalData>,
    payment: EditableForm<PaymentData>,
    user_id: Option<RecordId>,
}

impl<S: DataService> ProfilePage<S> {
    pub fn new(service: S) -> Self {
        Self::with_config(service, &Config::default())
    }

    pub fn with_config(service: S, config: &Config) -> Self {
        let validator = FieldValidator::new().with_required_fields(config.require_non_empty);
        Self {
            service,
            validator,
            display: DisplayOptions::from(config),
            save_retries: config.save_retries,
            personal: EditableForm::new(validator),
            payment: EditableForm::new(validator),
            user_id: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn personal(&self) -> &EditableForm<PersonalData> {
        &self.personal
    }

    pub fn payment(&self) -> &EditableForm<PaymentData> {
        &self.payment
    }

    pub fn user_id(&self) -> Option<&RecordId> {
        self.user_id.as_ref()
    }

    /// Mounts the page: fetches the user collection and fills both forms from
    /// the entry matching the session email.
    ///
    /// Both forms are reset once the read succeeds; a failed read leaves them
    /// untouched. A missing session or an unmatched email leaves them empty
    /// and is not an error. Returns whether a user matched.
    pub fn load<C: SessionContext + ?Sized>(&mut self, session: &C) -> Result<bool> {
        let users = self.service.read(USERS_COLLECTION)?;

        self.personal = EditableForm::new(self.validator);
        self.payment = EditableForm::new(self.validator);
        self.user_id = None;

        let Some(email) = session.email() else {
            tracing::info!("no signed-in user; profile left empty");
            return Ok(false);
        };
        let Some(user) = users
            .iter()
            .filter_map(UserRecord::from_json)
            .find(|user| user.matches_email(email))
        else {
            tracing::info!(email, candidates = users.len(), "no user record matches the session");
            return Ok(false);
        };

        let source = user.to_map();
        let mut personal = PersonalData::default();
        let mut payment = PaymentData::default();
        let copied = personal.merge_from(&source) + payment.merge_from(&source);
        self.personal.replace_record(personal);
        self.payment.replace_record(payment);
        tracing::info!(user_id = %user.id, fields = copied, "profile loaded");
        self.user_id = Some(user.id);
        Ok(true)
    }

    /// "Cambiar" on `kind`.
    pub fn begin_edit(&mut self, kind: FormKind) -> Result<()> {
        match kind {
            FormKind::Personal => self.personal.begin_edit()?,
            FormKind::Payment => self.payment.begin_edit()?,
        }
        Ok(())
    }

    /// Input change on `kind`; returns the field's validation message.
    pub fn input(&mut self, kind: FormKind, field: &str, value: &str) -> Result<String> {
        let message = match kind {
            FormKind::Personal => self.personal.input(field, value)?,
            FormKind::Payment => self.payment.input(field, value)?,
        };
        Ok(message)
    }

    /// "Cancelar" on `kind`.
    pub fn cancel(&mut self, kind: FormKind) -> Result<()> {
        match kind {
            FormKind::Personal => self.personal.cancel()?,
            FormKind::Payment => self.payment.cancel()?,
        }
        Ok(())
    }

    /// "Guardar" on `kind`.
    pub fn save(&mut self, kind: FormKind) -> Result<SaveOutcome> {
        let user_id = self.user_id.as_ref();
        match kind {
            FormKind::Personal => persist(
                &mut self.personal,
                &mut self.service,
                user_id,
                self.save_retries,
            ),
            FormKind::Payment => persist(
                &mut self.payment,
                &mut self.service,
                user_id,
                self.save_retries,
            ),
        }
    }

    /// Clears the session and returns where the page navigates to.
    ///
    /// Pending edits are discarded without confirmation.
    pub fn log_out<C: SessionContext + ?Sized>(&mut self, session: &mut C) -> Result<Route> {
        if self.personal.is_editable() || self.payment.is_editable() {
            tracing::debug!("logging out with a form still in edit mode");
        }
        session.log_out()?;
        self.personal = EditableForm::new(self.validator);
        self.payment = EditableForm::new(self.validator);
        self.user_id = None;
        Ok(Route::Landing)
    }

    pub fn view(&self, kind: FormKind) -> FormView {
        match kind {
            FormKind::Personal => FormView::build(&self.personal, &self.display),
            FormKind::Payment => FormView::build(&self.payment, &self.display),
        }
    }
}

fn persist<R: FormRecord, S: DataService>(
    form: &mut EditableForm<R>,
    service: &mut S,
    user_id: Option<&RecordId>,
    retries: u32,
) -> Result<SaveOutcome> {
    if !form.is_editable() {
        return Err(FormError::NotEditing(R::FORM).into());
    }
    if form.is_saving() {
        return Err(FormError::SaveInFlight(R::FORM).into());
    }
    if form.has_errors() {
        return Err(FormError::SaveDisabled(R::FORM).into());
    }
    if user_id.is_none() && !form.changes().is_empty() {
        return Err(ProfileError::NoUserLoaded);
    }

    let (record, changes) = match form.submit()? {
        SubmitPlan::Unchanged => {
            tracing::debug!(form = %R::FORM, "nothing changed; no update sent");
            return Ok(SaveOutcome::Unchanged);
        }
        SubmitPlan::Persist { record, changes } => (record, changes),
    };
    let Some(id) = user_id else {
        form.finish_save(Err(ProfileError::NoUserLoaded.to_string()));
        return Err(ProfileError::NoUserLoaded);
    };

    let request = Uuid::new_v4();
    for change in &changes {
        tracing::debug!(%request, field = change.field, "field changed");
    }
    let payload = record.to_json();
    let mut attempt = 0;
    loop {
        attempt += 1;
        match service.update(id, &payload, USERS_COLLECTION) {
            Ok(_) => {
                form.finish_save(Ok(()));
                tracing::info!(%request, form = %R::FORM, user_id = %id, attempt, "profile saved");
                return Ok(SaveOutcome::Saved(changes));
            }
            // Retry transient storage failures only.
            Err(err @ ProfileError::Storage(_)) if attempt <= retries => {
                tracing::warn!(%request, form = %R::FORM, attempt, error = %err, "save failed; retrying");
            }
            Err(err) => {
                tracing::warn!(%request, form = %R::FORM, attempt, error = %err, "save failed");
                form.finish_save(Err(err.to_string()));
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use crate::storage::MemoryDataService;
    use serde_json::json;

    fn service() -> MemoryDataService {
        MemoryDataService::new().with_collection(
            USERS_COLLECTION,
            vec![
                json!({ "id": 1, "email": "luis@example.com", "name": "Luis" }),
                json!({
                    "id": 2,
                    "email": "Ana@Example.com",
                    "name": "Ana Torres",
                    "password": "secret",
                    "city": "Lima",
                    "country": "Peru",
                    "cardNumber": "4111111111111111",
                    "expirationDate": "09/27",
                    "cvc": "123",
                    "role": "customer"
                }),
            ],
        )
    }

    fn signed_in(email: &str) -> SessionStore {
        let mut session = SessionStore::in_memory();
        session.sign_in(email).unwrap();
        session
    }

    #[test]
    fn load_matches_email_case_insensitively() {
        let mut page = ProfilePage::new(service());
        assert!(page.load(&signed_in("ana@example.COM")).unwrap());
        assert_eq!(page.user_id(), Some(&RecordId::new("2")));
        assert_eq!(page.personal().record().name, "Ana Torres");
        assert_eq!(page.personal().record().country, "Peru");
        assert_eq!(page.payment().record().cvc, "123");
    }

    #[test]
    fn save_without_user_is_rejected() {
        let mut page = ProfilePage::new(service());
        page.load(&SessionStore::in_memory()).unwrap();
        page.begin_edit(FormKind::Personal).unwrap();
        page.input(FormKind::Personal, "city", "Cusco").unwrap();

        assert!(matches!(
            page.save(FormKind::Personal),
            Err(ProfileError::NoUserLoaded)
        ));
        assert!(page.personal().is_editable());
        assert!(page.service().calls().is_empty());
    }

    #[test]
    fn save_is_disabled_while_errors_exist() {
        let mut page = ProfilePage::new(service());
        page.load(&signed_in("ana@example.com")).unwrap();
        page.begin_edit(FormKind::Payment).unwrap();
        page.input(FormKind::Payment, "cvc", "12").unwrap();

        assert!(matches!(
            page.save(FormKind::Payment),
            Err(ProfileError::Form(FormError::SaveDisabled(FormKind::Payment)))
        ));
        assert!(page.payment().is_editable());
        assert!(page.service().calls().is_empty());
    }

    #[test]
    fn errors_in_one_form_do_not_disable_the_other() {
        let mut page = ProfilePage::new(service());
        page.load(&signed_in("ana@example.com")).unwrap();
        page.begin_edit(FormKind::Personal).unwrap();
        page.input(FormKind::Personal, "name", "A").unwrap();
        page.begin_edit(FormKind::Payment).unwrap();
        page.input(FormKind::Payment, "cvc", "4321").unwrap();

        assert!(!page.personal().can_save());
        assert!(page.payment().can_save());
        assert!(matches!(
            page.save(FormKind::Payment).unwrap(),
            SaveOutcome::Saved(_)
        ));
    }

    #[test]
    fn retry_once_then_surface_the_failure() {
        let mut page = ProfilePage::new(service());
        page.load(&signed_in("ana@example.com")).unwrap();
        page.begin_edit(FormKind::Personal).unwrap();
        page.input(FormKind::Personal, "city", "Cusco").unwrap();

        page.service.fail_next_updates(2);
        let err = page.save(FormKind::Personal).unwrap_err();
        assert!(matches!(err, ProfileError::Storage(_)));
        assert_eq!(page.service().calls().len(), 2);
        assert!(page.personal().is_editable());
        assert!(page.personal().last_error().is_some());
        assert_eq!(page.personal().record().city, "Cusco");

        let outcome = page.save(FormKind::Personal).unwrap();
        assert!(matches!(outcome, SaveOutcome::Saved(ref changes) if changes.len() == 1));
        assert_eq!(page.service().calls().len(), 3);
        assert!(!page.personal().is_editable());
    }

    #[test]
    fn a_single_transient_failure_is_absorbed_by_the_retry() {
        let mut page = ProfilePage::new(service());
        page.load(&signed_in("ana@example.com")).unwrap();
        page.begin_edit(FormKind::Payment).unwrap();
        page.input(FormKind::Payment, "expirationDate", "10/29").unwrap();

        page.service.fail_next_updates(1);
        assert!(page.save(FormKind::Payment).is_ok());
        let applied: Vec<_> = page.service().calls().iter().map(|call| call.applied).collect();
        assert_eq!(applied, vec![false, true]);
    }

    #[test]
    fn retries_can_be_disabled() {
        let config = Config {
            save_retries: 0,
            ..Config::default()
        };
        let mut page = ProfilePage::with_config(service(), &config);
        page.load(&signed_in("ana@example.com")).unwrap();
        page.begin_edit(FormKind::Payment).unwrap();
        page.input(FormKind::Payment, "cvc", "999").unwrap();

        page.service.fail_next_updates(1);
        assert!(page.save(FormKind::Payment).is_err());
        assert_eq!(page.service().calls().len(), 1);
    }

    #[test]
    fn missing_records_are_not_retried() {
        let mut page = ProfilePage::new(service());
        page.load(&signed_in("ana@example.com")).unwrap();
        page.begin_edit(FormKind::Personal).unwrap();
        page.input(FormKind::Personal, "city", "Puno").unwrap();

        page.service = std::mem::take(&mut page.service).with_collection(
            USERS_COLLECTION,
            vec![json!({ "id": 1, "email": "luis@example.com", "name": "Luis" })],
        );
        let err = page.save(FormKind::Personal).unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(_)));
        assert_eq!(page.service().calls().len(), 1);
        assert!(page.personal().is_editable());
        assert!(page.personal().last_error().is_some());
    }

    #[test]
    fn reload_discards_pending_edits() {
        let mut page = ProfilePage::new(service());
        let session = signed_in("ana@example.com");
        page.load(&session).unwrap();
        page.begin_edit(FormKind::Personal).unwrap();
        page.input(FormKind::Personal, "city", "Tacna").unwrap();

        page.load(&session).unwrap();
        assert!(!page.personal().is_editable());
        assert_eq!(page.personal().record().city, "Lima");
    }

    #[test]
    fn read_failures_leave_the_page_untouched() {
        let mut page = ProfilePage::new(service());
        let session = signed_in("ana@example.com");
        page.load(&session).unwrap();

        page.service.fail_reads(true);
        assert!(matches!(page.load(&session), Err(ProfileError::Storage(_))));
        assert_eq!(page.personal().record().name, "Ana Torres");
        assert_eq!(page.user_id(), Some(&RecordId::new("2")));
    }

    #[test]
    fn strict_validation_follows_config() {
        let config = Config {
            require_non_empty: true,
            ..Config::default()
        };
        let mut page = ProfilePage::with_config(service(), &config);
        page.load(&signed_in("ana@example.com")).unwrap();
        page.begin_edit(FormKind::Personal).unwrap();
        assert_eq!(
            page.input(FormKind::Personal, "email", " ").unwrap(),
            crate::profile::validation::EMPTY_FIELD
        );
    }
}
