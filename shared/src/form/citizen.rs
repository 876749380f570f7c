use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{digits_only, CitizenId, MIN_PHONE_DIGITS, MIN_PHONE_LOOKUP_DIGITS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitizenField {
    FirstName,
    MiddleName,
    LastName,
    SecondLastName,
    Phone,
    Email,
}

/// An existing citizen found by phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenRecord {
    pub citizen_id: CitizenId,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub second_last_name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CitizenLookupStatus {
    #[default]
    Idle,
    Searching {
        phone: String,
    },
    Found,
    NotFound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenForm {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub second_last_name: String,
    pub phone: String,
    pub email: String,
    existing_citizen_id: Option<CitizenId>,
    is_auto_filled: bool,
    lookup: CitizenLookupStatus,
}

impl CitizenForm {
    /// Pre-filled from an existing reporter.
    pub fn from_record(record: &CitizenRecord, phone: &str) -> Self {
        let mut form = Self {
            phone: digits_only(phone),
            ..Self::default()
        };
        form.fill_from(record);
        form
    }

    pub fn existing_citizen_id(&self) -> Option<CitizenId> {
        self.existing_citizen_id
    }

    pub fn is_auto_filled(&self) -> bool {
        self.is_auto_filled
    }

    pub fn lookup_status(&self) -> &CitizenLookupStatus {
        &self.lookup
    }

    pub fn is_phone_complete(&self) -> bool {
        self.phone.len() >= MIN_PHONE_DIGITS
    }

    /// Normalizes and stores the phone. Changing the phone of an auto-filled
    /// citizen drops the matched identity; once the user has taken over the
    /// fields the id stays. Returns the phone to look up when
    /// `lookup_enabled` and enough digits are present.
    pub fn set_phone(&mut self, raw: &str, lookup_enabled: bool) -> Option<String> {
        let phone = digits_only(raw);
        if phone == self.phone {
            return None;
        }

        self.phone = phone;
        if self.is_auto_filled {
            self.is_auto_filled = false;
            self.existing_citizen_id = None;
        }

        self.lookup = CitizenLookupStatus::Idle;
        self.request_lookup(lookup_enabled)
    }

    /// Starts a lookup for the current phone unless one is already in
    /// flight or answered.
    pub fn request_lookup(&mut self, lookup_enabled: bool) -> Option<String> {
        if !lookup_enabled
            || self.phone.len() < MIN_PHONE_LOOKUP_DIGITS
            || self.lookup != CitizenLookupStatus::Idle
        {
            return None;
        }
        self.lookup = CitizenLookupStatus::Searching {
            phone: self.phone.clone(),
        };
        Some(self.phone.clone())
    }

    /// Edits one field. The phone is routed through [`Self::set_phone`];
    /// any other edit only clears the auto-filled flag.
    pub fn edit_field(
        &mut self,
        field: CitizenField,
        value: String,
        lookup_enabled: bool,
    ) -> Option<String> {
        let slot = match field {
            CitizenField::Phone => return self.set_phone(&value, lookup_enabled),
            CitizenField::FirstName => &mut self.first_name,
            CitizenField::MiddleName => &mut self.middle_name,
            CitizenField::LastName => &mut self.last_name,
            CitizenField::SecondLastName => &mut self.second_last_name,
            CitizenField::Email => &mut self.email,
        };
        *slot = value;
        self.is_auto_filled = false;
        None
    }

    /// Applies a lookup answer. Answers for any phone other than the current
    /// one are discarded. Returns whether the form changed.
    pub fn apply_lookup(&mut self, phone: &str, record: Option<&CitizenRecord>) -> bool {
        if !self.awaits(phone) {
            debug!(phone, current = %self.phone, "discarding stale citizen lookup");
            return false;
        }

        match record {
            Some(record) => {
                self.fill_from(record);
                self.lookup = CitizenLookupStatus::Found;
            }
            None => {
                self.existing_citizen_id = None;
                self.is_auto_filled = false;
                self.lookup = CitizenLookupStatus::NotFound;
            }
        }
        true
    }

    /// A lookup failed in transit; the typed values are kept.
    pub fn fail_lookup(&mut self, phone: &str) {
        if self.awaits(phone) {
            self.lookup = CitizenLookupStatus::Idle;
        }
    }

    fn awaits(&self, phone: &str) -> bool {
        self.phone == phone
            && matches!(&self.lookup, CitizenLookupStatus::Searching { phone: p } if p == phone)
    }

    fn fill_from(&mut self, record: &CitizenRecord) {
        self.first_name = record.first_name.clone();
        self.middle_name = record.middle_name.clone().unwrap_or_default();
        self.last_name = record.last_name.clone();
        self.second_last_name = record.second_last_name.clone().unwrap_or_default();
        self.email = record.email.clone();
        self.existing_citizen_id = Some(record.citizen_id);
        self.is_auto_filled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CitizenRecord {
        CitizenRecord {
            citizen_id: CitizenId::new(77),
            first_name: "María".into(),
            middle_name: None,
            last_name: "López".into(),
            second_last_name: Some("García".into()),
            email: "maria@example.mx".into(),
        }
    }

    #[test]
    fn test_phone_is_digits_only() {
        let mut form = CitizenForm::default();
        form.set_phone("(844) 444-5555", false);
        assert_eq!(form.phone, "8444445555");
        assert!(form.is_phone_complete());
    }

    #[test]
    fn test_lookup_threshold_is_decoupled_from_completeness() {
        let mut form = CitizenForm::default();
        assert_eq!(form.set_phone("844444", true), None);
        assert_eq!(form.set_phone("8444445", true), Some("8444445".into()));
        assert!(!form.is_phone_complete());
        assert_eq!(
            form.lookup_status(),
            &CitizenLookupStatus::Searching {
                phone: "8444445".into()
            }
        );
    }

    #[test]
    fn test_lookup_disabled_never_requests() {
        let mut form = CitizenForm::default();
        assert_eq!(form.set_phone("8444445555", false), None);
        assert_eq!(form.lookup_status(), &CitizenLookupStatus::Idle);
    }

    #[test]
    fn test_found_fills_everything_but_phone() {
        let mut form = CitizenForm::default();
        form.set_phone("8444445555", true);
        assert!(form.apply_lookup("8444445555", Some(&record())));

        assert_eq!(form.first_name, "María");
        assert_eq!(form.middle_name, "");
        assert_eq!(form.second_last_name, "García");
        assert_eq!(form.phone, "8444445555");
        assert_eq!(form.existing_citizen_id(), Some(CitizenId::new(77)));
        assert!(form.is_auto_filled());
        assert_eq!(form.lookup_status(), &CitizenLookupStatus::Found);
    }

    #[test]
    fn test_not_found_keeps_typed_fields() {
        let mut form = CitizenForm::default();
        form.edit_field(CitizenField::FirstName, "Juan".into(), true);
        form.set_phone("8444445555", true);
        assert!(form.apply_lookup("8444445555", None));

        assert_eq!(form.first_name, "Juan");
        assert_eq!(form.existing_citizen_id(), None);
        assert!(!form.is_auto_filled());
        assert_eq!(form.lookup_status(), &CitizenLookupStatus::NotFound);
    }

    #[test]
    fn test_stale_lookup_is_discarded() {
        let mut form = CitizenForm::default();
        form.set_phone("8444445", true);
        form.set_phone("84444455", true);

        assert!(!form.apply_lookup("8444445", Some(&record())));
        assert_eq!(form.existing_citizen_id(), None);
        assert_eq!(form.first_name, "");
    }

    #[test]
    fn test_editing_other_field_keeps_existing_id() {
        let mut form = CitizenForm::default();
        form.set_phone("8444445555", true);
        form.apply_lookup("8444445555", Some(&record()));

        form.edit_field(CitizenField::LastName, "Lopez".into(), true);
        assert!(!form.is_auto_filled());
        assert_eq!(form.existing_citizen_id(), Some(CitizenId::new(77)));
    }

    #[test]
    fn test_phone_edit_drops_identity() {
        let mut form = CitizenForm::default();
        form.set_phone("8444445555", true);
        form.apply_lookup("8444445555", Some(&record()));

        form.edit_field(CitizenField::Phone, "844444555".into(), false);
        assert!(!form.is_auto_filled());
        assert_eq!(form.existing_citizen_id(), None);
    }

    #[test]
    fn test_phone_edit_after_manual_takeover_keeps_id() {
        let mut form = CitizenForm::default();
        form.set_phone("8444445555", true);
        form.apply_lookup("8444445555", Some(&record()));
        form.edit_field(CitizenField::Email, "maria@correo.mx".into(), true);

        assert_eq!(form.set_phone("8444445556", true), Some("8444445556".into()));
        assert_eq!(form.existing_citizen_id(), Some(CitizenId::new(77)));
        assert!(!form.is_auto_filled());
    }

    #[test]
    fn test_requested_lookup_is_not_repeated() {
        let mut form = CitizenForm::default();
        form.set_phone("8444445555", false);
        assert_eq!(form.request_lookup(true), Some("8444445555".into()));
        assert_eq!(form.request_lookup(true), None);

        form.apply_lookup("8444445555", None);
        assert_eq!(form.request_lookup(true), None);
    }

    #[test]
    fn test_unchanged_phone_is_a_no_op() {
        let mut form = CitizenForm::default();
        form.set_phone("8444445555", true);
        form.apply_lookup("8444445555", Some(&record()));

        assert_eq!(form.set_phone("844-444-5555", true), None);
        assert!(form.is_auto_filled());
    }

    #[test]
    fn test_failed_lookup_returns_to_idle() {
        let mut form = CitizenForm::default();
        form.set_phone("8444445555", true);
        form.fail_lookup("8444445555");
        assert_eq!(form.lookup_status(), &CitizenLookupStatus::Idle);
        assert!(!form.apply_lookup("8444445555", Some(&record())));
    }
}
