//! The pothole dialog's form controller.
//!
//! Keeps a four-level geographic selection, a postal code and an optional
//! citizen identity consistent while three independent lookups (reverse
//! postal, forward postal, citizen by phone) resolve in any order. User
//! operations return the [`Lookup`]s they need; the caller runs them and
//! feeds the answers back through the `apply_*` methods, which drop any
//! answer the form has moved past.

pub mod citizen;
pub mod location;
pub mod mode;
pub mod photo;
pub mod postal;
pub mod submit;

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

pub use citizen::{CitizenField, CitizenForm, CitizenLookupStatus, CitizenRecord};
pub use location::{
    child_directories, DirectoryEntry, DirectoryKey, LocationSelection, LocationTriple, StreetSlot,
};
pub use mode::{CreateMode, DialogMode, EditMode, PayloadBuilder, PotholeParts};
pub use photo::{LocalFile, PhotoPlan, PhotoState};
pub use postal::{PostalCode, PostalCodeField, PostalCodeSource};
pub use submit::{PotholeWrite, StepOutput, SubmitAction, SubmitNext, SubmitStage, SubmitStep};

use crate::api::PotholeResponseDto;
use crate::{
    CategoryId, DialogId, LocalityId, MunicipalityId, StateId, StreetId,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("the form is not ready to submit")]
    NotReady,

    #[error("a submission is already in flight")]
    AlreadySubmitting,

    #[error("no submission is in flight")]
    NotSubmitting,

    #[error("unexpected {got:?} result while awaiting {expected:?}")]
    UnexpectedOutput {
        expected: Option<SubmitStage>,
        got: SubmitStage,
    },

    #[error("missing {0}")]
    Missing(&'static str),
}

/// A remote read the form needs answered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lookup {
    Directory(DirectoryKey),
    ReversePostal(LocationTriple),
    ForwardPostal(String),
    Citizen(String),
}

#[derive(Debug, Clone)]
pub struct PotholeForm {
    id: DialogId,
    mode: DialogMode,
    location: LocationSelection,
    postal: PostalCodeField,
    citizen: CitizenForm,
    is_citizen_report: bool,
    category: Option<CategoryId>,
    photo: PhotoState,
    directories: HashMap<DirectoryKey, Vec<DirectoryEntry>>,
    submission: Option<submit::Submission>,
}

impl PotholeForm {
    pub fn create(id: DialogId) -> (Self, Vec<Lookup>) {
        let form = Self {
            id,
            mode: DialogMode::Create(CreateMode::default()),
            location: LocationSelection::default(),
            postal: PostalCodeField::default(),
            citizen: CitizenForm::default(),
            is_citizen_report: false,
            category: None,
            photo: PhotoState::default(),
            directories: HashMap::new(),
            submission: None,
        };
        let lookups = vec![
            Lookup::Directory(DirectoryKey::States),
            Lookup::Directory(DirectoryKey::Categories),
        ];
        (form, lookups)
    }

    /// Edit form seeded from a fetched record. The stored postal code counts
    /// as derived, and a recorded reporter counts as auto-filled.
    pub fn edit(id: DialogId, record: &PotholeResponseDto) -> (Self, Vec<Lookup>) {
        let stored = record.location.as_ref();

        let location = stored
            .map(|l| {
                LocationSelection::from_parts(
                    Some(l.triple()),
                    Some(l.main_street.street_id),
                    l.street_one.as_ref().map(|s| s.street_id),
                    l.street_two.as_ref().map(|s| s.street_id),
                )
            })
            .unwrap_or_default();

        let postal = PostalCodeField::from_derived(
            stored
                .and_then(|l| l.postal_code)
                .map(postal::render)
                .unwrap_or_default(),
        );

        let citizen = record
            .reporter_citizen
            .as_ref()
            .map(|r| CitizenForm::from_record(&r.record(), &r.phone()))
            .unwrap_or_default();

        let mut lookups = vec![
            Lookup::Directory(DirectoryKey::States),
            Lookup::Directory(DirectoryKey::Categories),
        ];
        lookups.extend(child_directories(&location).into_iter().map(Lookup::Directory));

        let form = Self {
            id,
            mode: DialogMode::Edit(EditMode {
                pothole_id: record.pothole_id,
                original_location: location.clone(),
                original_location_id: stored.map(|l| l.location_id),
            }),
            location,
            postal,
            citizen,
            is_citizen_report: record.reporter_citizen.is_some(),
            category: record.category.as_ref().map(|c| c.category_id),
            photo: PhotoState::with_existing(record.photo_url.clone()),
            directories: HashMap::new(),
            submission: None,
        };
        (form, lookups)
    }

    pub fn id(&self) -> DialogId {
        self.id
    }

    pub fn mode(&self) -> &DialogMode {
        &self.mode
    }

    pub fn location(&self) -> &LocationSelection {
        &self.location
    }

    pub fn postal_code(&self) -> &PostalCode {
        self.postal.code()
    }

    pub fn citizen(&self) -> &CitizenForm {
        &self.citizen
    }

    pub fn is_citizen_report(&self) -> bool {
        self.is_citizen_report
    }

    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn photo(&self) -> &PhotoState {
        &self.photo
    }

    /// `None` outside create mode.
    pub fn is_confirmed(&self) -> Option<bool> {
        match &self.mode {
            DialogMode::Create(mode) => Some(mode.confirmed),
            DialogMode::Edit(_) => None,
        }
    }

    pub fn directory(&self, key: DirectoryKey) -> &[DirectoryEntry] {
        self.directories.get(&key).map_or(&[][..], Vec::as_slice)
    }

    pub fn set_state(&mut self, state_id: Option<StateId>) -> Vec<Lookup> {
        if !self.editable("set_state") {
            return Vec::new();
        }
        self.location.set_state(state_id);
        self.postal.reset();
        state_id
            .and_then(|id| self.missing_directory(DirectoryKey::Municipalities(id)))
            .into_iter()
            .collect()
    }

    pub fn set_municipality(&mut self, municipality_id: Option<MunicipalityId>) -> Vec<Lookup> {
        if !self.editable("set_municipality") {
            return Vec::new();
        }
        if !self.location.set_municipality(municipality_id) {
            debug!(?municipality_id, "ignoring municipality without a state");
            return Vec::new();
        }
        self.postal.reset();
        municipality_id
            .and_then(|id| self.missing_directory(DirectoryKey::Localities(id)))
            .into_iter()
            .collect()
    }

    pub fn set_locality(&mut self, locality_id: Option<LocalityId>) -> Vec<Lookup> {
        if !self.editable("set_locality") {
            return Vec::new();
        }
        if !self.location.set_locality(locality_id) {
            debug!(?locality_id, "ignoring locality without a municipality");
            return Vec::new();
        }
        self.postal.reset();

        let mut lookups: Vec<Lookup> = locality_id
            .and_then(|id| self.missing_directory(DirectoryKey::Streets(id)))
            .into_iter()
            .collect();
        if let Some(triple) = self.location.triple() {
            lookups.push(Lookup::ReversePostal(triple));
        }
        lookups
    }

    pub fn set_street(&mut self, slot: StreetSlot, street_id: Option<StreetId>) -> bool {
        self.editable("set_street") && self.location.set_street(slot, street_id)
    }

    pub fn set_postal_code(&mut self, raw: &str) -> Vec<Lookup> {
        if !self.editable("set_postal_code") {
            return Vec::new();
        }
        self.postal
            .type_in(raw)
            .map(Lookup::ForwardPostal)
            .into_iter()
            .collect()
    }

    pub fn set_phone(&mut self, raw: &str) -> Vec<Lookup> {
        if !self.editable("set_phone") {
            return Vec::new();
        }
        let lookup_enabled = self.citizen_lookup_enabled();
        self.citizen
            .set_phone(raw, lookup_enabled)
            .map(Lookup::Citizen)
            .into_iter()
            .collect()
    }

    pub fn edit_citizen_field(&mut self, field: CitizenField, value: String) -> Vec<Lookup> {
        if !self.editable("edit_citizen_field") {
            return Vec::new();
        }
        let lookup_enabled = self.citizen_lookup_enabled();
        self.citizen
            .edit_field(field, value, lookup_enabled)
            .map(Lookup::Citizen)
            .into_iter()
            .collect()
    }

    /// Toggles the reporting citizen. Turning it on with a phone already
    /// typed looks that phone up.
    pub fn set_citizen_report(&mut self, enabled: bool) -> Vec<Lookup> {
        if !self.editable("set_citizen_report") {
            return Vec::new();
        }
        self.is_citizen_report = enabled;
        let lookup_enabled = self.citizen_lookup_enabled();
        self.citizen
            .request_lookup(lookup_enabled)
            .map(Lookup::Citizen)
            .into_iter()
            .collect()
    }

    pub fn set_category(&mut self, category: Option<CategoryId>) {
        if self.editable("set_category") {
            self.category = category;
        }
    }

    pub fn set_confirmation(&mut self, confirmed: bool) {
        if !self.editable("set_confirmation") {
            return;
        }
        if let DialogMode::Create(mode) = &mut self.mode {
            mode.confirmed = confirmed;
        }
    }

    pub fn select_photo(&mut self, file: Option<LocalFile>) {
        if self.editable("select_photo") {
            self.photo.select_file(file);
        }
    }

    pub fn mark_photo_for_deletion(&mut self) {
        if self.editable("mark_photo_for_deletion") {
            self.photo.mark_for_deletion();
        }
    }

    /// Stores a directory. A create form with no state yet picks the first one listed.
    pub fn apply_directory(&mut self, key: DirectoryKey, entries: Vec<DirectoryEntry>) -> Vec<Lookup> {
        let default_state = (key == DirectoryKey::States
            && self.mode.is_create()
            && self.location.state_id().is_none()
            && self.submission.is_none())
        .then(|| entries.first().map(|e| StateId::new(e.id)))
        .flatten();

        self.directories.insert(key, entries);

        match default_state {
            Some(state_id) => self.set_state(Some(state_id)),
            None => Vec::new(),
        }
    }

    /// Applies a reverse postal answer for `triple`. Returns whether the code changed.
    pub fn apply_reverse_postal(&mut self, triple: LocationTriple, code: Option<String>) -> bool {
        if self.location.triple() != Some(triple) {
            debug!(?triple, "discarding reverse postal lookup for a previous location");
            return false;
        }
        let Some(code) = code.filter(|c| !c.is_empty()) else {
            return false;
        };
        if !self.postal.accepts_derived() {
            debug!(
                code,
                typed = self.postal.value(),
                "keeping typed postal code while its forward lookup is pending"
            );
            return false;
        }
        self.postal.derive(code)
    }

    /// Applies a forward postal answer for `code`: the first candidate wins.
    pub fn apply_forward_postal(&mut self, code: &str, candidates: &[LocationTriple]) -> Vec<Lookup> {
        if !self.postal.awaits_forward(code) || self.submission.is_some() {
            debug!(code, "discarding forward postal lookup");
            self.postal.settle_forward(code);
            return Vec::new();
        }
        self.postal.settle_forward(code);

        let Some(first) = candidates.first().copied() else {
            debug!(code, "postal code matched no location");
            return Vec::new();
        };

        self.location.adopt_triple(first);
        self.postal.adopt();

        let mut lookups: Vec<Lookup> = child_directories(&self.location)
            .into_iter()
            .filter_map(|key| self.missing_directory(key))
            .collect();
        lookups.push(Lookup::ReversePostal(first));
        lookups
    }

    /// The forward lookup for `code` never answered; reverse answers may apply again.
    pub fn fail_forward_postal(&mut self, code: &str) {
        self.postal.settle_forward(code);
    }

    pub fn apply_citizen_lookup(&mut self, phone: &str, record: Option<&CitizenRecord>) -> bool {
        if self.submission.is_some() {
            return false;
        }
        self.citizen.apply_lookup(phone, record)
    }

    pub fn fail_citizen_lookup(&mut self, phone: &str) {
        self.citizen.fail_lookup(phone);
    }

    pub fn is_ready_to_submit(&self) -> bool {
        let confirmed = !self.mode.builder().requires_confirmation()
            || self.is_confirmed().unwrap_or(false);

        self.location.is_complete() && self.category.is_some() && confirmed && self.submission.is_none()
    }

    pub fn submit_step(&self) -> Option<SubmitStep> {
        self.submission.as_ref().map(submit::Submission::step)
    }

    fn citizen_lookup_enabled(&self) -> bool {
        self.is_citizen_report && self.mode.builder().looks_up_citizens()
    }

    fn missing_directory(&self, key: DirectoryKey) -> Option<Lookup> {
        (!self.directories.contains_key(&key)).then_some(Lookup::Directory(key))
    }

    fn editable(&self, operation: &'static str) -> bool {
        if self.submission.is_some() {
            debug!(operation, "form is locked while submitting");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        CategoryDto, LocalityRef, MunicipalityRef, PotholeLocationDto, ReporterDto, StateRef,
        StreetRef,
    };
    use crate::{CitizenId, LocationId, PotholeId};

    fn triple(s: u64, m: u64, l: u64) -> LocationTriple {
        LocationTriple {
            state_id: StateId::new(s),
            municipality_id: MunicipalityId::new(m),
            locality_id: LocalityId::new(l),
        }
    }

    fn create_form() -> PotholeForm {
        PotholeForm::create(DialogId::generate()).0
    }

    fn select(form: &mut PotholeForm, s: u64, m: u64, l: u64) -> Vec<Lookup> {
        form.set_state(Some(StateId::new(s)));
        form.set_municipality(Some(MunicipalityId::new(m)));
        form.set_locality(Some(LocalityId::new(l)))
    }

    fn record() -> PotholeResponseDto {
        PotholeResponseDto {
            pothole_id: PotholeId::new(31),
            reporter_citizen: Some(ReporterDto {
                citizen_id: CitizenId::new(7),
                first_name: "Ana".into(),
                middle_name: None,
                last_name: "Ruiz".into(),
                second_last_name: None,
                email: "ana@example.mx".into(),
                phone_number: Some(8_444_445_555),
            }),
            registered_by_user: None,
            location: Some(PotholeLocationDto {
                location_id: LocationId::new(4),
                state: StateRef {
                    state_id: StateId::new(5),
                    state_name: "Coahuila".into(),
                },
                municipality: MunicipalityRef {
                    municipality_id: MunicipalityId::new(12),
                    municipality_name: "Saltillo".into(),
                },
                locality: LocalityRef {
                    locality_id: LocalityId::new(44),
                    locality_name: "Centro".into(),
                },
                postal_code: Some(25000),
                main_street: StreetRef {
                    street_id: StreetId::new(1),
                    street_name: "Victoria".into(),
                },
                street_one: None,
                street_two: None,
            }),
            category: Some(CategoryDto {
                category_id: CategoryId::new(2),
                category_name: "Grave".into(),
                description: None,
                priority_level: None,
            }),
            status: "REPORTED".into(),
            photo_url: Some("http://localhost:31234/uploads/a.jpg".into()),
            date_reported: None,
            date_validated: None,
            date_closed: None,
            is_active: true,
        }
    }

    mod cascade {
        use super::*;

        #[test]
        fn test_parent_change_resets_postal_code() {
            let mut form = create_form();
            select(&mut form, 5, 12, 44);
            assert!(form.apply_reverse_postal(triple(5, 12, 44), Some("25000".into())));

            form.set_municipality(Some(MunicipalityId::new(13)));
            assert_eq!(form.postal_code(), &PostalCode::UserAuthored(String::new()));
            assert_eq!(form.location().locality_id(), None);
        }

        #[test]
        fn test_locality_emits_streets_and_reverse_lookup() {
            let mut form = create_form();
            let lookups = select(&mut form, 5, 12, 44);
            assert_eq!(
                lookups,
                vec![
                    Lookup::Directory(DirectoryKey::Streets(LocalityId::new(44))),
                    Lookup::ReversePostal(triple(5, 12, 44)),
                ]
            );
        }

        #[test]
        fn test_loaded_directories_are_not_requested_again() {
            let mut form = create_form();
            form.apply_directory(
                DirectoryKey::Municipalities(StateId::new(5)),
                vec![DirectoryEntry::new(12, "Saltillo")],
            );
            assert!(form.set_state(Some(StateId::new(5))).is_empty());
            assert_eq!(
                form.directory(DirectoryKey::Municipalities(StateId::new(5))).len(),
                1
            );
        }

        #[test]
        fn test_create_mode_defaults_to_first_state() {
            let mut form = create_form();
            let lookups = form.apply_directory(
                DirectoryKey::States,
                vec![DirectoryEntry::new(5, "Coahuila"), DirectoryEntry::new(6, "Colima")],
            );
            assert_eq!(form.location().state_id(), Some(StateId::new(5)));
            assert_eq!(
                lookups,
                vec![Lookup::Directory(DirectoryKey::Municipalities(StateId::new(5)))]
            );

            let again = form.apply_directory(DirectoryKey::States, vec![DirectoryEntry::new(6, "Colima")]);
            assert!(again.is_empty());
            assert_eq!(form.location().state_id(), Some(StateId::new(5)));
        }
    }

    mod postal_reconciliation {
        use super::*;

        #[test]
        fn test_reverse_lookup_for_previous_location_is_discarded() {
            let mut form = create_form();
            select(&mut form, 5, 12, 44);
            form.set_locality(Some(LocalityId::new(45)));

            assert!(!form.apply_reverse_postal(triple(5, 12, 44), Some("25000".into())));
            assert_eq!(form.postal_code().value(), "");
        }

        #[test]
        fn test_typed_code_survives_reverse_lookup_while_forward_pending() {
            let mut form = create_form();
            select(&mut form, 5, 12, 44);
            let lookups = form.set_postal_code("12345");
            assert_eq!(lookups, vec![Lookup::ForwardPostal("12345".into())]);

            assert!(!form.apply_reverse_postal(triple(5, 12, 44), Some("25000".into())));
            assert_eq!(form.postal_code(), &PostalCode::UserAuthored("12345".into()));
        }

        #[test]
        fn test_forward_lookup_moves_location_and_flips_source() {
            let mut form = create_form();
            select(&mut form, 5, 12, 44);
            form.set_street(StreetSlot::Main, Some(StreetId::new(1)));
            form.set_postal_code("25999");

            let lookups = form.apply_forward_postal("25999", &[triple(5, 12, 90), triple(5, 12, 91)]);

            assert_eq!(form.location().triple(), Some(triple(5, 12, 90)));
            assert_eq!(form.location().street(StreetSlot::Main), None);
            assert_eq!(form.postal_code(), &PostalCode::Derived("25999".into()));
            assert!(lookups.contains(&Lookup::ReversePostal(triple(5, 12, 90))));
            assert!(lookups.contains(&Lookup::Directory(DirectoryKey::Streets(LocalityId::new(90)))));
        }

        #[test]
        fn test_forward_lookup_applies_once() {
            let mut form = create_form();
            form.set_postal_code("25999");
            form.apply_forward_postal("25999", &[triple(5, 12, 90)]);
            form.set_street(StreetSlot::Main, Some(StreetId::new(3)));
            let snapshot = form.location().clone();

            assert!(form.apply_forward_postal("25999", &[triple(5, 12, 90)]).is_empty());
            assert_eq!(form.location(), &snapshot);
        }

        #[test]
        fn test_forward_lookup_for_superseded_code_is_discarded() {
            let mut form = create_form();
            form.set_postal_code("25999");
            form.set_postal_code("25998");
            assert!(form.apply_forward_postal("25999", &[triple(5, 12, 90)]).is_empty());
            assert_eq!(form.location().triple(), None);
        }

        #[test]
        fn test_empty_forward_answer_releases_typed_code() {
            let mut form = create_form();
            select(&mut form, 5, 12, 44);
            form.set_postal_code("99999");
            assert!(form.apply_forward_postal("99999", &[]).is_empty());
            assert_eq!(form.location().triple(), Some(triple(5, 12, 44)));

            assert!(form.apply_reverse_postal(triple(5, 12, 44), Some("25000".into())));
            assert_eq!(form.postal_code(), &PostalCode::Derived("25000".into()));
        }
    }

    mod citizen_rules {
        use super::*;

        fn found() -> CitizenRecord {
            CitizenRecord {
                citizen_id: CitizenId::new(77),
                first_name: "María".into(),
                middle_name: None,
                last_name: "López".into(),
                second_last_name: None,
                email: "maria@example.mx".into(),
            }
        }

        #[test]
        fn test_lookup_requires_citizen_report() {
            let mut form = create_form();
            assert!(form.set_phone("8444445555").is_empty());

            form.set_citizen_report(true);
            assert_eq!(
                form.set_phone("8444445556"),
                vec![Lookup::Citizen("8444445556".into())]
            );
        }

        #[test]
        fn test_enabling_citizen_report_looks_up_typed_phone() {
            let mut form = create_form();
            form.set_phone("8444445555");

            assert_eq!(
                form.set_citizen_report(true),
                vec![Lookup::Citizen("8444445555".into())]
            );
            form.set_citizen_report(false);
            assert!(form.set_citizen_report(true).is_empty());
        }

        #[test]
        fn test_enabling_citizen_report_with_short_phone_waits() {
            let mut form = create_form();
            form.set_phone("844444");
            assert!(form.set_citizen_report(true).is_empty());
        }

        #[test]
        fn test_edit_mode_never_looks_up() {
            let (mut form, _) = PotholeForm::edit(DialogId::generate(), &record());
            assert!(form.is_citizen_report());
            assert!(form.set_phone("8444440000").is_empty());
            assert_eq!(form.citizen().existing_citizen_id(), None);
        }

        #[test]
        fn test_autofill_then_edit_keeps_id() {
            let mut form = create_form();
            form.set_citizen_report(true);
            form.set_phone("8444445555");
            assert!(form.apply_citizen_lookup("8444445555", Some(&found())));

            form.edit_citizen_field(CitizenField::LastName, "Lopez".into());
            assert!(!form.citizen().is_auto_filled());
            assert_eq!(form.citizen().existing_citizen_id(), Some(CitizenId::new(77)));
        }
    }

    mod readiness {
        use super::*;

        fn complete(form: &mut PotholeForm) {
            select(form, 5, 12, 44);
            form.set_street(StreetSlot::Main, Some(StreetId::new(1)));
            form.set_category(Some(CategoryId::new(2)));
        }

        #[test]
        fn test_create_requires_confirmation() {
            let mut form = create_form();
            complete(&mut form);
            assert!(!form.is_ready_to_submit());
            form.set_confirmation(true);
            assert!(form.is_ready_to_submit());
        }

        #[test]
        fn test_missing_field_blocks_regardless_of_confirmation() {
            let mut form = create_form();
            complete(&mut form);
            form.set_confirmation(true);
            form.set_category(None);
            assert!(!form.is_ready_to_submit());

            form.set_category(Some(CategoryId::new(2)));
            form.set_street(StreetSlot::Main, None);
            assert!(!form.is_ready_to_submit());
        }

        #[test]
        fn test_form_locks_while_submitting() {
            let mut form = create_form();
            complete(&mut form);
            form.set_confirmation(true);
            form.begin_submit().unwrap();

            assert!(!form.is_ready_to_submit());
            form.set_category(None);
            assert_eq!(form.category(), Some(CategoryId::new(2)));
            assert_eq!(form.begin_submit(), Err(FormError::AlreadySubmitting));
        }
    }

    mod edit_init {
        use super::*;

        #[test]
        fn test_edit_form_is_seeded_from_record() {
            let (form, lookups) = PotholeForm::edit(DialogId::generate(), &record());

            assert_eq!(form.mode().pothole_id(), Some(PotholeId::new(31)));
            assert_eq!(form.location().triple(), Some(triple(5, 12, 44)));
            assert_eq!(form.location().street(StreetSlot::Main), Some(StreetId::new(1)));
            assert_eq!(form.postal_code(), &PostalCode::Derived("25000".into()));
            assert_eq!(form.category(), Some(CategoryId::new(2)));
            assert_eq!(form.citizen().phone, "8444445555");
            assert!(form.citizen().is_auto_filled());
            assert_eq!(form.citizen().existing_citizen_id(), Some(CitizenId::new(7)));
            assert_eq!(
                form.photo().existing_url(),
                Some("http://localhost:31234/uploads/a.jpg")
            );
            assert_eq!(form.is_confirmed(), None);
            assert!(form.is_ready_to_submit());
            assert_eq!(lookups.len(), 5);
        }
    }

    mod pipeline {
        use super::*;

        fn ready_create() -> PotholeForm {
            let mut form = create_form();
            select(&mut form, 5, 12, 44);
            form.set_street(StreetSlot::Main, Some(StreetId::new(1)));
            form.set_category(Some(CategoryId::new(2)));
            form.set_confirmation(true);
            form
        }

        fn expect_action(next: Result<SubmitNext, FormError>) -> SubmitAction {
            match next {
                Ok(SubmitNext::Action(action)) => action,
                other => panic!("expected an action, got {other:?}"),
            }
        }

        #[test]
        fn test_create_without_citizen_or_photo() {
            let mut form = ready_create();

            let action = expect_action(form.begin_submit());
            assert!(matches!(action, SubmitAction::CreateLocation(_)));

            let action = expect_action(form.advance_submit(StepOutput::LocationCreated(LocationId::new(10))));
            let SubmitAction::WritePothole(PotholeWrite::Create(dto)) = action else {
                panic!("expected pothole create");
            };
            assert_eq!(dto.location_id, LocationId::new(10));
            assert_eq!(dto.reporter_citizen_id, None);
            assert_eq!(dto.photo_url, None);

            assert_eq!(
                form.advance_submit(StepOutput::PotholeWritten),
                Ok(SubmitNext::Finished)
            );
        }

        #[test]
        fn test_new_citizen_references_new_location() {
            let mut form = ready_create();
            form.set_citizen_report(true);
            form.edit_citizen_field(CitizenField::FirstName, "Juan".into());
            form.set_phone("8444445555");

            form.begin_submit().unwrap();
            let action = expect_action(form.advance_submit(StepOutput::LocationCreated(LocationId::new(10))));
            let SubmitAction::CreateCitizen(dto) = action else {
                panic!("expected citizen create");
            };
            assert_eq!(dto.registered_location_id, LocationId::new(10));
            assert_eq!(dto.phone_number, Some(8_444_445_555));
            assert_eq!(dto.middle_name, None);

            let action = expect_action(form.advance_submit(StepOutput::CitizenCreated(CitizenId::new(50))));
            let SubmitAction::WritePothole(PotholeWrite::Create(dto)) = action else {
                panic!("expected pothole create");
            };
            assert_eq!(dto.reporter_citizen_id, Some(CitizenId::new(50)));
        }

        #[test]
        fn test_out_of_order_output_is_rejected() {
            let mut form = ready_create();
            form.begin_submit().unwrap();
            assert_eq!(
                form.advance_submit(StepOutput::PotholeWritten),
                Err(FormError::UnexpectedOutput {
                    expected: Some(SubmitStage::CreateLocation),
                    got: SubmitStage::WritePothole,
                })
            );
        }

        #[test]
        fn test_failure_unlocks_form() {
            let mut form = ready_create();
            form.begin_submit().unwrap();
            form.fail_submit();
            assert!(!form.is_submitting());
            assert!(form.is_ready_to_submit());
        }

        #[test]
        fn test_edit_with_unchanged_location_deletes_marked_photo() {
            let (mut form, _) = PotholeForm::edit(DialogId::generate(), &record());
            form.mark_photo_for_deletion();

            let action = expect_action(form.begin_submit());
            assert_eq!(
                action,
                SubmitAction::DeletePhoto {
                    filename: "a.jpg".into()
                }
            );

            let action = expect_action(form.advance_submit(StepOutput::PhotoDeleted));
            let SubmitAction::WritePothole(PotholeWrite::Update { id, dto }) = action else {
                panic!("expected pothole update");
            };
            assert_eq!(id, PotholeId::new(31));
            assert_eq!(dto.location_id, Some(LocationId::new(4)));
            assert_eq!(dto.report_by_citizen_id, Some(CitizenId::new(7)));
            assert_eq!(dto.photo_url, None);
        }

        #[test]
        fn test_edit_with_moved_location_creates_new_one() {
            let (mut form, _) = PotholeForm::edit(DialogId::generate(), &record());
            form.set_street(StreetSlot::BetweenOne, Some(StreetId::new(2)));

            let action = expect_action(form.begin_submit());
            let SubmitAction::CreateLocation(dto) = action else {
                panic!("expected location create");
            };
            assert_eq!(dto.street_one_id, Some(StreetId::new(2)));

            let action = expect_action(form.advance_submit(StepOutput::LocationCreated(LocationId::new(11))));
            let SubmitAction::WritePothole(PotholeWrite::Update { dto, .. }) = action else {
                panic!("expected pothole update");
            };
            assert_eq!(dto.location_id, Some(LocationId::new(11)));
            assert_eq!(
                dto.photo_url.as_deref(),
                Some("http://localhost:31234/uploads/a.jpg")
            );
        }
    }
}
