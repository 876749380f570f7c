use serde::{Deserialize, Serialize};

use crate::api::PotholeResponseDto;
use crate::form::{
    CitizenForm, CitizenLookupStatus, DirectoryEntry, DirectoryKey, PostalCodeSource, PotholeForm,
    StreetSlot, SubmitStep,
};
use crate::model::{Dialog, Model};
use crate::notifications::{Notification, NotificationKind};
use crate::session::SessionState;
use crate::{format_phone_number, CategoryId, LocalityId, MunicipalityId, PotholeId, StateId, StreetId};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionView {
    pub is_restoring: bool,
    pub is_signing_in: bool,
    pub is_signed_in: bool,
    pub user_name: Option<String>,
    pub is_admin: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PotholeRow {
    pub pothole_id: PotholeId,
    pub address: Option<String>,
    pub category: Option<String>,
    pub status: String,
    pub reporter: Option<String>,
    pub reporter_phone: Option<String>,
    pub photo_url: Option<String>,
    pub date_reported: Option<String>,
    pub is_deleting: bool,
}

impl PotholeRow {
    fn new(record: &PotholeResponseDto, deleting: Option<PotholeId>) -> Self {
        let reporter = record.reporter_citizen.as_ref();
        Self {
            pothole_id: record.pothole_id,
            address: record.location.as_ref().map(|l| l.address()),
            category: record.category.as_ref().map(|c| c.category_name.clone()),
            status: record.status.clone(),
            reporter: reporter.map(|r| r.full_name()),
            reporter_phone: reporter
                .map(|r| r.phone())
                .filter(|p| !p.is_empty())
                .map(|p| format_phone_number(&p)),
            photo_url: record.photo_url.clone(),
            date_reported: record.date_reported.clone(),
            is_deleting: deleting == Some(record.pothole_id),
        }
    }
}

/// Helper text state under the phone input.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhoneStatus {
    Prompt,
    Searching,
    Found,
    NotRegistered,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitizenView {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub second_last_name: String,
    pub phone: String,
    pub email: String,
    pub is_phone_complete: bool,
    pub is_auto_filled: bool,
    pub is_existing: bool,
    pub phone_status: PhoneStatus,
}

impl From<&CitizenForm> for CitizenView {
    fn from(citizen: &CitizenForm) -> Self {
        let phone_status = match citizen.lookup_status() {
            CitizenLookupStatus::Idle => PhoneStatus::Prompt,
            CitizenLookupStatus::Searching { .. } => PhoneStatus::Searching,
            CitizenLookupStatus::Found => PhoneStatus::Found,
            CitizenLookupStatus::NotFound => PhoneStatus::NotRegistered,
        };
        Self {
            first_name: citizen.first_name.clone(),
            middle_name: citizen.middle_name.clone(),
            last_name: citizen.last_name.clone(),
            second_last_name: citizen.second_last_name.clone(),
            phone: citizen.phone.clone(),
            email: citizen.email.clone(),
            is_phone_complete: citizen.is_phone_complete(),
            is_auto_filled: citizen.is_auto_filled(),
            is_existing: citizen.existing_citizen_id().is_some(),
            phone_status,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhotoView {
    pub selected_file: Option<String>,
    pub existing_url: Option<String>,
    pub is_marked_for_deletion: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormView {
    pub is_edit: bool,
    pub pothole_id: Option<PotholeId>,

    pub states: Vec<DirectoryEntry>,
    pub municipalities: Vec<DirectoryEntry>,
    pub localities: Vec<DirectoryEntry>,
    pub streets: Vec<DirectoryEntry>,
    pub categories: Vec<DirectoryEntry>,

    pub state_id: Option<StateId>,
    pub municipality_id: Option<MunicipalityId>,
    pub locality_id: Option<LocalityId>,
    pub main_street_id: Option<StreetId>,
    pub street_one_id: Option<StreetId>,
    pub street_two_id: Option<StreetId>,
    pub postal_code: String,
    pub postal_code_source: PostalCodeSource,

    pub is_citizen_report: bool,
    pub citizen: CitizenView,
    pub category_id: Option<CategoryId>,
    pub photo: PhotoView,
    /// `None` in edit mode, which needs no confirmation.
    pub is_confirmed: Option<bool>,

    pub can_submit: bool,
    pub is_submitting: bool,
    pub submit_step: Option<SubmitStep>,
}

impl From<&PotholeForm> for FormView {
    fn from(form: &PotholeForm) -> Self {
        let location = form.location();
        let options = |key: Option<DirectoryKey>| {
            key.map(|k| form.directory(k).to_vec()).unwrap_or_default()
        };

        Self {
            is_edit: !form.mode().is_create(),
            pothole_id: form.mode().pothole_id(),

            states: options(Some(DirectoryKey::States)),
            municipalities: options(location.state_id().map(DirectoryKey::Municipalities)),
            localities: options(location.municipality_id().map(DirectoryKey::Localities)),
            streets: options(location.locality_id().map(DirectoryKey::Streets)),
            categories: options(Some(DirectoryKey::Categories)),

            state_id: location.state_id(),
            municipality_id: location.municipality_id(),
            locality_id: location.locality_id(),
            main_street_id: location.street(StreetSlot::Main),
            street_one_id: location.street(StreetSlot::BetweenOne),
            street_two_id: location.street(StreetSlot::BetweenTwo),
            postal_code: form.postal_code().value().to_string(),
            postal_code_source: form.postal_code().source(),

            is_citizen_report: form.is_citizen_report(),
            citizen: form.citizen().into(),
            category_id: form.category(),
            photo: PhotoView {
                selected_file: form.photo().file().map(|f| f.name.clone()),
                existing_url: form.photo().existing_url().map(str::to_string),
                is_marked_for_deletion: form.photo().is_marked_for_deletion(),
            },
            is_confirmed: form.is_confirmed(),

            can_submit: form.is_ready_to_submit(),
            is_submitting: form.is_submitting(),
            submit_step: form.submit_step(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DialogView {
    pub is_loading: bool,
    pub form: Option<FormView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationView {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub auto_dismiss_ms: u64,
    pub detail: Option<String>,
}

impl From<&Notification> for NotificationView {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            message: n.message.clone(),
            auto_dismiss_ms: n.auto_dismiss_ms,
            detail: n.detail.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub session: SessionView,
    pub potholes: Vec<PotholeRow>,
    pub is_loading_potholes: bool,
    pub dialog: Option<DialogView>,
    pub notification: Option<NotificationView>,
    /// Deadline the shell applies to each HTTP request it runs for the core.
    pub request_timeout_ms: u64,
}

impl From<&Model> for ViewModel {
    fn from(model: &Model) -> Self {
        let session = SessionView {
            is_restoring: matches!(model.session, SessionState::Restoring),
            is_signing_in: matches!(model.session, SessionState::SigningIn),
            is_signed_in: model.session.is_signed_in(),
            user_name: model.session.session().map(|s| s.display_name()),
            is_admin: model.session.session().is_some_and(|s| s.admin),
        };

        let dialog = model.dialog.as_ref().map(|dialog| match dialog {
            Dialog::LoadingRecord { .. } => DialogView {
                is_loading: true,
                form: None,
            },
            Dialog::Open(form) => DialogView {
                is_loading: false,
                form: Some(form.as_ref().into()),
            },
        });

        Self {
            session,
            potholes: model
                .potholes
                .iter()
                .map(|p| PotholeRow::new(p, model.deleting))
                .collect(),
            is_loading_potholes: model.is_loading_potholes,
            dialog,
            notification: model.notifications.current().map(Into::into),
            request_timeout_ms: model.config.timeout_ms,
        }
    }
}
