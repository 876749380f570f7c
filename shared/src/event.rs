use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpResult, KvResult};
use crate::config::ApiConfig;
use crate::form::{CitizenField, DirectoryKey, LocalFile, LocationTriple, StreetSlot, SubmitStage};
use crate::{
    CategoryId, DialogId, LocalityId, MunicipalityId, PotholeId, StateId, StreetId,
};

/// Edits made inside the open pothole dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormEvent {
    StateSelected(Option<StateId>),
    MunicipalitySelected(Option<MunicipalityId>),
    LocalitySelected(Option<LocalityId>),
    StreetSelected {
        slot: StreetSlot,
        street_id: Option<StreetId>,
    },
    PostalCodeTyped(String),
    PhoneTyped(String),
    CitizenFieldEdited {
        field: CitizenField,
        value: String,
    },
    CitizenReportToggled(bool),
    CategorySelected(Option<CategoryId>),
    ConfirmationToggled(bool),
    PhotoSelected(Option<LocalFile>),
    PhotoMarkedForDeletion,
}

impl FormEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StateSelected(_) => "state_selected",
            Self::MunicipalitySelected(_) => "municipality_selected",
            Self::LocalitySelected(_) => "locality_selected",
            Self::StreetSelected { .. } => "street_selected",
            Self::PostalCodeTyped(_) => "postal_code_typed",
            Self::PhoneTyped(_) => "phone_typed",
            Self::CitizenFieldEdited { .. } => "citizen_field_edited",
            Self::CitizenReportToggled(_) => "citizen_report_toggled",
            Self::CategorySelected(_) => "category_selected",
            Self::ConfirmationToggled(_) => "confirmation_toggled",
            Self::PhotoSelected(_) => "photo_selected",
            Self::PhotoMarkedForDeletion => "photo_marked_for_deletion",
        }
    }
}

/// Events sent by the shell. Variants marked `serde(skip)` only ever come
/// back through an effect reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Event {
    #[default]
    Noop,

    AppStarted,
    Configure(ApiConfig),

    LoginRequested {
        username: String,
        password_hash: String,
    },
    LogoutRequested,

    RefreshPotholes,
    DeletePotholeRequested {
        pothole_id: PotholeId,
    },

    OpenCreateDialog,
    OpenEditDialog {
        pothole_id: PotholeId,
    },
    CloseDialog,
    Form(FormEvent),
    SubmitRequested,

    DismissNotification {
        id: u64,
    },
    TimerTick {
        now_ms: u64,
    },

    #[serde(skip)]
    SessionLoaded(KvResult),
    #[serde(skip)]
    SessionStored(KvResult),
    #[serde(skip)]
    SessionCleared(KvResult),
    #[serde(skip)]
    LoginResponse(HttpResult),
    #[serde(skip)]
    LogoutResponse(HttpResult),
    #[serde(skip)]
    PotholesLoaded(HttpResult),
    #[serde(skip)]
    PotholeDeleted { id: PotholeId, result: HttpResult },
    #[serde(skip)]
    EditRecordLoaded { dialog: DialogId, result: HttpResult },
    #[serde(skip)]
    DirectoryLoaded {
        dialog: DialogId,
        key: DirectoryKey,
        result: HttpResult,
    },
    #[serde(skip)]
    ReversePostalLoaded {
        dialog: DialogId,
        triple: LocationTriple,
        result: HttpResult,
    },
    #[serde(skip)]
    ForwardPostalLoaded {
        dialog: DialogId,
        code: String,
        result: HttpResult,
    },
    #[serde(skip)]
    CitizenLoaded {
        dialog: DialogId,
        phone: String,
        result: HttpResult,
    },
    #[serde(skip)]
    SubmitStepCompleted {
        dialog: DialogId,
        stage: SubmitStage,
        result: HttpResult,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::AppStarted => "app_started",
            Self::Configure(_) => "configure",
            Self::LoginRequested { .. } => "login_requested",
            Self::LogoutRequested => "logout_requested",
            Self::RefreshPotholes => "refresh_potholes",
            Self::DeletePotholeRequested { .. } => "delete_pothole_requested",
            Self::OpenCreateDialog => "open_create_dialog",
            Self::OpenEditDialog { .. } => "open_edit_dialog",
            Self::CloseDialog => "close_dialog",
            Self::Form(form) => form.name(),
            Self::SubmitRequested => "submit_requested",
            Self::DismissNotification { .. } => "dismiss_notification",
            Self::TimerTick { .. } => "timer_tick",
            Self::SessionLoaded(_) => "session_loaded",
            Self::SessionStored(_) => "session_stored",
            Self::SessionCleared(_) => "session_cleared",
            Self::LoginResponse(_) => "login_response",
            Self::LogoutResponse(_) => "logout_response",
            Self::PotholesLoaded(_) => "potholes_loaded",
            Self::PotholeDeleted { .. } => "pothole_deleted",
            Self::EditRecordLoaded { .. } => "edit_record_loaded",
            Self::DirectoryLoaded { .. } => "directory_loaded",
            Self::ReversePostalLoaded { .. } => "reverse_postal_loaded",
            Self::ForwardPostalLoaded { .. } => "forward_postal_loaded",
            Self::CitizenLoaded { .. } => "citizen_loaded",
            Self::SubmitStepCompleted { .. } => "submit_step_completed",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::LoginRequested { .. }
                | Self::LogoutRequested
                | Self::RefreshPotholes
                | Self::DeletePotholeRequested { .. }
                | Self::OpenCreateDialog
                | Self::OpenEditDialog { .. }
                | Self::CloseDialog
                | Self::Form(_)
                | Self::SubmitRequested
                | Self::DismissNotification { .. }
        )
    }
}
