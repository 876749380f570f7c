use crate::api::PotholeResponseDto;
use crate::cache::LookupCache;
use crate::config::ApiConfig;
use crate::form::PotholeForm;
use crate::notifications::NotificationQueue;
use crate::session::SessionState;
use crate::{DialogId, PotholeId};

/// The pothole dialog. An edit dialog waits for its record before a form exists.
#[derive(Debug)]
pub enum Dialog {
    LoadingRecord { id: DialogId, pothole_id: PotholeId },
    Open(Box<PotholeForm>),
}

impl Dialog {
    #[must_use]
    pub fn id(&self) -> DialogId {
        match self {
            Self::LoadingRecord { id, .. } => *id,
            Self::Open(form) => form.id(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: ApiConfig,
    pub session: SessionState,

    pub potholes: Vec<PotholeResponseDto>,
    pub is_loading_potholes: bool,
    pub deleting: Option<PotholeId>,

    pub dialog: Option<Dialog>,
    pub cache: LookupCache,
    pub notifications: NotificationQueue,
}

impl Model {
    #[must_use]
    pub fn with_config(config: ApiConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The open form, if `dialog` is still the one on screen.
    pub fn form_mut(&mut self, dialog: DialogId) -> Option<&mut PotholeForm> {
        match self.dialog.as_mut() {
            Some(Dialog::Open(form)) if form.id() == dialog => Some(form.as_mut()),
            _ => None,
        }
    }

    #[must_use]
    pub fn form(&self) -> Option<&PotholeForm> {
        match self.dialog.as_ref() {
            Some(Dialog::Open(form)) => Some(form.as_ref()),
            _ => None,
        }
    }

    /// Drops everything tied to the signed-in user.
    pub fn sign_out(&mut self) {
        self.session = SessionState::SignedOut;
        self.potholes.clear();
        self.is_loading_potholes = false;
        self.deleting = None;
        self.dialog = None;
    }
}
