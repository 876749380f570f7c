use crate::api::{PotholeCreateDto, PotholeUpdateDto};
use crate::form::location::LocationSelection;
use crate::form::submit::PotholeWrite;
use crate::{CategoryId, CitizenId, LocationId, PotholeId, STATUS_REPORTED};

/// Everything the last submit step needs, gathered by the earlier steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotholeParts {
    pub location_id: LocationId,
    pub citizen_id: Option<CitizenId>,
    pub category_id: CategoryId,
    pub photo_url: Option<String>,
}

/// Mode-specific rules. One implementation is picked when the dialog opens.
pub trait PayloadBuilder {
    /// An existing location id that can be reused for `current`, if any.
    fn reusable_location(&self, current: &LocationSelection) -> Option<LocationId>;

    fn requires_confirmation(&self) -> bool;

    fn looks_up_citizens(&self) -> bool;

    fn build(&self, parts: PotholeParts) -> PotholeWrite;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateMode {
    pub confirmed: bool,
}

impl PayloadBuilder for CreateMode {
    fn reusable_location(&self, _current: &LocationSelection) -> Option<LocationId> {
        None
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn looks_up_citizens(&self) -> bool {
        true
    }

    fn build(&self, parts: PotholeParts) -> PotholeWrite {
        PotholeWrite::Create(PotholeCreateDto {
            reporter_citizen_id: parts.citizen_id,
            location_id: parts.location_id,
            category_id: parts.category_id,
            status_id: STATUS_REPORTED,
            photo_url: parts.photo_url,
            date_reported: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditMode {
    pub pothole_id: PotholeId,
    pub original_location: LocationSelection,
    pub original_location_id: Option<LocationId>,
}

impl PayloadBuilder for EditMode {
    fn reusable_location(&self, current: &LocationSelection) -> Option<LocationId> {
        if *current == self.original_location {
            self.original_location_id
        } else {
            None
        }
    }

    fn requires_confirmation(&self) -> bool {
        false
    }

    fn looks_up_citizens(&self) -> bool {
        false
    }

    fn build(&self, parts: PotholeParts) -> PotholeWrite {
        PotholeWrite::Update {
            id: self.pothole_id,
            dto: PotholeUpdateDto {
                report_by_citizen_id: parts.citizen_id,
                location_id: Some(parts.location_id),
                category_id: Some(parts.category_id),
                photo_url: parts.photo_url,
                ..PotholeUpdateDto::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogMode {
    Create(CreateMode),
    Edit(EditMode),
}

impl DialogMode {
    pub fn builder(&self) -> &dyn PayloadBuilder {
        match self {
            DialogMode::Create(mode) => mode,
            DialogMode::Edit(mode) => mode,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, DialogMode::Create(_))
    }

    pub fn pothole_id(&self) -> Option<PotholeId> {
        match self {
            DialogMode::Create(_) => None,
            DialogMode::Edit(mode) => Some(mode.pothole_id),
        }
    }
}
