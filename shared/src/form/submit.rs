//! The strictly sequential submit pipeline: location, citizen, photo, pothole.
//!
//! Each step either completes locally or hands back exactly one remote
//! action; the next step only starts once that action's result is fed in.
//! A failure abandons the run. Nothing already written remotely is undone.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::photo::{LocalFile, PhotoPlan};
use super::{FormError, PotholeForm};
use crate::api::{CitizenCreateDto, LocationCreateDto, PotholeCreateDto, PotholeUpdateDto};
use crate::form::citizen::CitizenForm;
use crate::form::location::{LocationSelection, StreetSlot};
use crate::form::mode::PotholeParts;
use crate::{CitizenId, LocationId, PotholeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitStep {
    #[default]
    Location,
    Citizen,
    Photo,
    Pothole,
    Done,
}

/// Which remote call a step result answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmitStage {
    CreateLocation,
    CreateCitizen,
    DeletePhoto,
    UploadPhoto,
    WritePothole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PotholeWrite {
    Create(PotholeCreateDto),
    Update { id: PotholeId, dto: PotholeUpdateDto },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAction {
    CreateLocation(LocationCreateDto),
    CreateCitizen(CitizenCreateDto),
    DeletePhoto { filename: String },
    UploadPhoto(LocalFile),
    WritePothole(PotholeWrite),
}

impl SubmitAction {
    pub fn stage(&self) -> SubmitStage {
        match self {
            SubmitAction::CreateLocation(_) => SubmitStage::CreateLocation,
            SubmitAction::CreateCitizen(_) => SubmitStage::CreateCitizen,
            SubmitAction::DeletePhoto { .. } => SubmitStage::DeletePhoto,
            SubmitAction::UploadPhoto(_) => SubmitStage::UploadPhoto,
            SubmitAction::WritePothole(_) => SubmitStage::WritePothole,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutput {
    LocationCreated(LocationId),
    CitizenCreated(CitizenId),
    PhotoDeleted,
    PhotoUploaded(String),
    PotholeWritten,
}

impl StepOutput {
    pub fn stage(&self) -> SubmitStage {
        match self {
            StepOutput::LocationCreated(_) => SubmitStage::CreateLocation,
            StepOutput::CitizenCreated(_) => SubmitStage::CreateCitizen,
            StepOutput::PhotoDeleted => SubmitStage::DeletePhoto,
            StepOutput::PhotoUploaded(_) => SubmitStage::UploadPhoto,
            StepOutput::PotholeWritten => SubmitStage::WritePothole,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitNext {
    Action(SubmitAction),
    Finished,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Submission {
    step: SubmitStep,
    awaiting: Option<SubmitStage>,
    location_id: Option<LocationId>,
    citizen_id: Option<CitizenId>,
    photo_url: Option<String>,
}

impl Submission {
    pub(crate) fn step(&self) -> SubmitStep {
        self.step
    }
}

impl PotholeForm {
    /// Starts a submission and returns its first remote action.
    pub fn begin_submit(&mut self) -> Result<SubmitNext, FormError> {
        if self.submission.is_some() {
            return Err(FormError::AlreadySubmitting);
        }
        if !self.is_ready_to_submit() {
            return Err(FormError::NotReady);
        }

        info!(dialog = %self.id, create = self.mode.is_create(), "submit started");
        self.submission = Some(Submission::default());

        let next = self.next_action();
        if next.is_err() {
            self.submission = None;
        }
        next
    }

    /// Feeds the result of the action in flight and returns what comes next.
    pub fn advance_submit(&mut self, output: StepOutput) -> Result<SubmitNext, FormError> {
        let submission = self.submission.as_mut().ok_or(FormError::NotSubmitting)?;
        let stage = output.stage();
        if submission.awaiting != Some(stage) {
            return Err(FormError::UnexpectedOutput {
                expected: submission.awaiting,
                got: stage,
            });
        }
        submission.awaiting = None;

        match output {
            StepOutput::LocationCreated(id) => {
                submission.location_id = Some(id);
                submission.step = SubmitStep::Citizen;
            }
            StepOutput::CitizenCreated(id) => {
                submission.citizen_id = Some(id);
                submission.step = SubmitStep::Photo;
            }
            StepOutput::PhotoDeleted => {
                submission.photo_url = None;
                submission.step = SubmitStep::Pothole;
            }
            StepOutput::PhotoUploaded(url) => {
                submission.photo_url = Some(url);
                submission.step = SubmitStep::Pothole;
            }
            StepOutput::PotholeWritten => {
                submission.step = SubmitStep::Done;
            }
        }

        self.next_action()
    }

    /// Abandons the run so the user can try again.
    pub fn fail_submit(&mut self) {
        if let Some(submission) = self.submission.take() {
            info!(dialog = %self.id, step = ?submission.step, "submit aborted");
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submission.is_some()
    }

    pub fn awaiting_stage(&self) -> Option<SubmitStage> {
        self.submission.as_ref().and_then(|s| s.awaiting)
    }

    fn next_action(&mut self) -> Result<SubmitNext, FormError> {
        loop {
            let submission = self.submission.as_mut().ok_or(FormError::NotSubmitting)?;
            debug!(step = ?submission.step, "submit step");

            let action = match submission.step {
                SubmitStep::Location => {
                    match self.mode.builder().reusable_location(&self.location) {
                        Some(id) => {
                            submission.location_id = Some(id);
                            submission.step = SubmitStep::Citizen;
                            None
                        }
                        None => Some(SubmitAction::CreateLocation(location_dto(&self.location)?)),
                    }
                }
                SubmitStep::Citizen => {
                    if !self.is_citizen_report {
                        submission.step = SubmitStep::Photo;
                        None
                    } else if let Some(id) = self.citizen.existing_citizen_id() {
                        submission.citizen_id = Some(id);
                        submission.step = SubmitStep::Photo;
                        None
                    } else {
                        let location_id = submission
                            .location_id
                            .ok_or(FormError::Missing("location id"))?;
                        Some(SubmitAction::CreateCitizen(citizen_dto(
                            &self.citizen,
                            location_id,
                        )))
                    }
                }
                SubmitStep::Photo => match self.photo.plan() {
                    PhotoPlan::Delete {
                        filename: Some(filename),
                    } => Some(SubmitAction::DeletePhoto { filename }),
                    PhotoPlan::Delete { filename: None } => {
                        submission.photo_url = None;
                        submission.step = SubmitStep::Pothole;
                        None
                    }
                    PhotoPlan::Upload(file) => Some(SubmitAction::UploadPhoto(file.clone())),
                    PhotoPlan::Keep(url) => {
                        submission.photo_url = url;
                        submission.step = SubmitStep::Pothole;
                        None
                    }
                },
                SubmitStep::Pothole => {
                    let parts = PotholeParts {
                        location_id: submission
                            .location_id
                            .ok_or(FormError::Missing("location id"))?,
                        citizen_id: submission.citizen_id,
                        category_id: self.category.ok_or(FormError::Missing("category"))?,
                        photo_url: submission.photo_url.clone(),
                    };
                    Some(SubmitAction::WritePothole(self.mode.builder().build(parts)))
                }
                SubmitStep::Done => {
                    info!(dialog = %self.id, "submit finished");
                    return Ok(SubmitNext::Finished);
                }
            };

            if let Some(action) = action {
                submission.awaiting = Some(action.stage());
                return Ok(SubmitNext::Action(action));
            }
        }
    }
}

fn location_dto(location: &LocationSelection) -> Result<LocationCreateDto, FormError> {
    let triple = location.triple().ok_or(FormError::Missing("location"))?;
    Ok(LocationCreateDto {
        state_id: triple.state_id,
        municipality_id: triple.municipality_id,
        locality_id: triple.locality_id,
        main_street_id: location
            .street(StreetSlot::Main)
            .ok_or(FormError::Missing("main street"))?,
        street_one_id: location.street(StreetSlot::BetweenOne),
        street_two_id: location.street(StreetSlot::BetweenTwo),
    })
}

fn citizen_dto(citizen: &CitizenForm, registered_location_id: LocationId) -> CitizenCreateDto {
    let optional = |value: &str| Some(value.trim().to_string()).filter(|v| !v.is_empty());
    CitizenCreateDto {
        first_name: citizen.first_name.trim().to_string(),
        middle_name: optional(&citizen.middle_name),
        last_name: citizen.last_name.trim().to_string(),
        second_last_name: optional(&citizen.second_last_name),
        email: citizen.email.trim().to_string(),
        phone_number: citizen.phone.parse().ok(),
        registered_location_id,
    }
}
