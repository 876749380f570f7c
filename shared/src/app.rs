use std::collections::VecDeque;

use crux_core::App as _;
use tracing::{debug, info, trace, warn};

use crate::api::{
    decode_directory, decode_empty, decode_id, decode_json, decode_optional, ApiClient,
    CitizenLookupDto, FileUploadResponse, LoginPayload, LoginResponse, PotholeResponseDto,
    ZipCodeLookupDto,
};
use crate::capabilities::{Capabilities, HttpError, HttpReply, HttpRequest, HttpResult, KvReply};
use crate::event::{Event, FormEvent};
use crate::form::{
    postal, CitizenRecord, FormError, Lookup, LocationTriple, PotholeForm, StepOutput, SubmitNext,
    SubmitStage,
};
use crate::model::{Dialog, Model};
use crate::session::{self, Session, SessionState};
use crate::view::ViewModel;
use crate::{
    get_current_time_ms, AppError, AppResult, CitizenId, DialogId, ErrorKind, LocationId,
};

#[derive(Debug, Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(
            event = event.name(),
            user_initiated = event.is_user_initiated(),
            "update"
        );

        match event {
            Event::Noop => {}

            Event::AppStarted => {
                model.session = SessionState::Restoring;
                match session::load_operation() {
                    Ok(operation) => caps.store(operation, KvReply::SessionLoaded),
                    Err(e) => {
                        warn!(error = %e, "cannot read stored session");
                        model.session = SessionState::SignedOut;
                    }
                }
                caps.render.render();
            }

            Event::Configure(config) => {
                match config.validate() {
                    Ok(()) => {
                        info!(base_url = %config.base_url, "api configured");
                        model.config = config;
                        model.cache.clear();
                    }
                    Err(e) => {
                        warn!(error = %e, "rejected api configuration");
                        model
                            .notifications
                            .error(&AppError::new(ErrorKind::Validation, e.to_string()));
                    }
                }
                caps.render.render();
            }

            Event::SessionLoaded(result) => {
                match session::restore(result) {
                    Some(restored) => {
                        info!("session restored");
                        model.session = SessionState::SignedIn(restored);
                        self.refresh_potholes(model, caps);
                    }
                    None => model.session = SessionState::SignedOut,
                }
                caps.render.render();
            }

            Event::SessionStored(result) | Event::SessionCleared(result) => {
                if let Err(e) = result {
                    warn!(error = %e, "session storage failed");
                }
            }

            Event::LoginRequested {
                username,
                password_hash,
            } => {
                if matches!(model.session, SessionState::SigningIn) {
                    debug!("login already in flight");
                    return;
                }
                model.session = SessionState::SigningIn;
                let payload = LoginPayload {
                    username,
                    password_hash,
                };
                self.send(model, caps, HttpReply::Login, |api| api.login(&payload));
                caps.render.render();
            }

            Event::LoginResponse(result) => {
                if !matches!(model.session, SessionState::SigningIn) {
                    debug!("discarding login response without a pending login");
                    return;
                }
                match decode_json::<LoginResponse>(result) {
                    Ok(response) => {
                        let signed_in = Session::from_login(response);
                        match session::save_operation(&signed_in) {
                            Ok(operation) => caps.store(operation, KvReply::SessionStored),
                            Err(e) => warn!(error = %e, "session not persisted"),
                        }
                        info!(admin = signed_in.admin, "signed in");
                        model.session = SessionState::SignedIn(signed_in);
                        self.refresh_potholes(model, caps);
                    }
                    Err(error) => {
                        warn!(code = error.code(), "login failed");
                        model.session = SessionState::SignedOut;
                        model.notifications.error(&error);
                    }
                }
                caps.render.render();
            }

            Event::LogoutRequested => {
                if model.session.is_signed_in() {
                    self.send(model, caps, HttpReply::Logout, |api| api.logout());
                }
                Self::clear_session(model, caps);
                caps.render.render();
            }

            Event::LogoutResponse(result) => {
                if let Err(error) = decode_empty(result) {
                    debug!(code = error.code(), "backend logout failed; local session already cleared");
                }
            }

            Event::RefreshPotholes => {
                self.refresh_potholes(model, caps);
                caps.render.render();
            }

            Event::PotholesLoaded(result) => {
                model.is_loading_potholes = false;
                match decode_json::<Vec<PotholeResponseDto>>(result) {
                    Ok(potholes) => {
                        debug!(count = potholes.len(), "potholes loaded");
                        model.potholes = potholes;
                    }
                    Err(error) => Self::report(model, caps, &error),
                }
                caps.render.render();
            }

            Event::DeletePotholeRequested { pothole_id } => {
                if model.deleting.is_some() {
                    debug!(%pothole_id, "delete already in flight");
                    return;
                }
                model.deleting = Some(pothole_id);
                self.send(
                    model,
                    caps,
                    HttpReply::DeletePothole { id: pothole_id },
                    |api| api.delete_pothole(pothole_id),
                );
                caps.render.render();
            }

            Event::PotholeDeleted { id, result } => {
                if model.deleting == Some(id) {
                    model.deleting = None;
                }
                match decode_empty(result) {
                    Ok(()) => {
                        info!(pothole_id = %id, "pothole deleted");
                        model.potholes.retain(|p| p.pothole_id != id);
                        model.notifications.success("Pothole deleted");
                        self.refresh_potholes(model, caps);
                    }
                    Err(error) => Self::report(model, caps, &error),
                }
                caps.render.render();
            }

            Event::OpenCreateDialog => {
                let (form, lookups) = PotholeForm::create(DialogId::generate());
                let dialog = form.id();
                debug!(%dialog, "create dialog opened");
                model.dialog = Some(Dialog::Open(Box::new(form)));
                self.run_lookups(model, caps, dialog, lookups);
                caps.render.render();
            }

            Event::OpenEditDialog { pothole_id } => {
                let dialog = DialogId::generate();
                debug!(%dialog, %pothole_id, "edit dialog opened");
                model.dialog = Some(Dialog::LoadingRecord {
                    id: dialog,
                    pothole_id,
                });
                self.send(model, caps, HttpReply::EditRecord { dialog }, |api| {
                    api.pothole(pothole_id)
                });
                caps.render.render();
            }

            Event::EditRecordLoaded { dialog, result } => {
                if !matches!(model.dialog, Some(Dialog::LoadingRecord { id, .. }) if id == dialog) {
                    debug!(%dialog, "discarding record for a closed dialog");
                    return;
                }
                match decode_json::<PotholeResponseDto>(result) {
                    Ok(record) => {
                        let (form, lookups) = PotholeForm::edit(dialog, &record);
                        model.dialog = Some(Dialog::Open(Box::new(form)));
                        self.run_lookups(model, caps, dialog, lookups);
                    }
                    Err(error) => {
                        model.dialog = None;
                        Self::report(model, caps, &error);
                    }
                }
                caps.render.render();
            }

            Event::CloseDialog => {
                if let Some(closed) = model.dialog.take() {
                    debug!(dialog = %closed.id(), "dialog closed");
                }
                caps.render.render();
            }

            Event::Form(form_event) => {
                self.apply_form_event(form_event, model, caps);
            }

            Event::SubmitRequested => {
                let Some(Dialog::Open(form)) = model.dialog.as_mut() else {
                    debug!("submit without an open form");
                    return;
                };
                let dialog = form.id();
                let next = form.begin_submit();
                self.continue_submit(model, caps, dialog, next);
                caps.render.render();
            }

            Event::SubmitStepCompleted {
                dialog,
                stage,
                result,
            } => {
                let Some(form) = model.form_mut(dialog) else {
                    debug!(%dialog, ?stage, "discarding submit result for a closed dialog");
                    return;
                };
                if form.awaiting_stage() != Some(stage) {
                    debug!(%dialog, ?stage, "discarding unexpected submit result");
                    return;
                }
                let next = match decode_step(stage, result) {
                    Ok(output) => form.advance_submit(output),
                    Err(error) => {
                        warn!(%dialog, ?stage, code = error.code(), "submit step failed");
                        form.fail_submit();
                        Self::report(model, caps, &error);
                        caps.render.render();
                        return;
                    }
                };
                self.continue_submit(model, caps, dialog, next);
                caps.render.render();
            }

            Event::DirectoryLoaded {
                dialog,
                key,
                result,
            } => {
                match decode_directory(key, result) {
                    Ok(entries) => {
                        model
                            .cache
                            .store_directory(key, entries.clone(), get_current_time_ms());
                        let follow_up = model
                            .form_mut(dialog)
                            .map(|form| form.apply_directory(key, entries))
                            .unwrap_or_default();
                        self.run_lookups(model, caps, dialog, follow_up);
                    }
                    Err(error) => {
                        warn!(?key, code = error.code(), "directory lookup failed");
                    }
                }
                caps.render.render();
            }

            Event::ReversePostalLoaded {
                dialog,
                triple,
                result,
            } => match decode_optional::<ZipCodeLookupDto>(result) {
                Ok(row) => {
                    let code = row.map(|r| postal::render(r.postal_code));
                    model
                        .cache
                        .store_reverse_postal(triple, code.clone(), get_current_time_ms());
                    Self::apply_reverse(model, dialog, triple, code);
                    caps.render.render();
                }
                Err(error) => {
                    warn!(?triple, code = error.code(), "reverse postal lookup failed");
                }
            },

            Event::ForwardPostalLoaded {
                dialog,
                code,
                result,
            } => {
                match decode_optional::<Vec<ZipCodeLookupDto>>(result) {
                    Ok(rows) => {
                        let candidates: Vec<LocationTriple> =
                            rows.unwrap_or_default().iter().map(ZipCodeLookupDto::triple).collect();
                        model.cache.store_forward_postal(
                            &code,
                            candidates.clone(),
                            get_current_time_ms(),
                        );
                        let follow_up = model
                            .form_mut(dialog)
                            .map(|form| form.apply_forward_postal(&code, &candidates))
                            .unwrap_or_default();
                        self.run_lookups(model, caps, dialog, follow_up);
                    }
                    Err(error) => {
                        warn!(code = %code, error = error.code(), "forward postal lookup failed");
                        if let Some(form) = model.form_mut(dialog) {
                            form.fail_forward_postal(&code);
                        }
                    }
                }
                caps.render.render();
            }

            Event::CitizenLoaded {
                dialog,
                phone,
                result,
            } => {
                let Some(form) = model.form_mut(dialog) else {
                    debug!(%dialog, "discarding citizen lookup for a closed dialog");
                    return;
                };
                match decode_optional::<CitizenLookupDto>(result) {
                    Ok(found) => {
                        let record = found.map(CitizenRecord::from);
                        form.apply_citizen_lookup(&phone, record.as_ref());
                    }
                    Err(error) => {
                        warn!(code = error.code(), "citizen lookup failed");
                        form.fail_citizen_lookup(&phone);
                    }
                }
                caps.render.render();
            }

            Event::DismissNotification { id } => {
                if model.notifications.dismiss(id) {
                    caps.render.render();
                }
            }

            Event::TimerTick { now_ms } => {
                if model.notifications.expire(now_ms) {
                    caps.render.render();
                }
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from(model)
    }
}

impl App {
    fn apply_form_event(&self, event: FormEvent, model: &mut Model, caps: &Capabilities) {
        let Some(Dialog::Open(form)) = model.dialog.as_mut() else {
            debug!(event = event.name(), "form event without an open form");
            return;
        };
        let dialog = form.id();

        let lookups = match event {
            FormEvent::StateSelected(id) => form.set_state(id),
            FormEvent::MunicipalitySelected(id) => form.set_municipality(id),
            FormEvent::LocalitySelected(id) => form.set_locality(id),
            FormEvent::StreetSelected { slot, street_id } => {
                form.set_street(slot, street_id);
                Vec::new()
            }
            FormEvent::PostalCodeTyped(raw) => form.set_postal_code(&raw),
            FormEvent::PhoneTyped(raw) => form.set_phone(&raw),
            FormEvent::CitizenFieldEdited { field, value } => form.edit_citizen_field(field, value),
            FormEvent::CitizenReportToggled(enabled) => form.set_citizen_report(enabled),
            FormEvent::CategorySelected(category) => {
                form.set_category(category);
                Vec::new()
            }
            FormEvent::ConfirmationToggled(confirmed) => {
                form.set_confirmation(confirmed);
                Vec::new()
            }
            FormEvent::PhotoSelected(file) => {
                form.select_photo(file);
                Vec::new()
            }
            FormEvent::PhotoMarkedForDeletion => {
                form.mark_photo_for_deletion();
                Vec::new()
            }
        };

        self.run_lookups(model, caps, dialog, lookups);
        caps.render.render();
    }

    /// Answers each lookup from the cache when possible, feeding hits back
    /// through the same reconciliation as network replies; misses become requests.
    fn run_lookups(
        &self,
        model: &mut Model,
        caps: &Capabilities,
        dialog: DialogId,
        lookups: Vec<Lookup>,
    ) {
        let mut pending: VecDeque<Lookup> = lookups.into();

        while let Some(lookup) = pending.pop_front() {
            let now = get_current_time_ms();
            match lookup {
                Lookup::Directory(key) => match model.cache.directory(key, now) {
                    Some(entries) => {
                        trace!(?key, "directory served from cache");
                        if let Some(form) = model.form_mut(dialog) {
                            pending.extend(form.apply_directory(key, entries));
                        }
                    }
                    None => self.send(model, caps, HttpReply::Directory { dialog, key }, |api| {
                        api.directory(key)
                    }),
                },
                Lookup::ReversePostal(triple) => match model.cache.reverse_postal(triple, now) {
                    Some(code) => {
                        trace!(?triple, "reverse postal served from cache");
                        Self::apply_reverse(model, dialog, triple, code);
                    }
                    None => self.send(
                        model,
                        caps,
                        HttpReply::ReversePostal { dialog, triple },
                        |api| api.reverse_postal(triple),
                    ),
                },
                Lookup::ForwardPostal(code) => match model.cache.forward_postal(&code, now) {
                    Some(candidates) => {
                        trace!(code = %code, "forward postal served from cache");
                        if let Some(form) = model.form_mut(dialog) {
                            pending.extend(form.apply_forward_postal(&code, &candidates));
                        }
                    }
                    None => {
                        let reply = HttpReply::ForwardPostal {
                            dialog,
                            code: code.clone(),
                        };
                        self.send(model, caps, reply, |api| api.forward_postal(&code));
                    }
                },
                Lookup::Citizen(phone) => {
                    let reply = HttpReply::Citizen {
                        dialog,
                        phone: phone.clone(),
                    };
                    self.send(model, caps, reply, |api| api.citizen_lookup(&phone));
                }
            }
        }
    }

    fn apply_reverse(model: &mut Model, dialog: DialogId, triple: LocationTriple, code: Option<String>) {
        if let Some(form) = model.form_mut(dialog) {
            if form.apply_reverse_postal(triple, code) {
                debug!(%dialog, ?triple, "postal code derived from location");
            }
        }
    }

    fn continue_submit(
        &self,
        model: &mut Model,
        caps: &Capabilities,
        dialog: DialogId,
        next: Result<SubmitNext, FormError>,
    ) {
        match next {
            Ok(SubmitNext::Action(action)) => {
                let stage = action.stage();
                debug!(%dialog, ?stage, "submit request");
                self.send(model, caps, HttpReply::SubmitStep { dialog, stage }, |api| {
                    api.submit(&action)
                });
            }
            Ok(SubmitNext::Finished) => {
                let updated = model.form().is_some_and(|f| !f.mode().is_create());
                model.dialog = None;
                model
                    .notifications
                    .success(if updated { "Pothole updated" } else { "Pothole reported" });
                self.refresh_potholes(model, caps);
            }
            Err(FormError::AlreadySubmitting) => {
                debug!(%dialog, "submit already in flight");
            }
            Err(e) => {
                warn!(%dialog, error = %e, "submit rejected");
                if let Some(form) = model.form_mut(dialog) {
                    form.fail_submit();
                }
                model.notifications.error(&AppError::from(e));
            }
        }
    }

    fn refresh_potholes(&self, model: &mut Model, caps: &Capabilities) {
        if !model.session.is_signed_in() {
            return;
        }
        model.is_loading_potholes = true;
        self.send(model, caps, HttpReply::Potholes, |api| api.active_potholes());
    }

    /// Queues a request built against the current config and token. A request
    /// that cannot be built is answered at once with the construction error.
    fn send(
        &self,
        model: &mut Model,
        caps: &Capabilities,
        reply: HttpReply,
        build: impl FnOnce(&ApiClient<'_>) -> Result<HttpRequest, HttpError>,
    ) {
        let built = build(&ApiClient::new(&model.config, model.session.token()));
        match built {
            Ok(request) => caps.send(request, reply),
            Err(e) => {
                warn!(
                    error = %e,
                    construction = e.is_request_construction(),
                    "request could not be built"
                );
                self.update(reply.resolve(Err(e)), model, caps);
            }
        }
    }

    fn report(model: &mut Model, caps: &Capabilities, error: &AppError) {
        if error.kind == ErrorKind::Authentication && model.session.is_signed_in() {
            info!("session rejected by backend");
            Self::clear_session(model, caps);
        }
        model.notifications.error(error);
    }

    fn clear_session(model: &mut Model, caps: &Capabilities) {
        match session::clear_operation() {
            Ok(operation) => caps.store(operation, KvReply::SessionCleared),
            Err(e) => warn!(error = %e, "stored session not cleared"),
        }
        model.sign_out();
    }
}

fn decode_step(stage: SubmitStage, result: HttpResult) -> AppResult<StepOutput> {
    Ok(match stage {
        SubmitStage::CreateLocation => StepOutput::LocationCreated(LocationId::new(decode_id(result)?)),
        SubmitStage::CreateCitizen => StepOutput::CitizenCreated(CitizenId::new(decode_id(result)?)),
        SubmitStage::DeletePhoto => {
            decode_empty(result)?;
            StepOutput::PhotoDeleted
        }
        SubmitStage::UploadPhoto => {
            StepOutput::PhotoUploaded(decode_json::<FileUploadResponse>(result)?.url)
        }
        SubmitStage::WritePothole => {
            decode_empty(result)?;
            StepOutput::PotholeWritten
        }
    })
}
