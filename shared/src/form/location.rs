use serde::{Deserialize, Serialize};

use crate::{LocalityId, MunicipalityId, StateId, StreetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreetSlot {
    Main,
    BetweenOne,
    BetweenTwo,
}

/// The reverse postal lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationTriple {
    pub state_id: StateId,
    pub municipality_id: MunicipalityId,
    pub locality_id: LocalityId,
}

/// Reference lists the dialog needs, keyed by their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectoryKey {
    States,
    Categories,
    Municipalities(StateId),
    Localities(MunicipalityId),
    Streets(LocalityId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: u64,
    pub name: String,
}

impl DirectoryEntry {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Four-level geographic selection. A child is only ever set while its
/// parent is set; changing a parent clears every descendant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSelection {
    state_id: Option<StateId>,
    municipality_id: Option<MunicipalityId>,
    locality_id: Option<LocalityId>,
    main_street_id: Option<StreetId>,
    street_one_id: Option<StreetId>,
    street_two_id: Option<StreetId>,
}

impl LocationSelection {
    /// Builds a selection from stored parts, dropping any child whose parent is missing.
    pub fn from_parts(
        triple: Option<LocationTriple>,
        main_street_id: Option<StreetId>,
        street_one_id: Option<StreetId>,
        street_two_id: Option<StreetId>,
    ) -> Self {
        let mut selection = Self::default();
        if let Some(triple) = triple {
            selection.adopt_triple(triple);
            selection.main_street_id = main_street_id;
            selection.street_one_id = street_one_id;
            selection.street_two_id = street_two_id;
        }
        selection
    }

    pub fn state_id(&self) -> Option<StateId> {
        self.state_id
    }

    pub fn municipality_id(&self) -> Option<MunicipalityId> {
        self.municipality_id
    }

    pub fn locality_id(&self) -> Option<LocalityId> {
        self.locality_id
    }

    pub fn street(&self, slot: StreetSlot) -> Option<StreetId> {
        match slot {
            StreetSlot::Main => self.main_street_id,
            StreetSlot::BetweenOne => self.street_one_id,
            StreetSlot::BetweenTwo => self.street_two_id,
        }
    }

    pub fn set_state(&mut self, state_id: Option<StateId>) {
        self.state_id = state_id;
        self.municipality_id = None;
        self.locality_id = None;
        self.clear_streets();
    }

    /// Returns `false` and leaves the selection alone when no state is set.
    pub fn set_municipality(&mut self, municipality_id: Option<MunicipalityId>) -> bool {
        if municipality_id.is_some() && self.state_id.is_none() {
            return false;
        }
        self.municipality_id = municipality_id;
        self.locality_id = None;
        self.clear_streets();
        true
    }

    pub fn set_locality(&mut self, locality_id: Option<LocalityId>) -> bool {
        if locality_id.is_some() && self.municipality_id.is_none() {
            return false;
        }
        self.locality_id = locality_id;
        self.clear_streets();
        true
    }

    /// Streets are leaves: no cascade.
    pub fn set_street(&mut self, slot: StreetSlot, street_id: Option<StreetId>) -> bool {
        if street_id.is_some() && self.locality_id.is_none() {
            return false;
        }
        match slot {
            StreetSlot::Main => self.main_street_id = street_id,
            StreetSlot::BetweenOne => self.street_one_id = street_id,
            StreetSlot::BetweenTwo => self.street_two_id = street_id,
        }
        true
    }

    /// Replaces the whole triple at once and resets the streets.
    pub fn adopt_triple(&mut self, triple: LocationTriple) {
        self.state_id = Some(triple.state_id);
        self.municipality_id = Some(triple.municipality_id);
        self.locality_id = Some(triple.locality_id);
        self.clear_streets();
    }

    pub fn triple(&self) -> Option<LocationTriple> {
        Some(LocationTriple {
            state_id: self.state_id?,
            municipality_id: self.municipality_id?,
            locality_id: self.locality_id?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.triple().is_some() && self.main_street_id.is_some()
    }

    fn clear_streets(&mut self) {
        self.main_street_id = None;
        self.street_one_id = None;
        self.street_two_id = None;
    }
}

/// Child directories the current selection needs loaded.
pub fn child_directories(selection: &LocationSelection) -> Vec<DirectoryKey> {
    let mut keys = Vec::with_capacity(3);
    if let Some(state_id) = selection.state_id {
        keys.push(DirectoryKey::Municipalities(state_id));
    }
    if let Some(municipality_id) = selection.municipality_id {
        keys.push(DirectoryKey::Localities(municipality_id));
    }
    if let Some(locality_id) = selection.locality_id {
        keys.push(DirectoryKey::Streets(locality_id));
    }
    keys
}
