use std::collections::BTreeSet;

use time::OffsetDateTime;

use crate::error::{ApiError, RosterError};

use super::{
    export::{export_csv, CsvExport},
    filter::{visible_rows, FilterCriteria, StatusFilter},
    participant::{Participant, ParticipantPatch},
    roster::RosterStore,
    selection::SelectionSet,
};

/// A change the API has to accept before it is applied locally.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Mutation {
    CheckIn(String),
    Update(Participant),
    Delete(String),
    BulkCheckIn(Vec<String>),
}

impl Mutation {
    fn ids(&self) -> Vec<String> {
        match self {
            Mutation::CheckIn(id) | Mutation::Delete(id) => vec![id.clone()],
            Mutation::Update(participant) => vec![participant.id.clone()],
            Mutation::BulkCheckIn(ids) => ids.clone(),
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Mutation::CheckIn(_) => "check in",
            Mutation::Update(_) => "update",
            Mutation::Delete(_) => "delete",
            Mutation::BulkCheckIn(_) => "bulk check in",
        }
    }
}

/// A mutation validated against local state, waiting on the API.
#[derive(Debug)]
pub struct Staged {
    generation: u64,
    mutation: Mutation,
}

impl Staged {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }
}

/// What the API answered for a staged mutation.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Receipt {
    Done,
    Affected(usize),
}

/// Local effect of a committed mutation.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Applied {
    CheckedIn(String),
    Updated(Participant),
    Deleted(String),
    BulkCheckedIn { ids: Vec<String>, affected: usize },
}

/// A roster fetch issued under a given generation.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    event_id: String,
}

impl LoadTicket {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Summary of the session for display.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct RosterSnapshot {
    pub event_id: Option<String>,
    pub generation: u64,
    pub total: usize,
    pub checked_in: usize,
    pub visible: usize,
    pub selected: Vec<String>,
    pub all_selected: bool,
    pub editing: Option<String>,
    pub bulk_in_flight: bool,
    pub criteria: FilterCriteria,
}

/// Registrations view of one event: roster, filter, selection and the
/// participant being edited.
///
/// Mutations are two-phase. `stage_*` validates the request against local
/// state and reserves the affected rows, `commit` applies the API's answer.
/// Nothing is changed locally until the API has accepted the mutation.
#[derive(Debug, Default)]
pub struct RosterSession {
    generation: u64,
    event_name: Option<String>,
    /// Event being viewed, set before its roster arrives
    event_id: Option<String>,
    store: RosterStore,
    criteria: FilterCriteria,
    selection: SelectionSet,
    editor: Option<Participant>,
    bulk_in_flight: bool,
    busy_rows: BTreeSet<String>,
}

impl RosterSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the view to `event_id`. Everything belonging to the previous
    /// event is dropped, and responses issued for it will be discarded.
    pub fn open(&mut self, event_id: &str, event_name: Option<String>) -> LoadTicket {
        self.generation += 1;
        log::info!(
            "Opening registrations for event {} (generation {})",
            event_id,
            self.generation
        );

        self.event_id = Some(event_id.to_owned());
        self.event_name = event_name;
        self.store.clear();
        self.criteria = FilterCriteria::default();
        self.selection.clear();
        self.editor = None;
        self.bulk_in_flight = false;
        self.busy_rows.clear();

        LoadTicket {
            generation: self.generation,
            event_id: event_id.to_owned(),
        }
    }

    pub fn begin_reload(&self) -> Result<LoadTicket, RosterError> {
        let event_id = self.event_id.clone().ok_or(RosterError::NoEvent)?;
        Ok(LoadTicket {
            generation: self.generation,
            event_id,
        })
    }

    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Participant>, ApiError>,
    ) -> Result<usize, RosterError> {
        if ticket.generation != self.generation {
            log::debug!(
                "Discarding roster for event {} from generation {}",
                ticket.event_id,
                ticket.generation
            );
            return Err(RosterError::Stale);
        }

        let participants = result.map_err(|e| {
            log::warn!("Failed to load participants for {}: {}", ticket.event_id, e);
            RosterError::LoadFailed(e)
        })?;

        self.store.replace(&ticket.event_id, participants);
        self.selection.reconcile(&self.store);
        if self
            .editor
            .as_ref()
            .is_some_and(|e| self.store.get(&e.id).is_none())
        {
            self.editor = None;
        }
        Ok(self.store.len())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn store(&self) -> &RosterStore {
        &self.store
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.criteria.query = query.into();
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.criteria.status = status;
    }

    pub fn visible(&self) -> Vec<&Participant> {
        visible_rows(&self.store, &self.criteria)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn toggle(&mut self, id: &str, checked: bool) -> Result<(), RosterError> {
        if checked {
            let participant = self
                .store
                .get(id)
                .ok_or_else(|| RosterError::UnknownParticipant(id.to_owned()))?;
            if participant.checked_in {
                return Err(RosterError::AlreadyCheckedIn(id.to_owned()));
            }
        }
        self.selection.toggle(id, checked);
        Ok(())
    }

    pub fn select_all(&mut self) -> usize {
        let visible = visible_rows(&self.store, &self.criteria);
        self.selection.select_all(&visible);
        self.selection.len()
    }

    pub fn toggle_all(&mut self) -> usize {
        let visible = visible_rows(&self.store, &self.criteria);
        self.selection.toggle_all(&visible);
        self.selection.len()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_all_selected(&self) -> bool {
        self.selection.is_all_selected(&self.visible())
    }

    pub fn begin_edit(&mut self, id: &str) -> Result<&Participant, RosterError> {
        let participant = self
            .store
            .get(id)
            .ok_or_else(|| RosterError::UnknownParticipant(id.to_owned()))?
            .clone();
        Ok(self.editor.insert(participant))
    }

    pub fn edit_draft(&self) -> Option<&Participant> {
        self.editor.as_ref()
    }

    pub fn update_draft(&mut self, patch: &ParticipantPatch) -> Result<&Participant, RosterError> {
        let draft = self.editor.as_mut().ok_or(RosterError::NotEditing)?;
        if self.busy_rows.contains(&draft.id) {
            return Err(RosterError::RowBusy(draft.id.clone()));
        }
        draft.apply_patch(patch);
        Ok(draft)
    }

    pub fn cancel_edit(&mut self) {
        self.editor = None;
    }

    fn reserve(&mut self, mutation: Mutation) -> Result<Staged, RosterError> {
        let ids = mutation.ids();
        if let Some(busy) = ids.iter().find(|id| self.busy_rows.contains(*id)) {
            return Err(RosterError::RowBusy(busy.clone()));
        }
        self.busy_rows.extend(ids);
        Ok(Staged {
            generation: self.generation,
            mutation,
        })
    }

    pub fn stage_check_in(&mut self, id: &str) -> Result<Staged, RosterError> {
        let participant = self
            .store
            .get(id)
            .ok_or_else(|| RosterError::UnknownParticipant(id.to_owned()))?;
        if participant.checked_in {
            return Err(RosterError::AlreadyCheckedIn(id.to_owned()));
        }
        self.reserve(Mutation::CheckIn(id.to_owned()))
    }

    /// Stage the current draft. The editor stays open until the API accepts
    /// it.
    ///
    /// Only the editable fields come from the draft. Everything else is
    /// taken from the store, so a check-in recorded while the editor was
    /// open is kept.
    pub fn stage_save_edit(&mut self) -> Result<Staged, RosterError> {
        let draft = self.editor.as_ref().ok_or(RosterError::NotEditing)?;
        let mut record = self
            .store
            .get(&draft.id)
            .ok_or_else(|| RosterError::UnknownParticipant(draft.id.clone()))?
            .clone();
        record.apply_patch(&ParticipantPatch {
            first_name: Some(draft.first_name.clone()),
            last_name: Some(draft.last_name.clone()),
            email: Some(draft.email.clone()),
        });
        self.reserve(Mutation::Update(record))
    }

    pub fn stage_delete(&mut self, id: &str, confirmed: bool) -> Result<Staged, RosterError> {
        if self.store.get(id).is_none() {
            return Err(RosterError::UnknownParticipant(id.to_owned()));
        }
        if !confirmed {
            return Err(RosterError::ConfirmationRequired(id.to_owned()));
        }
        self.reserve(Mutation::Delete(id.to_owned()))
    }

    /// Stage one check-in covering the whole selection. Only one may be in
    /// flight.
    pub fn stage_bulk_check_in(&mut self) -> Result<Staged, RosterError> {
        if self.bulk_in_flight {
            return Err(RosterError::Busy);
        }
        if self.selection.is_empty() {
            return Err(RosterError::EmptySelection);
        }

        let staged = self.reserve(Mutation::BulkCheckIn(self.selection.ids()))?;
        self.bulk_in_flight = true;
        Ok(staged)
    }

    /// Apply the API's answer to a staged mutation. Failures leave the
    /// roster, selection and editor exactly as they were.
    pub fn commit(
        &mut self,
        staged: Staged,
        result: Result<Receipt, ApiError>,
        now: OffsetDateTime,
    ) -> Result<Applied, RosterError> {
        if staged.generation != self.generation {
            log::debug!(
                "Discarding {} response from generation {}",
                staged.mutation.action(),
                staged.generation
            );
            return Err(RosterError::Stale);
        }

        for id in staged.mutation.ids() {
            self.busy_rows.remove(&id);
        }
        if let Mutation::BulkCheckIn(_) = staged.mutation {
            self.bulk_in_flight = false;
        }

        let receipt = match result {
            Ok(receipt) => receipt,
            Err(e) => {
                log::warn!("Failed to {}: {}", staged.mutation.action(), e);
                return Err(match staged.mutation {
                    Mutation::BulkCheckIn(_) => RosterError::BulkActionFailed(e),
                    mutation => RosterError::MutationFailed {
                        action: mutation.action(),
                        source: e,
                    },
                });
            }
        };

        let applied = match staged.mutation {
            Mutation::CheckIn(id) => {
                self.store.apply_check_in(&[&id], now);
                self.selection.remove_all(&[&id]);
                Applied::CheckedIn(id)
            }
            Mutation::Update(participant) => {
                self.store.apply_update(participant.clone());
                if self.editor.as_ref().is_some_and(|e| e.id == participant.id) {
                    self.editor = None;
                }
                Applied::Updated(participant)
            }
            Mutation::Delete(id) => {
                self.store.apply_delete(&id);
                if self.editor.as_ref().is_some_and(|e| e.id == id) {
                    self.editor = None;
                }
                Applied::Deleted(id)
            }
            Mutation::BulkCheckIn(ids) => {
                self.store.apply_check_in(ids.as_slice(), now);
                self.selection.remove_all(ids.as_slice());
                let affected = match receipt {
                    Receipt::Affected(affected) => affected,
                    Receipt::Done => ids.len(),
                };
                Applied::BulkCheckedIn { ids, affected }
            }
        };

        self.selection.reconcile(&self.store);
        Ok(applied)
    }

    /// Export the rows passing the current filter.
    pub fn export(&self) -> Result<CsvExport, RosterError> {
        export_csv(&self.visible(), self.event_name.as_deref())
    }

    pub fn snapshot(&self) -> RosterSnapshot {
        let visible = self.visible();
        RosterSnapshot {
            event_id: self.event_id.clone(),
            generation: self.generation,
            total: self.store.len(),
            checked_in: self
                .store
                .participants()
                .iter()
                .filter(|p| p.checked_in)
                .count(),
            visible: visible.len(),
            selected: self.selection.ids(),
            all_selected: self.selection.is_all_selected(&visible),
            editing: self.editor.as_ref().map(|e| e.id.clone()),
            bulk_in_flight: self.bulk_in_flight,
            criteria: self.criteria.clone(),
        }
    }
}
