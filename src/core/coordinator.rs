use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{error::ApiError, ActorRef, Rto};

use super::{
    auth::Credential,
    export::CsvExport,
    filter::StatusFilter,
    gateway::ParticipantGateway,
    participant::{Participant, ParticipantPatch},
    session::{Applied, LoadTicket, Mutation, Receipt, RosterSession, RosterSnapshot, Staged},
};

/// Requests for the RosterActor
pub enum RosterRequest {
    /// Switch to an event (id, display name) and load its roster
    Open(String, Option<String>, Rto<usize>),
    Reload(Rto<usize>),
    SetQuery(String, Rto<()>),
    SetStatusFilter(StatusFilter, Rto<()>),
    Visible(Rto<Vec<Participant>>),
    Toggle(String, bool, Rto<()>),
    SelectAll(Rto<usize>),
    ToggleAll(Rto<usize>),
    ClearSelection(Rto<()>),
    Selection(Rto<Vec<String>>),
    CheckIn(String, Rto<Applied>),
    BeginEdit(String, Rto<Participant>),
    EditDraft(Rto<Option<Participant>>),
    UpdateDraft(ParticipantPatch, Rto<Participant>),
    SaveEdit(Rto<Applied>),
    CancelEdit(Rto<()>),
    /// Delete a participant, the flag being the operator's confirmation
    Delete(String, bool, Rto<Applied>),
    BulkCheckIn(Rto<Applied>),
    Export(Rto<CsvExport>),
    Snapshot(Rto<RosterSnapshot>),
    Shutdown(Rto<()>),
}

pub type RosterActor = ActorRef<RosterRequest>;

/// Network results routed back into the actor
enum Completion {
    Loaded(LoadTicket, Result<Vec<Participant>, ApiError>, Rto<usize>),
    Mutated(Staged, Result<Receipt, ApiError>, Rto<Applied>),
}

struct Remote {
    gateway: Arc<dyn ParticipantGateway>,
    credential: Credential,
    done: UnboundedSender<Completion>,
}

impl Remote {
    fn spawn_load(&self, ticket: LoadTicket, rto: Rto<usize>) {
        let gateway = self.gateway.clone();
        let credential = self.credential.clone();
        let done = self.done.clone();

        tokio::spawn(async move {
            let result = gateway
                .list_participants(ticket.event_id(), &credential)
                .await;
            let _ = done.send(Completion::Loaded(ticket, result, rto));
        });
    }

    fn spawn_mutation(&self, staged: Staged, rto: Rto<Applied>) {
        let gateway = self.gateway.clone();
        let credential = self.credential.clone();
        let done = self.done.clone();

        tokio::spawn(async move {
            let result = perform(gateway.as_ref(), staged.mutation(), &credential).await;
            let _ = done.send(Completion::Mutated(staged, result, rto));
        });
    }
}

async fn perform(
    gateway: &dyn ParticipantGateway,
    mutation: &Mutation,
    credential: &Credential,
) -> Result<Receipt, ApiError> {
    match mutation {
        Mutation::CheckIn(id) => gateway.check_in(id, credential).await.map(|_| Receipt::Done),
        Mutation::Update(participant) => gateway
            .update_participant(participant, credential)
            .await
            .map(|_| Receipt::Done),
        Mutation::Delete(id) => gateway
            .delete_participant(id, credential)
            .await
            .map(|_| Receipt::Done),
        Mutation::BulkCheckIn(ids) => gateway
            .bulk_check_in(ids, credential)
            .await
            .map(Receipt::Affected),
    }
}

fn log_applied(applied: &Applied) {
    match applied {
        Applied::CheckedIn(id) => log::info!("Checked in participant {}", id),
        Applied::Updated(participant) => log::info!("Updated participant {}", participant.id),
        Applied::Deleted(id) => log::info!("Deleted participant {}", id),
        Applied::BulkCheckedIn { ids, affected } => log::info!(
            "Checked in {} participant(s), {} submitted",
            affected,
            ids.len()
        ),
    }
}

fn complete(session: &mut RosterSession, completion: Completion) {
    match completion {
        Completion::Loaded(ticket, result, rto) => {
            rto.reply(session.finish_load(ticket, result).map_err(Into::into))
        }
        Completion::Mutated(staged, result, rto) => {
            let applied = session.commit(staged, result, OffsetDateTime::now_utc());
            if let Ok(applied) = &applied {
                log_applied(applied);
            }
            rto.reply(applied.map_err(Into::into));
        }
    }
}

/// Returns false once the actor should stop.
fn handle(session: &mut RosterSession, remote: &Remote, msg: RosterRequest) -> bool {
    match msg {
        RosterRequest::Open(event_id, event_name, rto) => {
            let ticket = session.open(&event_id, event_name);
            remote.spawn_load(ticket, rto);
        }
        RosterRequest::Reload(rto) => match session.begin_reload() {
            Ok(ticket) => remote.spawn_load(ticket, rto),
            Err(e) => rto.reply(Err(e.into())),
        },
        RosterRequest::SetQuery(query, rto) => {
            session.set_query(query);
            rto.reply(Ok(()));
        }
        RosterRequest::SetStatusFilter(status, rto) => {
            session.set_status_filter(status);
            rto.reply(Ok(()));
        }
        RosterRequest::Visible(rto) => {
            rto.reply(Ok(session.visible().into_iter().cloned().collect()))
        }
        RosterRequest::Toggle(id, checked, rto) => {
            rto.reply(session.toggle(&id, checked).map_err(Into::into))
        }
        RosterRequest::SelectAll(rto) => rto.reply(Ok(session.select_all())),
        RosterRequest::ToggleAll(rto) => rto.reply(Ok(session.toggle_all())),
        RosterRequest::ClearSelection(rto) => {
            session.clear_selection();
            rto.reply(Ok(()));
        }
        RosterRequest::Selection(rto) => rto.reply(Ok(session.selection().ids())),
        RosterRequest::CheckIn(id, rto) => match session.stage_check_in(&id) {
            Ok(staged) => remote.spawn_mutation(staged, rto),
            Err(e) => rto.reply(Err(e.into())),
        },
        RosterRequest::BeginEdit(id, rto) => {
            rto.reply(session.begin_edit(&id).cloned().map_err(Into::into))
        }
        RosterRequest::EditDraft(rto) => rto.reply(Ok(session.edit_draft().cloned())),
        RosterRequest::UpdateDraft(patch, rto) => {
            rto.reply(session.update_draft(&patch).cloned().map_err(Into::into))
        }
        RosterRequest::SaveEdit(rto) => match session.stage_save_edit() {
            Ok(staged) => remote.spawn_mutation(staged, rto),
            Err(e) => rto.reply(Err(e.into())),
        },
        RosterRequest::CancelEdit(rto) => {
            session.cancel_edit();
            rto.reply(Ok(()));
        }
        RosterRequest::Delete(id, confirmed, rto) => match session.stage_delete(&id, confirmed) {
            Ok(staged) => remote.spawn_mutation(staged, rto),
            Err(e) => rto.reply(Err(e.into())),
        },
        RosterRequest::BulkCheckIn(rto) => match session.stage_bulk_check_in() {
            Ok(staged) => {
                log::info!(
                    "Submitting bulk check-in for {} participant(s)",
                    session.selection().len()
                );
                remote.spawn_mutation(staged, rto)
            }
            Err(e) => rto.reply(Err(e.into())),
        },
        RosterRequest::Export(rto) => rto.reply(session.export().map_err(Into::into)),
        RosterRequest::Snapshot(rto) => rto.reply(Ok(session.snapshot())),
        RosterRequest::Shutdown(rto) => {
            rto.reply(Ok(()));
            return false;
        }
    }
    true
}

/// Owns the registrations view of one operator session.
///
/// Requests are handled one at a time. Network calls run in their own
/// tasks and their results are applied here, so the session is only ever
/// touched by this task.
pub async fn run_roster_actor(
    gateway: Arc<dyn ParticipantGateway>,
    credential: Credential,
    mut rx: UnboundedReceiver<RosterRequest>,
) -> anyhow::Result<()> {
    let (done, mut done_rx) = mpsc::unbounded_channel::<Completion>();
    let remote = Remote {
        gateway,
        credential,
        done,
    };
    let mut session = RosterSession::new();

    log::debug!("Started roster actor");
    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(msg) => {
                    if !handle(&mut session, &remote, msg) {
                        break;
                    }
                }
                None => break,
            },
            Some(completion) = done_rx.recv() => complete(&mut session, completion),
        }
    }
    log::debug!("Roster actor stopped");

    Ok(())
}

/// Start a roster actor on the current runtime.
pub fn spawn_roster_actor(
    gateway: Arc<dyn ParticipantGateway>,
    credential: Credential,
) -> (RosterActor, tokio::task::JoinHandle<anyhow::Result<()>>) {
    let (actor, rx) = RosterActor::new();
    let task = tokio::spawn(run_roster_actor(gateway, credential, rx));
    (actor, task)
}
