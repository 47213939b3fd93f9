use time::OffsetDateTime;

use crate::error::RosterError;

use super::{auth::Credential, gateway::ParticipantGateway, participant::Participant};

/// Local view of one event's participants, in the order the API returned
/// them.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct RosterStore {
    event_id: Option<String>,
    participants: Vec<Participant>,
}

impl RosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the roster for `event_id` and replace the store with it.
    ///
    /// On failure the previous contents are kept.
    pub async fn load(
        &mut self,
        gateway: &dyn ParticipantGateway,
        event_id: &str,
        credential: &Credential,
    ) -> Result<&[Participant], RosterError> {
        let participants = gateway
            .list_participants(event_id, credential)
            .await
            .map_err(RosterError::LoadFailed)?;

        self.replace(event_id, participants);
        Ok(&self.participants)
    }

    /// Replace the store wholesale.
    pub fn replace(&mut self, event_id: &str, participants: Vec<Participant>) {
        log::debug!(
            "Loaded {} participants for event {}",
            participants.len(),
            event_id
        );
        self.event_id = Some(event_id.to_owned());
        self.participants = participants;
    }

    pub fn clear(&mut self) {
        self.event_id = None;
        self.participants.clear();
    }

    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Overwrite the participant with the same id. Returns false if no such
    /// participant exists.
    pub fn apply_update(&mut self, participant: Participant) -> bool {
        match self.participants.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => {
                *existing = participant;
                true
            }
            None => {
                log::warn!("Ignoring update for unknown participant {}", participant.id);
                false
            }
        }
    }

    pub fn apply_delete(&mut self, id: &str) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.id == id)?;
        Some(self.participants.remove(index))
    }

    /// Mark every matching participant as checked in at `at`. Unknown ids
    /// are ignored. Returns how many participants matched.
    pub fn apply_check_in<S: AsRef<str>>(&mut self, ids: &[S], at: OffsetDateTime) -> usize {
        let mut matched = 0;
        for participant in self
            .participants
            .iter_mut()
            .filter(|p| ids.iter().any(|id| id.as_ref() == p.id))
        {
            participant.mark_checked_in(at);
            matched += 1;
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fake::{participant, FakeGateway};

    fn store() -> RosterStore {
        let mut store = RosterStore::new();
        store.replace(
            "e1",
            vec![
                participant("1", "John", "Doe", false),
                participant("2", "Amy", "Jones", true),
                participant("3", "Li", "Wei", false),
            ],
        );
        store
    }

    #[test]
    fn test_apply_update() {
        let mut store = store();
        let mut edited = store.get("1").unwrap().clone();
        edited.first_name = "Johnny".to_owned();

        assert!(store.apply_update(edited));
        assert_eq!(store.get("1").unwrap().first_name, "Johnny");
        assert_eq!(store.participants()[0].id, "1");

        assert!(!store.apply_update(participant("9", "No", "One", false)));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_apply_delete() {
        let mut store = store();
        assert_eq!(store.apply_delete("2").map(|p| p.id), Some("2".to_owned()));
        assert!(store.apply_delete("2").is_none());
        let ids: Vec<&str> = store.participants().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_apply_check_in() {
        let mut store = store();
        let at = OffsetDateTime::UNIX_EPOCH;

        assert_eq!(store.apply_check_in(&["1", "3", "missing"], at), 2);
        assert!(store.get("1").unwrap().checked_in);
        assert_eq!(store.get("3").unwrap().checked_in_at, Some(at));
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_load_replaces_store() {
        let gateway = FakeGateway::with_roster(
            "e2",
            vec![participant("7", "Kim", "Lee", false)],
        );
        let mut store = store();

        let loaded = store
            .load(&gateway, "e2", &Credential::new("t"))
            .await
            .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(store.event_id(), Some("e2"));
        assert_eq!(store.participants()[0].id, "7");
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_store() {
        let gateway = FakeGateway::default();
        gateway.fail("list");
        let mut store = store();

        let result = store.load(&gateway, "e2", &Credential::new("t")).await;
        assert!(matches!(result, Err(RosterError::LoadFailed(_))));
        assert_eq!(store.event_id(), Some("e1"));
        assert_eq!(store.len(), 3);
    }
}
