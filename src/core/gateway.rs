use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

use super::{auth::Credential, participant::Participant, registration::RegistrationForm};

/// Remote participant endpoints used by the roster.
///
/// Every protected call takes the session credential explicitly.
pub trait ParticipantGateway: Send + Sync {
    fn list_participants<'a>(
        &'a self,
        event_id: &'a str,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Vec<Participant>, ApiError>>;

    fn get_participant<'a>(
        &'a self,
        id: &'a str,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Participant, ApiError>>;

    fn update_participant<'a>(
        &'a self,
        participant: &'a Participant,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn delete_participant<'a>(
        &'a self,
        id: &'a str,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn check_in<'a>(
        &'a self,
        id: &'a str,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    /// Check in many participants with one request. Returns the number of
    /// participants the API reports as affected.
    fn bulk_check_in<'a>(
        &'a self,
        ids: &'a [String],
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<usize, ApiError>>;

    /// Public registration, no credential needed.
    fn register<'a>(
        &'a self,
        event_id: &'a str,
        form: &'a RegistrationForm,
    ) -> BoxFuture<'a, Result<(), ApiError>>;
}

/// Drop repeated ids, keeping the first occurrence of each.
pub fn dedup_ids(ids: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(id.clone());
        }
    }
    unique
}

/// The roster list comes back either wrapped or bare.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ParticipantList {
    Wrapped { participants: Vec<Participant> },
    Bare(Vec<Participant>),
}

impl ParticipantList {
    pub fn into_participants(self) -> Vec<Participant> {
        match self {
            ParticipantList::Wrapped { participants } => participants,
            ParticipantList::Bare(participants) => participants,
        }
    }
}

/// The `result` field of a bulk check-in response.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum BulkResult {
    /// Positional tuple, affected count first
    Positional(Vec<Value>),
    Counted {
        #[serde(rename = "affectedRows")]
        affected_rows: u64,
    },
}

#[derive(Deserialize, Debug)]
struct BulkCheckInResponse {
    result: Option<BulkResult>,
}

impl BulkResult {
    pub fn affected(&self) -> Option<usize> {
        match self {
            BulkResult::Positional(values) => values
                .first()
                .and_then(Value::as_u64)
                .map(|n| n as usize),
            BulkResult::Counted { affected_rows } => Some(*affected_rows as usize),
        }
    }
}

/// Normalize a bulk check-in response body into an affected count.
///
/// This is the only place the response shape is inspected. Any body that
/// carries neither shape counts as `submitted`.
pub fn decode_affected_count(body: &[u8], submitted: usize) -> usize {
    serde_json::from_slice::<BulkCheckInResponse>(body)
        .ok()
        .and_then(|response| response.result)
        .and_then(|result| result.affected())
        .unwrap_or(submitted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_ids() {
        let ids = vec!["a".to_owned(), "a".to_owned(), "b".to_owned()];
        assert_eq!(dedup_ids(&ids), vec!["a".to_owned(), "b".to_owned()]);
        assert!(dedup_ids(&[]).is_empty());
    }

    #[test]
    fn test_affected_count_shapes() {
        assert_eq!(decode_affected_count(br#"{"result":[2]}"#, 5), 2);
        assert_eq!(decode_affected_count(br#"{"result":[3, {"info": 1}]}"#, 5), 3);
        assert_eq!(decode_affected_count(br#"{"result":{"affectedRows":4}}"#, 5), 4);
        assert_eq!(decode_affected_count(br#"{"result":{"affectedRows":0}}"#, 5), 0);
    }

    #[test]
    fn test_affected_count_fallback() {
        assert_eq!(decode_affected_count(br#"{"result":[]}"#, 5), 5);
        assert_eq!(decode_affected_count(br#"{"result":"ok"}"#, 5), 5);
        assert_eq!(decode_affected_count(br#"{"message":"done"}"#, 5), 5);
        assert_eq!(decode_affected_count(b"", 5), 5);
        assert_eq!(decode_affected_count(b"not json", 2), 2);
    }

    #[test]
    fn test_participant_list_shapes() {
        let wrapped: ParticipantList = serde_json::from_str(
            r#"{"participants":[{"id":"1","firstName":"a","lastName":"b","email":"c"}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.into_participants()[0].id, "1");

        let bare: ParticipantList = serde_json::from_str(
            r#"[{"id":"2","firstName":"a","lastName":"b","email":"c"}]"#,
        )
        .unwrap();
        assert_eq!(bare.into_participants()[0].id, "2");
    }
}
