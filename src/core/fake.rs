//! In-memory gateway for exercising the roster without a server.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use futures::{future::BoxFuture, FutureExt};
use tokio::sync::Notify;

use crate::error::ApiError;

use super::{
    auth::Credential,
    gateway::{decode_affected_count, ParticipantGateway},
    participant::Participant,
    registration::RegistrationForm,
};

pub fn participant(id: &str, first: &str, last: &str, checked_in: bool) -> Participant {
    Participant {
        id: id.to_owned(),
        event_id: "e1".to_owned(),
        first_name: first.to_owned(),
        last_name: last.to_owned(),
        checked_in,
        ..Default::default()
    }
}

#[derive(Default)]
pub struct FakeGateway {
    rosters: Mutex<HashMap<String, Vec<Participant>>>,
    failing: Mutex<HashSet<&'static str>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
    bulk_body: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
    bulk_requests: Mutex<Vec<Vec<String>>>,
}

impl FakeGateway {
    pub fn with_roster(event_id: &str, participants: Vec<Participant>) -> Self {
        let gateway = FakeGateway::default();
        gateway.set_roster(event_id, participants);
        gateway
    }

    pub fn set_roster(&self, event_id: &str, participants: Vec<Participant>) {
        self.rosters
            .lock()
            .unwrap()
            .insert(event_id.to_owned(), participants);
    }

    /// Make every call of `operation` fail with a 500.
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.failing.lock().unwrap().remove(operation);
    }

    /// Block calls matching `key` (e.g. `list:e1`, `bulk`) until the
    /// returned handle is notified.
    pub fn hold(&self, key: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds
            .lock()
            .unwrap()
            .insert(key.to_owned(), notify.clone());
        notify
    }

    pub fn set_bulk_body(&self, body: &str) {
        *self.bulk_body.lock().unwrap() = Some(body.to_owned());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn bulk_requests(&self) -> Vec<Vec<String>> {
        self.bulk_requests.lock().unwrap().clone()
    }

    async fn enter(&self, operation: &'static str, key: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(key.clone());

        let hold = self.holds.lock().unwrap().get(&key).cloned();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        if self.failing.lock().unwrap().contains(operation) {
            Err(ApiError::Status {
                status: 500,
                message: format!("{} failed", operation),
            })
        } else {
            Ok(())
        }
    }
}

impl ParticipantGateway for FakeGateway {
    fn list_participants<'a>(
        &'a self,
        event_id: &'a str,
        _credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Vec<Participant>, ApiError>> {
        async move {
            self.enter("list", format!("list:{}", event_id)).await?;
            Ok(self
                .rosters
                .lock()
                .unwrap()
                .get(event_id)
                .cloned()
                .unwrap_or_default())
        }
        .boxed()
    }

    fn get_participant<'a>(
        &'a self,
        id: &'a str,
        _credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Participant, ApiError>> {
        async move {
            self.enter("get", format!("get:{}", id)).await?;
            self.rosters
                .lock()
                .unwrap()
                .values()
                .flatten()
                .find(|p| p.id == id)
                .cloned()
                .ok_or(ApiError::Status {
                    status: 404,
                    message: "Participant not found".to_owned(),
                })
        }
        .boxed()
    }

    fn update_participant<'a>(
        &'a self,
        participant: &'a Participant,
        _credential: &'a Credential,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        async move { self.enter("update", format!("update:{}", participant.id)).await }.boxed()
    }

    fn delete_participant<'a>(
        &'a self,
        id: &'a str,
        _credential: &'a Credential,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        async move { self.enter("delete", format!("delete:{}", id)).await }.boxed()
    }

    fn check_in<'a>(
        &'a self,
        id: &'a str,
        _credential: &'a Credential,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        async move { self.enter("check_in", format!("check_in:{}", id)).await }.boxed()
    }

    fn bulk_check_in<'a>(
        &'a self,
        ids: &'a [String],
        _credential: &'a Credential,
    ) -> BoxFuture<'a, Result<usize, ApiError>> {
        async move {
            self.bulk_requests.lock().unwrap().push(ids.to_vec());
            self.enter("bulk", "bulk".to_owned()).await?;
            let body = self.bulk_body.lock().unwrap().clone().unwrap_or_default();
            Ok(decode_affected_count(body.as_bytes(), ids.len()))
        }
        .boxed()
    }

    fn register<'a>(
        &'a self,
        event_id: &'a str,
        _form: &'a RegistrationForm,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        async move { self.enter("register", format!("register:{}", event_id)).await }.boxed()
    }
}
