use futures::{future::BoxFuture, FutureExt};
use serde::Deserialize;
use serde_json::json;

use crate::{
    core::{
        auth::Credential,
        gateway::{dedup_ids, decode_affected_count, ParticipantGateway, ParticipantList},
        participant::Participant,
        registration::RegistrationForm,
    },
    error::ApiError,
};

use super::api::{authorized, send, send_json, ApiClient};

#[derive(Deserialize)]
#[serde(untagged)]
enum SingleParticipant {
    Wrapped { participant: Participant },
    Bare(Participant),
}

impl ParticipantGateway for ApiClient {
    fn list_participants<'a>(
        &'a self,
        event_id: &'a str,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Vec<Participant>, ApiError>> {
        async move {
            let request = authorized(self.get(&["participants", "events", event_id])?, credential);
            let list: ParticipantList = send_json(request).await?;
            let participants = list.into_participants();
            log::debug!(
                "Loaded {} participant(s) for event {}",
                participants.len(),
                event_id
            );
            Ok(participants)
        }
        .boxed()
    }

    fn get_participant<'a>(
        &'a self,
        id: &'a str,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Participant, ApiError>> {
        async move {
            let request = authorized(self.get(&["participants", id])?, credential);
            Ok(match send_json(request).await? {
                SingleParticipant::Wrapped { participant } => participant,
                SingleParticipant::Bare(participant) => participant,
            })
        }
        .boxed()
    }

    fn update_participant<'a>(
        &'a self,
        participant: &'a Participant,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        async move {
            let request = authorized(self.put(&["participants", participant.id.as_str()])?, credential)
                .json(participant);
            send(request).await?;
            Ok(())
        }
        .boxed()
    }

    fn delete_participant<'a>(
        &'a self,
        id: &'a str,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        async move {
            send(authorized(self.delete(&["participants", id])?, credential)).await?;
            Ok(())
        }
        .boxed()
    }

    fn check_in<'a>(
        &'a self,
        id: &'a str,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        async move {
            send(authorized(self.post(&["participants", id, "check-in"])?, credential)).await?;
            Ok(())
        }
        .boxed()
    }

    fn bulk_check_in<'a>(
        &'a self,
        ids: &'a [String],
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<usize, ApiError>> {
        async move {
            let ids = dedup_ids(ids);
            let request = authorized(self.post(&["participants", "bulk-check-in"])?, credential)
                .json(&json!({ "ids": ids }));
            let body = send(request).await?.bytes().await?;
            Ok(decode_affected_count(&body, ids.len()))
        }
        .boxed()
    }

    fn register<'a>(
        &'a self,
        event_id: &'a str,
        form: &'a RegistrationForm,
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        async move {
            form.validate().into_result()?;
            let request = self
                .post(&["participants", "events", event_id, "register"])?
                .json(form);
            send(request).await?;
            log::info!("Registered {} for event {}", form.display_name(), event_id);
            Ok(())
        }
        .boxed()
    }
}
