use serde::Deserialize;

use crate::{
    core::{
        auth::Credential,
        event::{Event, EventForm, EventStats, OrganizerStats},
    },
    error::ApiError,
};

use super::api::{authorized, send, send_json, ApiClient};

#[derive(Deserialize)]
struct EventsBody {
    events: Vec<Event>,
}

#[derive(Deserialize)]
struct EventBody {
    event: Event,
}

#[derive(Deserialize)]
struct StatsBody<T> {
    stats: T,
}

impl ApiClient {
    /// Every published event, no credential needed.
    pub async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        let body: EventsBody = send_json(self.get(&["events"])?).await?;
        Ok(body.events)
    }

    pub async fn get_event(&self, id: &str) -> Result<Event, ApiError> {
        let body: EventBody = send_json(self.get(&["events", id])?).await?;
        Ok(body.event)
    }

    /// Events organized by the signed-in user.
    pub async fn my_events(&self, credential: &Credential) -> Result<Vec<Event>, ApiError> {
        let request = authorized(self.get(&["events", "my", "events"])?, credential);
        let body: EventsBody = send_json(request).await?;
        Ok(body.events)
    }

    /// Validate and submit a new event. An invalid form is never sent.
    pub async fn create_event(
        &self,
        form: &EventForm,
        credential: &Credential,
    ) -> Result<Event, ApiError> {
        form.validate().into_result()?;
        let request = authorized(self.post(&["events"])?, credential).json(form);
        let body: EventBody = send_json(request).await?;
        log::info!("Created event {} ({})", body.event.name, body.event.id);
        Ok(body.event)
    }

    pub async fn update_event(
        &self,
        id: &str,
        form: &EventForm,
        credential: &Credential,
    ) -> Result<(), ApiError> {
        form.validate().into_result()?;
        send(authorized(self.put(&["events", id])?, credential).json(form)).await?;
        Ok(())
    }

    pub async fn delete_event(&self, id: &str, credential: &Credential) -> Result<(), ApiError> {
        send(authorized(self.delete(&["events", id])?, credential)).await?;
        log::info!("Deleted event {}", id);
        Ok(())
    }

    pub async fn event_stats(
        &self,
        event_id: &str,
        credential: &Credential,
    ) -> Result<EventStats, ApiError> {
        let request = authorized(self.get(&["stats", "events", event_id])?, credential);
        let body: StatsBody<EventStats> = send_json(request).await?;
        Ok(body.stats)
    }

    pub async fn my_stats(&self, credential: &Credential) -> Result<OrganizerStats, ApiError> {
        let request = authorized(self.get(&["stats", "my"])?, credential);
        let body: StatsBody<OrganizerStats> = send_json(request).await?;
        Ok(body.stats)
    }
}
