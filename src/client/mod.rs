//! Room client controller: keeps a local copy of a room, applies the caller's own
//! actions through a [`RoomBackend`] and reloads whenever the room feed reports a
//! relevant change.

use futures::{
    StreamExt,
    future::BoxFuture,
    stream::BoxStream,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::codes::normalize_code;

pub use crate::{
    dao::models::{FoodType, TeamName},
    dto::{
        feed::{ChangeEvent, ChangeKind, ChangeTable},
        room::{
            JoinRoomRequest, ParticipantSummary, RaceSummary, RoomSnapshot, RoomView, TeamStanding,
        },
    },
};

#[cfg(feature = "http-client")]
pub mod http;
pub mod local;

/// Errors surfaced by the room controller and its backends.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The room API answered with an error status.
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code of the answer.
        status: u16,
        /// Message carried by the error envelope.
        message: String,
    },
    /// The room API could not be reached.
    #[error("transport failure: {0}")]
    Transport(String),
    /// A payload could not be decoded.
    #[error("malformed payload: {0}")]
    Decode(String),
    /// No snapshot has been loaded yet.
    #[error("room state not loaded")]
    NotLoaded,
    /// This client has not joined the room.
    #[error("no participant joined from this client")]
    NotJoined,
    /// The action is not allowed from this client in the current room state.
    #[error("not allowed: {0}")]
    NotAllowed(&'static str),
}

/// Stream of change notifications for one room.
pub type ChangeStream = BoxStream<'static, Result<ChangeEvent, ClientError>>;

/// Transport used by [`RoomController`] to reach the room API.
pub trait RoomBackend: Send + Sync {
    /// Fetch the full state of a room.
    fn load(&self, room_code: &str) -> BoxFuture<'static, Result<RoomSnapshot, ClientError>>;

    /// Add a participant to the room.
    fn join(
        &self,
        room_code: &str,
        request: JoinRoomRequest,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>>;

    /// Apply a signed delta to a participant's counter.
    fn update_count(
        &self,
        room_code: &str,
        participant_id: Uuid,
        delta: i32,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>>;

    /// Change a participant's avatar.
    fn update_avatar(
        &self,
        room_code: &str,
        participant_id: Uuid,
        avatar: String,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>>;

    /// Move a participant to a team.
    fn choose_team(
        &self,
        room_code: &str,
        participant_id: Uuid,
        team: TeamName,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>>;

    /// End the race on behalf of `participant_id`, who must be the VIP.
    fn end_race(
        &self,
        room_code: &str,
        participant_id: Uuid,
    ) -> BoxFuture<'static, Result<RaceSummary, ClientError>>;

    /// Follow the room's change feed.
    fn subscribe(&self, room_code: &str) -> BoxFuture<'static, Result<ChangeStream, ClientError>>;
}

/// Client-side state of one room screen.
pub struct RoomController<B> {
    backend: B,
    room_code: String,
    my_participant_id: Option<Uuid>,
    snapshot: Option<RoomSnapshot>,
}

impl<B: RoomBackend> RoomController<B> {
    /// Controller for `room_code`, normalized the way the server stores it.
    pub fn new(backend: B, room_code: &str) -> Self {
        Self {
            backend,
            room_code: normalize_code(room_code),
            my_participant_id: None,
            snapshot: None,
        }
    }

    /// Resume with a participant id remembered from an earlier session.
    pub fn with_participant(mut self, participant_id: Uuid) -> Self {
        self.my_participant_id = Some(participant_id);
        self
    }

    /// Normalized code of the room.
    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    /// Participant joined from this client, if any.
    pub fn my_participant_id(&self) -> Option<Uuid> {
        self.my_participant_id
    }

    /// Last loaded room state.
    pub fn snapshot(&self) -> Option<&RoomSnapshot> {
        self.snapshot.as_ref()
    }

    /// Whether this client's participant is the room VIP.
    pub fn is_vip(&self) -> bool {
        match (&self.snapshot, self.my_participant_id) {
            (Some(snapshot), Some(me)) => {
                snapshot.race.vip_participant_id == Some(me)
                    || snapshot.participant(me).is_some_and(|p| p.is_vip)
            }
            _ => false,
        }
    }

    /// Replace the local copy with the full room state.
    pub async fn load(&mut self) -> Result<&RoomSnapshot, ClientError> {
        let snapshot = self.backend.load(&self.room_code).await?;
        Ok(self.snapshot.insert(snapshot))
    }

    /// Join the room and remember the new participant as "me".
    pub async fn join(&mut self, request: JoinRoomRequest) -> Result<ParticipantSummary, ClientError> {
        let participant = self.backend.join(&self.room_code, request).await?;
        info!(room_code = %self.room_code, participant_id = %participant.id, "joined room");
        self.my_participant_id = Some(participant.id);
        self.load().await?;
        Ok(participant)
    }

    /// Apply a counter delta to my own participant while the race is active.
    ///
    /// The local counter is clamped at zero before the write so the screen never shows
    /// a negative value; the store clamps again atomically. A rejected write puts the
    /// previous local value back.
    pub async fn update_count(
        &mut self,
        participant_id: Uuid,
        delta: i32,
    ) -> Result<ParticipantSummary, ClientError> {
        let me = self.my_participant_id.ok_or(ClientError::NotJoined)?;
        if participant_id != me {
            return Err(ClientError::NotAllowed("only your own counter can change"));
        }
        let snapshot = self.snapshot.as_mut().ok_or(ClientError::NotLoaded)?;
        if !snapshot.race.is_active {
            return Err(ClientError::NotAllowed("race already ended"));
        }
        let previous = snapshot
            .participants
            .iter_mut()
            .find(|p| p.id == me)
            .map(|local| {
                let previous = local.items_eaten;
                local.items_eaten = clamp_count(previous, delta);
                previous
            });

        match self
            .backend
            .update_count(&self.room_code, participant_id, delta)
            .await
        {
            Ok(updated) => {
                self.replace_participant(&updated);
                Ok(updated)
            }
            Err(err) => {
                if let Some(previous) = previous {
                    self.set_local_count(me, previous);
                }
                Err(err)
            }
        }
    }

    /// Change my own avatar.
    pub async fn update_avatar(&mut self, avatar: &str) -> Result<ParticipantSummary, ClientError> {
        let me = self.my_participant_id.ok_or(ClientError::NotJoined)?;
        let updated = self
            .backend
            .update_avatar(&self.room_code, me, avatar.to_owned())
            .await?;
        self.replace_participant(&updated);
        Ok(updated)
    }

    /// Move my participant to `team`; only offered in team mode.
    pub async fn choose_team(&mut self, team: TeamName) -> Result<ParticipantSummary, ClientError> {
        let me = self.my_participant_id.ok_or(ClientError::NotJoined)?;
        let snapshot = self.snapshot.as_ref().ok_or(ClientError::NotLoaded)?;
        if !snapshot.race.is_team_mode {
            return Err(ClientError::NotAllowed("room is not in team mode"));
        }
        let updated = self.backend.choose_team(&self.room_code, me, team).await?;
        self.replace_participant(&updated);
        Ok(updated)
    }

    /// End the race; only offered to the VIP.
    pub async fn end_race(&mut self) -> Result<RaceSummary, ClientError> {
        let me = self.my_participant_id.ok_or(ClientError::NotJoined)?;
        if self.snapshot.is_none() {
            return Err(ClientError::NotLoaded);
        }
        if !self.is_vip() {
            return Err(ClientError::NotAllowed("only the VIP can end the race"));
        }
        let race = self.backend.end_race(&self.room_code, me).await?;
        self.load().await?;
        Ok(race)
    }

    /// React to a feed notification. Returns whether the room was reloaded.
    pub async fn handle_change(&mut self, event: &ChangeEvent) -> Result<bool, ClientError> {
        if event.room_code != self.room_code || !event.requires_reload() {
            return Ok(false);
        }
        debug!(room_code = %self.room_code, table = ?event.table, kind = ?event.kind, "reloading room");
        self.load().await?;
        Ok(true)
    }

    /// Load the room, then follow its feed until the stream ends.
    ///
    /// Every relevant notification triggers a full reload; `on_update` sees each new
    /// snapshot. Stream errors end the loop.
    pub async fn run_sync<F>(&mut self, mut on_update: F) -> Result<(), ClientError>
    where
        F: FnMut(&RoomSnapshot),
    {
        let mut changes = self.backend.subscribe(&self.room_code).await?;
        on_update(self.load().await?);

        while let Some(change) = changes.next().await {
            let change = match change {
                Ok(change) => change,
                Err(err) => {
                    warn!(room_code = %self.room_code, error = %err, "room feed failed");
                    return Err(err);
                }
            };
            if self.handle_change(&change).await? {
                if let Some(snapshot) = &self.snapshot {
                    on_update(snapshot);
                }
            }
        }
        Ok(())
    }

    fn set_local_count(&mut self, participant_id: Uuid, items_eaten: u32) {
        if let Some(local) = self
            .snapshot
            .as_mut()
            .and_then(|snapshot| snapshot.participants.iter_mut().find(|p| p.id == participant_id))
        {
            local.items_eaten = items_eaten;
        }
    }

    fn replace_participant(&mut self, updated: &ParticipantSummary) {
        if let Some(snapshot) = self.snapshot.as_mut() {
            if let Some(local) = snapshot.participants.iter_mut().find(|p| p.id == updated.id) {
                *local = updated.clone();
            }
        }
    }
}

fn clamp_count(current: u32, delta: i32) -> u32 {
    current.saturating_add_signed(delta)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{local::LocalBackend, *};
    use crate::{
        config::AppConfig,
        dao::{competition_store::memory::MemoryCompetitionStore, models::FoodType},
        dto::room::{CreateRoomRequest, RoomView},
        services::room_service,
        state::{AppState, SharedState},
    };

    fn state() -> SharedState {
        AppState::with_store(AppConfig::default(), Arc::new(MemoryCompetitionStore::new()))
    }

    async fn room(state: &SharedState, team_mode: bool) -> String {
        room_service::create_room(
            state,
            CreateRoomRequest {
                name: "Pizza Night".into(),
                food_type: FoodType::Pizza,
                is_team_mode: team_mode,
            },
        )
        .await
        .expect("create room")
        .room_code
    }

    fn join_as(name: &str) -> JoinRoomRequest {
        JoinRoomRequest {
            name: name.into(),
            ..JoinRoomRequest::default()
        }
    }

    #[test]
    fn local_clamp_never_goes_negative() {
        assert_eq!(clamp_count(0, -1), 0);
        assert_eq!(clamp_count(2, -5), 0);
        assert_eq!(clamp_count(2, 3), 5);
    }

    #[tokio::test]
    async fn join_remembers_my_participant() {
        let state = state();
        let code = room(&state, false).await;
        let mut controller = RoomController::new(LocalBackend::new(state), &code.to_lowercase());

        let me = controller.join(join_as("Ana")).await.expect("join");
        assert_eq!(controller.my_participant_id(), Some(me.id));
        assert!(controller.is_vip());
        assert_eq!(controller.snapshot().map(|s| s.participants.len()), Some(1));
    }

    #[tokio::test]
    async fn only_my_counter_can_change() {
        let state = state();
        let code = room(&state, false).await;
        let other = room_service::join_room(&state, &code, join_as("Bia"))
            .await
            .expect("join other");

        let mut controller = RoomController::new(LocalBackend::new(state), &code);
        let me = controller.join(join_as("Ana")).await.expect("join");

        let err = controller
            .update_count(other.id, 1)
            .await
            .expect_err("foreign counter");
        assert!(matches!(err, ClientError::NotAllowed(_)));

        controller.update_count(me.id, 2).await.expect("increment");
        let updated = controller.update_count(me.id, -5).await.expect("decrement");
        assert_eq!(updated.items_eaten, 0);
    }

    #[tokio::test]
    async fn non_vip_cannot_end_the_race() {
        let state = state();
        let code = room(&state, false).await;
        room_service::join_room(&state, &code, join_as("Vip"))
            .await
            .expect("vip joins");

        let mut controller = RoomController::new(LocalBackend::new(state), &code);
        controller.join(join_as("Guest")).await.expect("join");
        assert!(!controller.is_vip());
        let err = controller.end_race().await.expect_err("not vip");
        assert!(matches!(err, ClientError::NotAllowed(_)));
    }

    #[tokio::test]
    async fn changes_from_others_trigger_reload() {
        let state = state();
        let code = room(&state, false).await;
        let backend = LocalBackend::new(state.clone());
        let mut changes = backend.subscribe(&code).await.expect("subscribe");

        let mut controller = RoomController::new(backend, &code);
        let me = controller.join(join_as("Ana")).await.expect("join");
        // Drain notifications caused by our own join.
        changes.next().await.expect("insert").expect("event");
        changes.next().await.expect("vip update").expect("event");

        let other = room_service::join_room(&state, &code, join_as("Bia"))
            .await
            .expect("join other");
        room_service::update_count(&state, &code, other.id, 4)
            .await
            .expect("count");

        let insert = changes.next().await.expect("insert").expect("event");
        assert!(controller.handle_change(&insert).await.expect("reload"));
        let update = changes.next().await.expect("update").expect("event");
        assert!(controller.handle_change(&update).await.expect("reload"));

        let snapshot = controller.snapshot().expect("snapshot");
        assert_eq!(snapshot.participants[0].id, other.id);
        assert_eq!(snapshot.participants[1].id, me.id);

        room_service::end_race(&state, &code, me.id)
            .await
            .expect("end");
        let ended = changes.next().await.expect("race update").expect("event");
        assert!(controller.handle_change(&ended).await.expect("reload"));
        assert_eq!(
            controller.snapshot().map(|s| s.view),
            Some(RoomView::HallOfFame)
        );

        let err = controller.update_count(me.id, 1).await.expect_err("ended");
        assert!(matches!(err, ClientError::NotAllowed(_)));
    }

    #[tokio::test]
    async fn rejected_count_restores_local_value() {
        let state = state();
        let code = room(&state, false).await;
        let mut controller = RoomController::new(LocalBackend::new(state.clone()), &code);
        let me = controller.join(join_as("Ana")).await.expect("join");
        controller.update_count(me.id, 3).await.expect("increment");

        // The race ends on the server while this client still shows it as active.
        room_service::end_race(&state, &code, me.id)
            .await
            .expect("end");
        let err = controller.update_count(me.id, 2).await.expect_err("ended");
        assert!(matches!(err, ClientError::Rejected { status: 409, .. }));

        let snapshot = controller.snapshot().expect("snapshot");
        assert_eq!(snapshot.participant(me.id).map(|p| p.items_eaten), Some(3));
    }

    #[tokio::test]
    async fn room_code_is_normalized_like_the_server() {
        let state = state();
        let controller = RoomController::new(LocalBackend::new(state), "  ab1cd\t");
        assert_eq!(controller.room_code(), "AB1CD");
    }

    #[tokio::test]
    async fn events_for_other_rooms_are_ignored() {
        let state = state();
        let code = room(&state, false).await;
        let mut controller = RoomController::new(LocalBackend::new(state), &code);
        let event = ChangeEvent::participant(
            crate::dto::feed::ChangeKind::Insert,
            "ZZZZZ",
            Uuid::new_v4(),
        );
        assert!(!controller.handle_change(&event).await.expect("ignored"));
        assert!(controller.snapshot().is_none());
    }

    #[tokio::test]
    async fn team_choice_requires_team_mode() {
        let state = state();
        let code = room(&state, false).await;
        let mut controller = RoomController::new(LocalBackend::new(state), &code);
        controller.join(join_as("Ana")).await.expect("join");
        let err = controller
            .choose_team(TeamName::Azul)
            .await
            .expect_err("solo room");
        assert!(matches!(err, ClientError::NotAllowed(_)));
    }
}
