//! In-process backend calling the room services directly.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::{FutureExt, Stream, StreamExt, future::BoxFuture};
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::TeamName,
    dto::{
        feed::ChangeEvent,
        room::{JoinRoomRequest, ParticipantSummary, RaceSummary, RoomSnapshot},
    },
    error::{AppError, ServiceError},
    services::{feed_service, room_service},
    state::SharedState,
};

use super::{ChangeStream, ClientError, RoomBackend};

/// Room backend sharing the server's state, used by tests and embedded setups.
#[derive(Clone)]
pub struct LocalBackend {
    state: SharedState,
}

impl LocalBackend {
    /// Backend over the given application state.
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl From<ServiceError> for ClientError {
    fn from(err: ServiceError) -> Self {
        let err = AppError::from(err);
        ClientError::Rejected {
            status: err.status_code().as_u16(),
            message: err.to_string(),
        }
    }
}

impl RoomBackend for LocalBackend {
    fn load(&self, room_code: &str) -> BoxFuture<'static, Result<RoomSnapshot, ClientError>> {
        let state = self.state.clone();
        let room_code = room_code.to_owned();
        async move { Ok(room_service::load_room(&state, &room_code).await?) }.boxed()
    }

    fn join(
        &self,
        room_code: &str,
        request: JoinRoomRequest,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>> {
        let state = self.state.clone();
        let room_code = room_code.to_owned();
        async move { Ok(room_service::join_room(&state, &room_code, request).await?) }.boxed()
    }

    fn update_count(
        &self,
        room_code: &str,
        participant_id: Uuid,
        delta: i32,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>> {
        let state = self.state.clone();
        let room_code = room_code.to_owned();
        async move {
            Ok(room_service::update_count(&state, &room_code, participant_id, delta).await?)
        }
        .boxed()
    }

    fn update_avatar(
        &self,
        room_code: &str,
        participant_id: Uuid,
        avatar: String,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>> {
        let state = self.state.clone();
        let room_code = room_code.to_owned();
        async move {
            Ok(room_service::update_avatar(&state, &room_code, participant_id, &avatar).await?)
        }
        .boxed()
    }

    fn choose_team(
        &self,
        room_code: &str,
        participant_id: Uuid,
        team: TeamName,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>> {
        let state = self.state.clone();
        let room_code = room_code.to_owned();
        async move {
            Ok(room_service::choose_team(&state, &room_code, participant_id, team).await?)
        }
        .boxed()
    }

    fn end_race(
        &self,
        room_code: &str,
        participant_id: Uuid,
    ) -> BoxFuture<'static, Result<RaceSummary, ClientError>> {
        let state = self.state.clone();
        let room_code = room_code.to_owned();
        async move { Ok(room_service::end_race(&state, &room_code, participant_id).await?) }
            .boxed()
    }

    fn subscribe(&self, room_code: &str) -> BoxFuture<'static, Result<ChangeStream, ClientError>> {
        let state = self.state.clone();
        let room_code = room_code.to_owned();
        async move {
            let (room_code, receiver) = feed_service::subscribe(&state, &room_code).await?;
            let release_code = room_code.clone();
            let stream = BroadcastStream::new(receiver).filter_map(move |item| {
                let item = match item {
                    Ok(change) => Some(Ok::<_, ClientError>(change)),
                    Err(lagged) => {
                        // A skipped notification is covered by the next reload.
                        debug!(%room_code, error = %lagged, "local feed lagged");
                        None
                    }
                };
                futures::future::ready(item)
            });
            Ok(LocalChanges {
                inner: Some(stream.boxed()),
                state,
                room_code: release_code,
            }
            .boxed())
        }
        .boxed()
    }
}

/// Change stream over the in-process feed; dropping it releases the room hub once
/// no other subscriber remains.
struct LocalChanges {
    inner: Option<ChangeStream>,
    state: SharedState,
    room_code: String,
}

impl Stream for LocalChanges {
    type Item = Result<ChangeEvent, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.get_mut().inner.as_mut() {
            Some(inner) => inner.poll_next_unpin(cx),
            None => Poll::Ready(None),
        }
    }
}

impl Drop for LocalChanges {
    fn drop(&mut self) {
        // The receiver must be gone before the hub can be pruned.
        drop(self.inner.take());
        self.state.feeds().release(&self.room_code);
        debug!(room_code = %self.room_code, "local feed released");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{competition_store::memory::MemoryCompetitionStore, models::FoodType},
        dto::room::CreateRoomRequest,
        state::AppState,
    };

    #[tokio::test]
    async fn dropping_the_stream_releases_the_room_hub() {
        let state = AppState::with_store(AppConfig::default(), Arc::new(MemoryCompetitionStore::new()));
        let code = room_service::create_room(
            &state,
            CreateRoomRequest {
                name: "Burger Bash".into(),
                food_type: FoodType::Burger,
                is_team_mode: false,
            },
        )
        .await
        .expect("create room")
        .room_code;
        let backend = LocalBackend::new(state.clone());

        let first = backend.subscribe(&code).await.expect("first subscriber");
        let second = backend.subscribe(&code).await.expect("second subscriber");
        assert_eq!(state.feeds().watched_rooms(), 1);

        drop(first);
        assert_eq!(state.feeds().watched_rooms(), 1);
        drop(second);
        assert_eq!(state.feeds().watched_rooms(), 0);
    }
}
