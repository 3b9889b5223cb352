//! Room backend talking to a running server over its REST routes and SSE feed.

use std::sync::Arc;

use futures::{FutureExt, StreamExt, future::BoxFuture};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::TeamName,
    dto::{
        feed::{CHANGE_EVENT_NAME, ChangeEvent},
        room::{
            AvatarRequest, EndRaceRequest, JoinRoomRequest, ParticipantSummary, RaceSummary,
            RoomSnapshot, TeamRequest, UpdateCountRequest,
        },
    },
};

use super::{ChangeStream, ClientError, RoomBackend};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP implementation of [`RoomBackend`].
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Arc<str>,
}

impl HttpBackend {
    /// Backend with a default reqwest client.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .build()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Backend reusing an existing client; a trailing slash on `base_url` is dropped.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn call<B, T>(
        &self,
        method: Method,
        path: String,
        body: Option<B>,
    ) -> BoxFuture<'static, Result<T, ClientError>>
    where
        B: Serialize + Send + 'static,
        T: DeserializeOwned + Send + 'static,
    {
        let mut builder = self.client.request(method, self.url(&path));
        if let Some(body) = &body {
            builder = builder.json(body);
        }
        async move {
            let response = builder
                .send()
                .await
                .map_err(|err| ClientError::Transport(err.to_string()))?;
            decode(response).await
        }
        .boxed()
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Decode(err.to_string()));
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("request failed").to_owned(),
    };
    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Incremental parser for `text/event-stream` bodies yielding `change` payloads.
#[derive(Default)]
struct SseParser {
    buffer: String,
}

impl SseParser {
    /// Feed a chunk and return the data of every complete `change` event.
    fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(&chunk.replace("\r\n", "\n"));
        let mut payloads = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..end + 2).collect();
            let mut event = None;
            let mut data = Vec::new();
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    event = Some(value.trim().to_owned());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push(value.strip_prefix(' ').unwrap_or(value).to_owned());
                }
            }
            if event.as_deref() == Some(CHANGE_EVENT_NAME) && !data.is_empty() {
                payloads.push(data.join("\n"));
            }
        }
        payloads
    }
}

impl RoomBackend for HttpBackend {
    fn load(&self, room_code: &str) -> BoxFuture<'static, Result<RoomSnapshot, ClientError>> {
        self.call::<(), _>(Method::GET, format!("/rooms/{room_code}"), None)
    }

    fn join(
        &self,
        room_code: &str,
        request: JoinRoomRequest,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>> {
        self.call(
            Method::POST,
            format!("/rooms/{room_code}/participants"),
            Some(request),
        )
    }

    fn update_count(
        &self,
        room_code: &str,
        participant_id: Uuid,
        delta: i32,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>> {
        self.call(
            Method::POST,
            format!("/rooms/{room_code}/participants/{participant_id}/count"),
            Some(UpdateCountRequest { delta }),
        )
    }

    fn update_avatar(
        &self,
        room_code: &str,
        participant_id: Uuid,
        avatar: String,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>> {
        self.call(
            Method::PUT,
            format!("/rooms/{room_code}/participants/{participant_id}/avatar"),
            Some(AvatarRequest { avatar }),
        )
    }

    fn choose_team(
        &self,
        room_code: &str,
        participant_id: Uuid,
        team: TeamName,
    ) -> BoxFuture<'static, Result<ParticipantSummary, ClientError>> {
        self.call(
            Method::PUT,
            format!("/rooms/{room_code}/participants/{participant_id}/team"),
            Some(TeamRequest { team }),
        )
    }

    fn end_race(
        &self,
        room_code: &str,
        participant_id: Uuid,
    ) -> BoxFuture<'static, Result<RaceSummary, ClientError>> {
        self.call(
            Method::POST,
            format!("/rooms/{room_code}/end"),
            Some(EndRaceRequest { participant_id }),
        )
    }

    fn subscribe(&self, room_code: &str) -> BoxFuture<'static, Result<ChangeStream, ClientError>> {
        let request = self
            .client
            .get(self.url(&format!("/rooms/{room_code}/events")))
            .header(reqwest::header::ACCEPT, "text/event-stream");
        let room_code = room_code.to_owned();
        async move {
            let response = request
                .send()
                .await
                .map_err(|err| ClientError::Transport(err.to_string()))?;
            if !response.status().is_success() {
                return Err(decode::<()>(response).await.err().unwrap_or_else(|| {
                    ClientError::Transport("unexpected feed response".into())
                }));
            }

            let mut body = Box::pin(response.bytes_stream());
            let stream = async_stream::try_stream! {
                let mut parser = SseParser::default();
                while let Some(chunk) = body.next().await {
                    let chunk = chunk.map_err(|err| ClientError::Transport(err.to_string()))?;
                    let text = String::from_utf8_lossy(&chunk);
                    for payload in parser.push(&text) {
                        let change: ChangeEvent = serde_json::from_str(&payload)
                            .map_err(|err| ClientError::Decode(err.to_string()))?;
                        yield change;
                    }
                }
                debug!(%room_code, "room feed closed by server");
            };
            Ok(stream.boxed())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_yields_change_events_across_chunks() {
        let mut parser = SseParser::default();
        assert!(parser.push("event: change\ndata: {\"a\"").is_empty());
        let payloads = parser.push(":1}\n\n: keep-alive\n\nevent: change\r\ndata: {}\r\n\r\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_owned(), "{}".to_owned()]);
    }

    #[test]
    fn parser_ignores_other_events() {
        let mut parser = SseParser::default();
        assert!(parser.push("event: other\ndata: x\n\ndata: y\n\n").is_empty());
    }
}
