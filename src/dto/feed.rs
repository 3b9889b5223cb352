use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// SSE event name used for row change notifications.
pub const CHANGE_EVENT_NAME: &str = "change";

/// Collection a change notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    /// A race row.
    Races,
    /// A participant row.
    Participants,
}

/// What happened to the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Row created.
    Insert,
    /// Row modified.
    Update,
    /// Row removed.
    Delete,
}

/// Row change forwarded to every subscriber of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChangeEvent {
    /// Collection of the changed row.
    pub table: ChangeTable,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Room the changed row belongs to.
    pub room_code: String,
    /// Identifier of the changed row.
    pub row_id: Uuid,
}

impl ChangeEvent {
    /// Change to a participant row.
    pub fn participant(kind: ChangeKind, room_code: &str, participant_id: Uuid) -> Self {
        Self {
            table: ChangeTable::Participants,
            kind,
            room_code: room_code.to_owned(),
            row_id: participant_id,
        }
    }

    /// Change to a race row.
    pub fn race(kind: ChangeKind, room_code: &str, race_id: Uuid) -> Self {
        Self {
            table: ChangeTable::Races,
            kind,
            room_code: room_code.to_owned(),
            row_id: race_id,
        }
    }

    /// Whether a room view must reload its state after this change.
    ///
    /// Any participant change and race updates qualify; race inserts cannot concern a
    /// room that is already open.
    pub fn requires_reload(&self) -> bool {
        match self.table {
            ChangeTable::Participants => true,
            ChangeTable::Races => self.kind == ChangeKind::Update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_rules() {
        let id = Uuid::new_v4();
        assert!(ChangeEvent::participant(ChangeKind::Insert, "ABCDE", id).requires_reload());
        assert!(ChangeEvent::participant(ChangeKind::Update, "ABCDE", id).requires_reload());
        assert!(ChangeEvent::race(ChangeKind::Update, "ABCDE", id).requires_reload());
        assert!(!ChangeEvent::race(ChangeKind::Insert, "ABCDE", id).requires_reload());
    }

    #[test]
    fn wire_format_is_snake_case() {
        let id = Uuid::nil();
        let json = serde_json::to_value(ChangeEvent::race(ChangeKind::Update, "ABCDE", id))
            .expect("serialize change");
        assert_eq!(json["table"], "races");
        assert_eq!(json["kind"], "update");
        assert_eq!(json["room_code"], "ABCDE");
    }
}
