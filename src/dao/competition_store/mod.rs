pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    AvatarCodeEntity, AvatarGrantEntity, AvatarPermissionEntity, LoginEntity, ParticipantEntity,
    RaceEntity, TeamName,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for races, participants, logins and avatar codes.
///
/// Operations that must not interleave with concurrent writers (counter updates, VIP
/// election, code redemption, ending a race) are single atomic operations of the backend.
pub trait CompetitionStore: Send + Sync {
    /// Insert a race; fails with [`StorageError::Duplicate`](crate::dao::storage::StorageError)
    /// when the room code is already taken.
    fn insert_race(&self, race: RaceEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Race hosted under a normalized room code.
    fn find_race_by_code(
        &self,
        room_code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RaceEntity>>>;
    /// Race by identifier.
    fn find_race(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RaceEntity>>>;
    /// Every race, newest first.
    fn list_races(&self) -> BoxFuture<'static, StorageResult<Vec<RaceEntity>>>;
    /// Mark an active race as ended. Returns `None` when the race is unknown or already ended.
    fn end_race(
        &self,
        id: Uuid,
        ended_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<RaceEntity>>>;

    /// Insert a participant, electing it VIP when it is the first of its race.
    fn insert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<ParticipantEntity>>;
    /// Participant by identifier.
    fn find_participant(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Participants of a race ordered by items eaten (descending), then join order.
    fn list_participants(
        &self,
        race_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Participants linked to a login, newest first.
    fn list_participants_by_login(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Add `delta` to the counter, clamping at zero, in one atomic step.
    ///
    /// Returns `None` when the participant is unknown or its race has ended.
    fn adjust_items_eaten(
        &self,
        id: Uuid,
        delta: i32,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Replace the avatar; `None` clears it.
    fn set_avatar(
        &self,
        id: Uuid,
        avatar: Option<String>,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Replace the team; `None` clears it.
    fn set_team(
        &self,
        id: Uuid,
        team: Option<TeamName>,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Remove a participant. Returns whether a row was deleted.
    fn delete_participant(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert a login; fails with a duplicate error when the code is taken.
    fn insert_login(&self, login: LoginEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Login by normalized code.
    fn find_login(&self, code: String) -> BoxFuture<'static, StorageResult<Option<LoginEntity>>>;

    /// Allow a login to mint codes for an avatar; repeating it is a no-op.
    fn upsert_permission(
        &self,
        permission: AvatarPermissionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Withdraw a permission. Returns whether one existed.
    fn delete_permission(
        &self,
        login_code: String,
        avatar: String,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Permissions held by a login.
    fn list_permissions(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AvatarPermissionEntity>>>;

    /// Insert a code; fails with a duplicate error when the hash is taken.
    fn insert_code(&self, code: AvatarCodeEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Code by identifier.
    fn find_code(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AvatarCodeEntity>>>;
    /// Codes minted by a login, newest first.
    fn list_codes_by_creator(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AvatarCodeEntity>>>;
    /// Set `disabled_at` and `expires_at` to `now`.
    fn disable_code(
        &self,
        id: Uuid,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<AvatarCodeEntity>>>;
    /// Validate and consume one use of the code with this hash, atomically.
    ///
    /// Returns the updated code on success and `None` when no redeemable code matches.
    fn redeem_code(
        &self,
        code_hash: String,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Option<AvatarCodeEntity>>>;

    /// Give back one use taken by [`redeem_code`](Self::redeem_code), never going below zero.
    fn release_code_use(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>>;

    /// Record that a login unlocked an avatar. Granting twice keeps the first grant.
    fn upsert_grant(&self, grant: AvatarGrantEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Avatars unlocked by a login, oldest first.
    fn list_grants(
        &self,
        login_code: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AvatarGrantEntity>>>;

    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the connection in place after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Clamp `current + delta` into the counter's domain.
pub fn clamp_items(current: u32, delta: i32) -> u32 {
    let next = i64::from(current) + i64::from(delta);
    next.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::clamp_items;

    #[test]
    fn clamp_never_goes_below_zero() {
        assert_eq!(clamp_items(0, -1), 0);
        assert_eq!(clamp_items(2, -5), 0);
        assert_eq!(clamp_items(2, 3), 5);
        assert_eq!(clamp_items(u32::MAX, 1), u32::MAX);
    }

    #[test]
    fn any_sequence_stays_non_negative() {
        let deltas = [3, -1, -4, 2, -2, -10, 7, -7, 1, -1, -1];
        let mut value = 0;
        for delta in deltas {
            value = clamp_items(value, delta);
        }
        assert_eq!(value, 0);

        let mut value = 0;
        for delta in [1, 1, 1, -1, 1] {
            value = clamp_items(value, delta);
        }
        assert_eq!(value, 3);
    }
}
