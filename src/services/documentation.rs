use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the eat race backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::catalog::catalog,
        crate::routes::room::create_room,
        crate::routes::room::load_room,
        crate::routes::room::join_room,
        crate::routes::room::update_count,
        crate::routes::room::update_avatar,
        crate::routes::room::choose_team,
        crate::routes::room::end_race,
        crate::routes::feed::room_events,
        crate::routes::login::register,
        crate::routes::login::authenticate,
        crate::routes::login::history,
        crate::routes::promo::create_code,
        crate::routes::promo::list_codes,
        crate::routes::promo::reveal_code,
        crate::routes::promo::disable_code,
        crate::routes::promo::list_permissions,
        crate::routes::promo::claim,
        crate::routes::promo::list_grants,
        crate::routes::admin::login,
        crate::routes::admin::logout,
        crate::routes::admin::session,
        crate::routes::admin::list_races,
        crate::routes::admin::end_race,
        crate::routes::admin::remove_participant,
        crate::routes::admin::grant_permission,
        crate::routes::admin::revoke_permission,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::catalog::CatalogResponse,
            crate::dto::feed::ChangeEvent,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::RoomSnapshot,
            crate::dto::promo::PromoStatus,
            crate::dto::promo::CodeSummary,
            crate::dto::login::HistoryEntry,
            crate::dto::admin::AdminRaceItem,
            crate::dao::models::CodeStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Races, participants and room change feeds"),
        (name = "logins", description = "Username and password identities"),
        (name = "promo", description = "Exclusive avatar codes and claims"),
        (name = "admin", description = "Admin session and moderation console"),
    )
)]
/// OpenAPI document of every route.
pub struct ApiDoc;
