/// Admin session tokens and moderation operations.
pub(crate) mod admin_service;
/// Static avatar, food and team choices.
pub(crate) mod catalog_service;
/// Room and promo code generation, hashing and comparison helpers.
pub(crate) mod codes;
/// OpenAPI documentation generation.
pub mod documentation;
/// Room change feeds exposed over Server-Sent Events.
pub(crate) mod feed_service;
/// Health check service.
pub(crate) mod health_service;
/// Login registration, authentication and history.
pub(crate) mod login_service;
/// Exclusive avatar codes and claims.
pub(crate) mod promo_service;
/// Room lifecycle: creation, joining, counting, ending.
pub(crate) mod room_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
