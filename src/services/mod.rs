/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Room commands: create, join, start, submit, leave and read-side queries.
pub mod room_service;
/// Server-Sent Events delivery of room updates.
pub mod sse_service;
/// Ordered per-room update streams with resync after lag.
pub mod subscription_service;
