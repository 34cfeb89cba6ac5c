use entiva_core::{ActorIdentity, AppError, AppResult};

/// Rejects callers without the administrator claim.
///
/// The upstream gateway authenticates every call; mutating lifecycle
/// operations additionally require the administrator claim it forwards.
pub(crate) fn ensure_administrator(actor: &ActorIdentity) -> AppResult<()> {
    if actor.is_administrator() {
        return Ok(());
    }

    Err(AppError::Unauthorized(format!(
        "subject '{}' lacks the administrator claim",
        actor.subject()
    )))
}
