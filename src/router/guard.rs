use super::{Access, Route};
use crate::store::Session;

/// What a navigation target should render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still being checked; show a placeholder
    Loading,
    Render(Route),
    Redirect(Route),
}

/// Decide what `route` renders for `session`.
///
/// Pure function of the session snapshot. Redirects only ever target
/// [`Route::Login`] (guest only) or [`Route::DEFAULT`] (plain
/// authentication), so following a redirect cannot loop.
pub fn guard(session: &Session, route: &Route) -> GuardDecision {
    if session.is_checking() {
        return GuardDecision::Loading;
    }

    let user = session.user();
    match (route.access(), user) {
        (Access::Public, _) => GuardDecision::Render(route.clone()),
        (Access::GuestOnly, None) => GuardDecision::Render(route.clone()),
        (Access::GuestOnly, Some(_)) => GuardDecision::Redirect(Route::DEFAULT),
        (Access::Authenticated | Access::Role(_), None) => GuardDecision::Redirect(Route::Login),
        (Access::Authenticated, Some(_)) => GuardDecision::Render(route.clone()),
        (Access::Role(role), Some(user)) if user.has_role(role) => {
            GuardDecision::Render(route.clone())
        }
        (Access::Role(_), Some(_)) => GuardDecision::Redirect(Route::DEFAULT),
    }
}
