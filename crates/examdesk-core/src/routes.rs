//! Auth gate over the application's views.

use std::fmt;

use crate::model::Id;
use crate::session::Session;

/// A view the user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Dashboard,
    Admin,
    QuestionManager(Id),
    GradeExam,
    ExamReview(Id),
}

impl Route {
    /// Everything except the login screen and the root redirect.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::Root)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Root => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Dashboard => write!(f, "/dashboard"),
            Route::Admin => write!(f, "/admin"),
            Route::QuestionManager(id) => write!(f, "/admin/exams/{id}/questions"),
            Route::GradeExam => write!(f, "/grade-exam"),
            Route::ExamReview(id) => write!(f, "/exam-review/{id}"),
        }
    }
}

/// Outcome of asking for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    Redirect(Route),
}

/// Decide whether `requested` can be shown for the current session.
pub fn resolve(requested: Route, session: &Session) -> RouteDecision {
    let authenticated = session.is_authenticated();
    match requested {
        Route::Root => RouteDecision::Redirect(Route::Login),
        Route::Login if authenticated => RouteDecision::Redirect(Route::Dashboard),
        Route::Login => RouteDecision::Render(Route::Login),
        protected if !authenticated => {
            tracing::debug!(route = %protected, "unauthenticated, redirecting to login");
            RouteDecision::Redirect(Route::Login)
        }
        other => RouteDecision::Render(other),
    }
}

/// Follow redirects until a route renders.
pub fn settle(requested: Route, session: &Session) -> Route {
    let mut route = requested;
    // Longest chain is Root -> Login -> Dashboard.
    for _ in 0..3 {
        match resolve(route, session) {
            RouteDecision::Render(r) => return r,
            RouteDecision::Redirect(r) => route = r,
        }
    }
    route
}

/// Clear local session state. The caller navigates to the returned route.
pub fn logout(session: &Session) -> Route {
    session.clear();
    Route::Login
}
