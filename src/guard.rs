//! Route table and access checks.
//!
//! `check` is a pure function of the session state and a route's
//! requirement; front ends call it before rendering any protected view.

use crate::models::Role;
use crate::session::{Session, SessionState};

/// Access a protected route needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub role: Role,
    pub full_registration: bool,
}

impl Requirement {
    pub const fn student() -> Self {
        Self {
            role: Role::Student,
            full_registration: false,
        }
    }

    pub const fn registered_student() -> Self {
        Self {
            role: Role::Student,
            full_registration: true,
        }
    }

    pub const fn faculty() -> Self {
        Self {
            role: Role::Faculty,
            full_registration: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardTab {
    Home,
    Classes,
    Subjects,
    Feedbacks,
    Students,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    StudentRegister,
    StudentLogin,
    SelectFacultyClass,
    StudentMain,
    FacultyRegister,
    FacultyLogin,
    FacultyProfileSetup,
    FacultyDashboard(DashboardTab),
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::StudentRegister => "/register",
            Route::StudentLogin => "/login",
            Route::SelectFacultyClass => "/select-faculty-class",
            Route::StudentMain => "/main",
            Route::FacultyRegister => "/faculty/register",
            Route::FacultyLogin => "/faculty/login",
            Route::FacultyProfileSetup => "/faculty/profile-setup",
            Route::FacultyDashboard(DashboardTab::Home) => "/faculty/dashboard",
            Route::FacultyDashboard(DashboardTab::Classes) => "/faculty/dashboard/classes",
            Route::FacultyDashboard(DashboardTab::Subjects) => "/faculty/dashboard/subjects",
            Route::FacultyDashboard(DashboardTab::Feedbacks) => "/faculty/dashboard/feedbacks",
            Route::FacultyDashboard(DashboardTab::Students) => "/faculty/dashboard/students",
        }
    }

    /// Resolve a path; anything unknown falls back to home.
    pub fn parse(path: &str) -> Route {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
        Self::all()
            .iter()
            .copied()
            .find(|route| route.path() == trimmed)
            .unwrap_or(Route::Home)
    }

    pub fn all() -> &'static [Route] {
        &[
            Route::Home,
            Route::StudentRegister,
            Route::StudentLogin,
            Route::SelectFacultyClass,
            Route::StudentMain,
            Route::FacultyRegister,
            Route::FacultyLogin,
            Route::FacultyProfileSetup,
            Route::FacultyDashboard(DashboardTab::Home),
            Route::FacultyDashboard(DashboardTab::Classes),
            Route::FacultyDashboard(DashboardTab::Subjects),
            Route::FacultyDashboard(DashboardTab::Feedbacks),
            Route::FacultyDashboard(DashboardTab::Students),
        ]
    }

    /// None for public routes
    pub fn requirement(&self) -> Option<Requirement> {
        match self {
            Route::Home
            | Route::StudentRegister
            | Route::StudentLogin
            | Route::FacultyRegister
            | Route::FacultyLogin => None,
            Route::SelectFacultyClass => Some(Requirement::student()),
            Route::StudentMain => Some(Requirement::registered_student()),
            Route::FacultyProfileSetup | Route::FacultyDashboard(_) => {
                Some(Requirement::faculty())
            }
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not restored yet; show a neutral waiting state
    Wait,
    Allow,
    Redirect(Route),
}

pub fn check(state: &SessionState, requirement: Requirement) -> GuardDecision {
    if state.is_pending() {
        return GuardDecision::Wait;
    }

    match requirement.role {
        Role::Student => {
            if state.student().is_none() {
                return GuardDecision::Redirect(Route::StudentLogin);
            }
            if requirement.full_registration && !state.is_fully_registered() {
                return GuardDecision::Redirect(Route::SelectFacultyClass);
            }
        }
        Role::Faculty => {
            if state.faculty().is_none() {
                return GuardDecision::Redirect(Route::FacultyLogin);
            }
        }
    }

    GuardDecision::Allow
}

/// Guard decision for navigating to `route`
pub fn navigate(state: &SessionState, route: Route) -> GuardDecision {
    match route.requirement() {
        Some(requirement) => check(state, requirement),
        None => GuardDecision::Allow,
    }
}

/// Where a freshly authenticated session should land
pub fn landing_route(session: &Session) -> Route {
    use crate::session::Identity;

    match (&session.identity, session.fully_registered) {
        (Identity::Student(_), true) => Route::StudentMain,
        (Identity::Student(_), false) => Route::SelectFacultyClass,
        (Identity::Faculty(_), true) => Route::FacultyDashboard(DashboardTab::Home),
        (Identity::Faculty(_), false) => Route::FacultyProfileSetup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Identity;
    use crate::testing::{faculty, student};

    fn active(identity: Identity, fully_registered: bool) -> SessionState {
        SessionState::Active(Session {
            identity,
            fully_registered,
            token: Some("t".to_string()),
        })
    }

    fn all_states() -> Vec<SessionState> {
        vec![
            SessionState::Loading,
            SessionState::Authenticating,
            SessionState::Anonymous,
            active(Identity::Student(student(1)), false),
            active(Identity::Student(student(1)), true),
            active(Identity::Faculty(faculty(2)), false),
            active(Identity::Faculty(faculty(2)), true),
        ]
    }

    fn all_requirements() -> Vec<Requirement> {
        vec![
            Requirement::student(),
            Requirement::registered_student(),
            Requirement::faculty(),
            Requirement {
                role: Role::Faculty,
                full_registration: true,
            },
        ]
    }

    #[test]
    fn test_guard_is_total() {
        let allowed = [
            GuardDecision::Wait,
            GuardDecision::Allow,
            GuardDecision::Redirect(Route::StudentLogin),
            GuardDecision::Redirect(Route::SelectFacultyClass),
            GuardDecision::Redirect(Route::FacultyLogin),
        ];
        for state in all_states() {
            for requirement in all_requirements() {
                let decision = check(&state, requirement);
                assert!(
                    allowed.contains(&decision),
                    "{:?} / {:?} gave {:?}",
                    state,
                    requirement,
                    decision
                );
            }
        }
    }

    #[test]
    fn test_loading_never_redirects() {
        for requirement in all_requirements() {
            assert_eq!(check(&SessionState::Loading, requirement), GuardDecision::Wait);
        }
    }

    #[test]
    fn test_student_rules() {
        assert_eq!(
            check(&SessionState::Anonymous, Requirement::student()),
            GuardDecision::Redirect(Route::StudentLogin)
        );
        assert_eq!(
            check(&active(Identity::Faculty(faculty(2)), true), Requirement::student()),
            GuardDecision::Redirect(Route::StudentLogin)
        );

        let unregistered = active(Identity::Student(student(1)), false);
        assert_eq!(check(&unregistered, Requirement::student()), GuardDecision::Allow);
        assert_eq!(
            check(&unregistered, Requirement::registered_student()),
            GuardDecision::Redirect(Route::SelectFacultyClass)
        );

        let registered = active(Identity::Student(student(1)), true);
        assert_eq!(
            check(&registered, Requirement::registered_student()),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_faculty_rules() {
        assert_eq!(
            check(&active(Identity::Student(student(1)), true), Requirement::faculty()),
            GuardDecision::Redirect(Route::FacultyLogin)
        );
        // registration level is not enforced for faculty routes
        assert_eq!(
            check(&active(Identity::Faculty(faculty(2)), false), Requirement::faculty()),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_route_paths_round_trip() {
        for route in Route::all() {
            assert_eq!(Route::parse(route.path()), *route);
        }
        assert_eq!(Route::parse("/faculty/dashboard/"), Route::FacultyDashboard(DashboardTab::Home));
        assert_eq!(Route::parse("/nowhere"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
    }

    #[test]
    fn test_public_routes_always_allowed() {
        for state in all_states() {
            assert_eq!(navigate(&state, Route::StudentLogin), GuardDecision::Allow);
            assert_eq!(navigate(&state, Route::Home), GuardDecision::Allow);
        }
        assert_eq!(
            navigate(&SessionState::Anonymous, Route::StudentMain),
            GuardDecision::Redirect(Route::StudentLogin)
        );
    }

    #[test]
    fn test_landing_routes() {
        let session = |identity, fully_registered| Session {
            identity,
            fully_registered,
            token: None,
        };
        assert_eq!(
            landing_route(&session(Identity::Student(student(1)), false)),
            Route::SelectFacultyClass
        );
        assert_eq!(
            landing_route(&session(Identity::Student(student(1)), true)),
            Route::StudentMain
        );
        assert_eq!(
            landing_route(&session(Identity::Faculty(faculty(1)), false)),
            Route::FacultyProfileSetup
        );
        assert_eq!(
            landing_route(&session(Identity::Faculty(faculty(1)), true)),
            Route::FacultyDashboard(DashboardTab::Home)
        );
    }
}
