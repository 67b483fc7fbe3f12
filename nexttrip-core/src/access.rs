use crate::identity::Role;

/// Every screen the storefront routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Signup,
    SuperAdminLogin,
    FlightSearch,
    BookingWizard,
    FlightsDashboard,
    AdminDashboard,
    AdminBookings,
    SuperAdminDashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Allow,
    Redirect(&'static str),
}

const SIGNED_IN: &[Role] = &[Role::User, Role::Admin, Role::SuperAdmin];
const STAFF: &[Role] = &[Role::Admin, Role::SuperAdmin];

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::SuperAdminLogin => "/superadmin-login",
            Route::FlightSearch => "/flights",
            Route::BookingWizard => "/booking",
            Route::FlightsDashboard => "/flights-dashboard",
            Route::AdminDashboard => "/admin-dashboard",
            Route::AdminBookings => "/admin/bookings",
            Route::SuperAdminDashboard => "/superadmin-dashboard",
        }
    }

    /// `None` means public.
    pub fn required_roles(&self) -> Option<&'static [Role]> {
        match self {
            Route::Home | Route::Login | Route::Signup | Route::SuperAdminLogin | Route::FlightSearch => None,
            Route::BookingWizard => Some(SIGNED_IN),
            Route::FlightsDashboard => Some(&[Role::User]),
            Route::AdminDashboard => Some(&[Role::Admin]),
            Route::AdminBookings => Some(STAFF),
            Route::SuperAdminDashboard => Some(&[Role::SuperAdmin]),
        }
    }

    fn is_staff_area(&self) -> bool {
        self.required_roles()
            .map(|roles| !roles.contains(&Role::User))
            .unwrap_or(false)
    }
}

/// Whether `role` may open `route`.
pub fn allowed(route: Route, role: Role) -> bool {
    match route.required_roles() {
        None => true,
        Some(roles) => roles.contains(&role),
    }
}

/// Router-boundary decision. Anonymous visitors are sent to the login page for
/// the area they tried to reach; signed-in users with the wrong role go home.
pub fn gate(route: Route, role: Option<Role>) -> Gate {
    if route.required_roles().is_none() {
        return Gate::Allow;
    }
    match role {
        None if route.is_staff_area() => Gate::Redirect(Route::SuperAdminLogin.path()),
        None => Gate::Redirect(Route::Login.path()),
        Some(role) if allowed(route, role) => Gate::Allow,
        Some(_) => Gate::Redirect(Route::Home.path()),
    }
}
