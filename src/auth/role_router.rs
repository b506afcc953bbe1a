use crate::models::{Destination, Role};

/// Map a resolved role to the dashboard it lands on. `None` means the role
/// grants no destination.
pub fn route_role(role: Role) -> Option<Destination> {
    match role {
        Role::Admin   => Some(Destination::AdminDashboard),
        Role::Client  => Some(Destination::ClientDashboard),
        Role::Unknown => None,
    }
}
