use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Roles ────────────────────────────────────────────────────

/// Role attribute of a profile. Decoded once from the raw `profiles.role`
/// column; nothing past the directory boundary compares role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Admin,
    Client,
    /// Null, empty or unrecognized role value.
    Unknown,
}

impl Role {
    /// Exact, case-sensitive match against the stored values.
    pub fn from_column(raw: Option<&str>) -> Self {
        match raw {
            Some("Admin")  => Role::Admin,
            Some("Client") => Role::Client,
            _              => Role::Unknown,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self { Role::Admin => "Admin", Role::Client => "Client", Role::Unknown => "unknown" };
        write!(f, "{s}")
    }
}

// ── Profiles ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id:    String,
    pub role:  Role,
    #[allow(dead_code)]
    pub email: Option<String>,
}

// ── Sessions ─────────────────────────────────────────────────

/// An authenticated session as issued by the identity backend.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub user_id:       String,
    pub email:         Option<String>,
    pub access_token:  String,
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at:    Option<i64>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

// ── Routing ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    AdminDashboard,
    ClientDashboard,
}

impl Destination {
    pub fn path(self) -> &'static str {
        match self {
            Destination::AdminDashboard  => "/admin/dashboard",
            Destination::ClientDashboard => "/client/dashboard",
        }
    }
}

// ── Projects ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id:              Uuid,
    pub user_id:         String,
    pub client_name:     Option<String>,
    pub client_email:    String,
    #[serde(default)]
    pub business:        Option<String>,
    #[serde(default)]
    pub industry:        Option<String>,
    #[serde(default)]
    pub goals:           Option<String>,
    #[serde(default)]
    pub painpoints:      Option<String>,
    #[serde(default)]
    pub pages:           Option<String>,
    #[serde(default)]
    pub content:         Option<String>,
    #[serde(default)]
    pub features:        Option<String>,
    #[serde(default)]
    pub admin_panel:     bool,
    #[serde(default)]
    pub design_prefs:    Option<String>,
    #[serde(default)]
    pub examples:        Option<String>,
    #[serde(default)]
    pub mood:            Option<String>,
    #[serde(default)]
    pub admin_notes:     Option<String>,
    #[serde(default)]
    pub progress_update: Option<String>,
    #[serde(default)]
    pub created_at:      Option<String>,
}

/// Row inserted by an admin; `user_id` comes from the client's profile.
#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub user_id:      String,
    pub client_name:  String,
    pub client_email: String,
    pub business:     String,
    pub industry:     String,
    pub goals:        String,
    pub painpoints:   String,
    pub pages:        String,
    pub content:      String,
    pub features:     String,
    pub admin_panel:  bool,
    pub design_prefs: String,
    pub examples:     String,
    pub mood:         String,
}

/// Admin-editable fields. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes:     Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_update: Option<String>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.admin_notes.is_none() && self.progress_update.is_none()
    }
}
