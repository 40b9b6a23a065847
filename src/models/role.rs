use serde::{Deserialize, Serialize};

/// Dashboard roles as issued by the levy backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    LgaAdmin,
    Agent,
    FieldOfficer,
    #[serde(other)]
    Unknown,
}

/// What a role may do in the console. Every permission check goes through
/// [`capabilities_for`]; handlers never compare role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    pub can_scan: bool,
    pub can_attach_sticker: bool,
    pub can_restore_sticker: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_view_history: bool,
    pub can_clear_history: bool,
    pub can_manage_users: bool,
    pub can_view_settlements: bool,
}

pub fn capabilities_for(role: Role) -> Capabilities {
    match role {
        Role::SuperAdmin => Capabilities {
            can_scan: true,
            can_attach_sticker: true,
            can_restore_sticker: true,
            can_edit: true,
            can_delete: true,
            can_view_history: true,
            can_clear_history: true,
            can_manage_users: true,
            can_view_settlements: true,
        },
        Role::Admin => Capabilities {
            can_scan: true,
            can_attach_sticker: true,
            can_restore_sticker: true,
            can_edit: true,
            can_delete: true,
            can_view_history: true,
            can_clear_history: true,
            can_manage_users: true,
            can_view_settlements: false,
        },
        Role::LgaAdmin => Capabilities {
            can_scan: true,
            can_attach_sticker: true,
            can_edit: true,
            can_view_history: true,
            can_clear_history: true,
            can_view_settlements: true,
            ..Capabilities::default()
        },
        Role::Agent => Capabilities {
            can_scan: true,
            can_attach_sticker: true,
            can_view_history: true,
            can_clear_history: true,
            ..Capabilities::default()
        },
        Role::FieldOfficer => Capabilities {
            can_scan: true,
            can_view_history: true,
            ..Capabilities::default()
        },
        Role::Unknown => Capabilities::default(),
    }
}
