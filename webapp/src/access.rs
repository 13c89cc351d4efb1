use std::collections::HashSet;

use crate::error::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Staff,
    Admin,
}

/// The acting user. How the user proved who they are (tokens, login pages)
/// is outside this crate; it only decides what an identified user may do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self { username: username.into(), role }
    }

    /// Grants `Role::Admin` to users listed in `admins`, `Role::Staff` to
    /// everyone else. Names compare trimmed and case-insensitively.
    pub fn from_admin_list<'a>(username: &str, admins: impl IntoIterator<Item = &'a str>) -> Self {
        let admins: HashSet<String> = admins
            .into_iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        let username = username.trim();
        let role = if !username.is_empty() && admins.contains(&username.to_lowercase()) {
            Role::Admin
        } else {
            Role::Staff
        };
        Self::new(username, role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Errors with `Unauthorized` unless the session is an admin.
    pub fn require_admin(&self, action: &'static str) -> Result<(), Error> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::Unauthorized { user: self.username.clone(), action })
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_list_grants_admin() {
        let s = Session::from_admin_list(" Ayse ", ["ayse", "mehmet"]);
        assert_eq!(s.username, "Ayse");
        assert!(s.is_admin());
        assert!(s.require_admin("create blocks").is_ok());
    }

    #[test]
    fn others_are_staff() {
        let s = Session::from_admin_list("guest", ["ayse", ""]);
        assert_eq!(s.role, Role::Staff);
        let err = s.require_admin("delete blocks").unwrap_err();
        assert!(err.to_string().contains("delete blocks"), "got: {err}");
    }

    #[test]
    fn blank_user_is_never_admin() {
        assert!(!Session::from_admin_list("  ", [" "]).is_admin());
    }
}
