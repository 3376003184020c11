use std::collections::HashSet;
use uuid::Uuid;

/// The authenticated actor evaluated by the guard. Resolved by an external
/// authentication collaborator; the core never verifies credentials.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub roles: HashSet<String>,
    pub superuser: bool,
}

impl Principal {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            roles: HashSet::new(),
            superuser: false,
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = String>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn with_superuser(mut self, superuser: bool) -> Self {
        self.superuser = superuser;
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
