use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "module_leader")]
    ModuleLeader,
    #[serde(rename = "teacher")]
    Teacher,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::ModuleLeader => write!(f, "module_leader"),
            Role::Teacher => write!(f, "teacher"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    ManageCourses,
    ReviewAccessRequests,
    RequestCourseAccess,
    ViewCourses,
    UploadDocuments,
    ShareDocuments,
    DistributeDocuments,
    ViewDocuments,
    EnterMarks,
    ViewMarks,
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ManageUsers,
    Permission::ManageCourses,
    Permission::ReviewAccessRequests,
    Permission::ViewCourses,
    Permission::UploadDocuments,
    Permission::ShareDocuments,
    Permission::DistributeDocuments,
    Permission::ViewDocuments,
    Permission::ViewMarks,
];

const MODULE_LEADER_PERMISSIONS: &[Permission] = &[
    Permission::ReviewAccessRequests,
    Permission::RequestCourseAccess,
    Permission::ViewCourses,
    Permission::UploadDocuments,
    Permission::ShareDocuments,
    Permission::DistributeDocuments,
    Permission::ViewDocuments,
    Permission::EnterMarks,
    Permission::ViewMarks,
];

const TEACHER_PERMISSIONS: &[Permission] = &[
    Permission::RequestCourseAccess,
    Permission::ViewCourses,
    Permission::UploadDocuments,
    Permission::ShareDocuments,
    Permission::ViewDocuments,
    Permission::EnterMarks,
    Permission::ViewMarks,
];

impl Role {
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN_PERMISSIONS,
            Role::ModuleLeader => MODULE_LEADER_PERMISSIONS,
            Role::Teacher => TEACHER_PERMISSIONS,
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Landing page for the role
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::ModuleLeader => "/module-leader",
            Role::Teacher => "/teacher",
        }
    }
}
