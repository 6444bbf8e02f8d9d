use parking_lot::RwLock;

/// Pages a signed-out user must be able to reach; a session teardown never
/// redirects away from these.
pub const AUTH_PAGES: [&str; 4] = ["/login", "/register", "/forgot-password", "/reset-password"];

pub fn is_auth_page(path: &str) -> bool {
    AUTH_PAGES.contains(&path)
}

/// Host-side navigation, injected into the client so that it never drives a
/// router directly.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    fn navigate(&self, path: &str);
}

#[derive(Debug)]
pub struct MemoryNavigator {
    current: RwLock<String>,
    history: RwLock<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(start.into()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Every path navigated to, oldest first
    pub fn history(&self) -> Vec<String> {
        self.history.read().clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.current.read().clone()
    }

    fn navigate(&self, path: &str) {
        *self.current.write() = path.to_string();
        self.history.write().push(path.to_string());
    }
}
