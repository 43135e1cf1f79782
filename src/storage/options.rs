/// Whether a stream opens its file writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileAccess {
    /// Open an existing file without write permission.
    Read,
    /// Open or create the file for reading and writing.
    #[default]
    ReadWrite,
}

impl FileAccess {
    pub fn is_writable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

pub const DEFAULT_RANDOM_ACCESS: bool = true;
pub const DEFAULT_CREATE_PARENT_DIRS: bool = false;

/// How [`DiskFile`](super::DiskFile) opens its path.
///
/// Files are always opened in shared mode so a concurrently seeding peer,
/// or another handle on the same path, is never locked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    pub access: FileAccess,
    /// Hint the OS that reads and writes will not be sequential.
    pub random_access: bool,
    pub create_parent_dirs: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            access: FileAccess::default(),
            random_access: DEFAULT_RANDOM_ACCESS,
            create_parent_dirs: DEFAULT_CREATE_PARENT_DIRS,
        }
    }
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access(mut self, access: FileAccess) -> Self {
        self.access = access;
        self
    }

    pub fn with_random_access(mut self, enabled: bool) -> Self {
        self.random_access = enabled;
        self
    }

    pub fn with_create_parent_dirs(mut self, enabled: bool) -> Self {
        self.create_parent_dirs = enabled;
        self
    }
}
