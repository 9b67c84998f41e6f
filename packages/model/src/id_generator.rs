use crc32fast::Hasher;

/// Derive a page seed from its name using CRC32
pub fn get_page_seed(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(b"page://");
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator for nodes within a page.
///
/// Ids produced by one generator never repeat. The page additionally skips
/// ids that are already taken in its arena, so ids imported from a schema
/// and generated ids can share the same namespace.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(page_name: &str) -> Self {
        Self {
            seed: get_page_seed(page_name),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    /// Generate the next ID rejected by `taken`
    pub fn new_id_where(&mut self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id = self.new_id();
            if !taken(&id) {
                return id;
            }
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
