//! Consistent-hash ring over named peers.

/// Hashes bytes to a position on the ring.
pub type HashFn = Box<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// Consistent-hash ring with virtual nodes.
///
/// Peers are added as `replicas` virtual positions each; lookups walk
/// clockwise to the first virtual node at or after the key's hash.
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// All virtual-node positions, sorted ascending.
    hashes: Vec<u32>,
    /// Virtual-node position → peer name.
    hash_to_node: std::collections::HashMap<u32, String>,
}

impl HashRing {
    /// Creates an empty ring. `hash` defaults to CRC-32/IEEE.
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            hash: hash.unwrap_or_else(|| Box::new(crc32fast::hash)),
            replicas: replicas.max(1),
            hashes: Vec::new(),
            hash_to_node: std::collections::HashMap::new(),
        }
    }

    /// Adds peers to the ring.
    ///
    /// Virtual position `i` of a peer hashes the decimal index concatenated
    /// with the peer name, so the layout is reproducible from the membership
    /// list alone. Hash collisions resolve to the later addition.
    pub fn add<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            let node = node.as_ref();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{i}{node}").as_bytes());
                self.hashes.push(position);
                self.hash_to_node.insert(position, node.to_string());
            }
        }
        self.hashes.sort_unstable();
    }

    /// Returns the peer owning `key`, or `None` on an empty ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.hashes.is_empty() {
            return None;
        }
        let target = (self.hash)(key.as_bytes());
        // First virtual node at or after the key, wrapping past the end.
        let idx = self.hashes.partition_point(|&position| position < target);
        let winner = self.hashes[idx % self.hashes.len()];
        self.hash_to_node.get(&winner).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
