//! Query methods for PeerList

use super::{Peer, PeerList};

impl PeerList {
    /// The local user
    pub fn me(&self) -> &Peer {
        &self.me
    }

    /// Get a peer (or the local user) by code
    pub fn get(&self, code: u32) -> Option<&Peer> {
        if code == self.me.code() {
            Some(&self.me)
        } else {
            self.others.get(&code)
        }
    }

    /// Get a peer by nick (case-insensitive)
    pub fn by_nick(&self, nick: &str) -> Option<&Peer> {
        self.iter().find(|peer| peer.has_nick(nick))
    }

    /// Whether any peer, including the local user, uses this nick
    pub fn is_nick_in_use(&self, nick: &str) -> bool {
        self.by_nick(nick).is_some()
    }

    /// Whether the nick is used by anyone other than `code`
    pub fn is_nick_taken_by_other(&self, nick: &str, code: u32) -> bool {
        self.iter()
            .any(|peer| peer.code() != code && peer.has_nick(nick))
    }

    /// Whether this code belongs to a known peer
    pub fn contains(&self, code: u32) -> bool {
        self.get(code).is_some()
    }

    /// Iterate over every peer, local user first
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        std::iter::once(&self.me).chain(self.others.values())
    }

    /// Number of peers, including the local user
    pub fn len(&self) -> usize {
        self.others.len() + 1
    }

    /// Always false: the local user is always present
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All nicks, sorted case-insensitively
    pub fn sorted_nicks(&self) -> Vec<String> {
        let mut nicks: Vec<String> = self.iter().map(|peer| peer.nick.clone()).collect();
        nicks.sort_by_key(|nick| nick.to_lowercase());
        nicks
    }
}
