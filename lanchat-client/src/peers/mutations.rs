//! Mutation methods for PeerList

use std::net::IpAddr;

use super::{Peer, PeerError, PeerList, PrivateChat};

impl PeerList {
    fn get_mut(&mut self, code: u32) -> Option<&mut Peer> {
        if code == self.me.code() {
            Some(&mut self.me)
        } else {
            self.others.get_mut(&code)
        }
    }

    /// Add a remote peer
    ///
    /// # Errors
    ///
    /// Fails if the code or the nick (ignoring case) is already in use.
    pub fn add(&mut self, mut peer: Peer) -> Result<(), PeerError> {
        if self.contains(peer.code()) {
            return Err(PeerError::CodeInUse(peer.code()));
        }
        if self.is_nick_in_use(&peer.nick) {
            return Err(PeerError::NickInUse(peer.nick));
        }

        peer.is_self = false;
        self.others.insert(peer.code(), peer);
        Ok(())
    }

    /// Remove a remote peer, returning it marked offline
    pub fn remove(&mut self, code: u32) -> Result<Peer, PeerError> {
        if code == self.me.code() {
            return Err(PeerError::SelfPeer);
        }

        let mut peer = self
            .others
            .remove(&code)
            .ok_or(PeerError::UnknownPeer(code))?;
        peer.go_offline();
        Ok(peer)
    }

    /// Remove every remote peer not seen for more than `timeout_ms`
    ///
    /// Each removed peer is returned once, marked offline.
    pub fn remove_timed_out(&mut self, now: i64, timeout_ms: i64) -> Vec<Peer> {
        let expired: Vec<u32> = self
            .others
            .values()
            .filter(|peer| now - peer.last_idle > timeout_ms)
            .map(Peer::code)
            .collect();

        expired
            .into_iter()
            .filter_map(|code| self.remove(code).ok())
            .collect()
    }

    /// Remove every remote peer
    pub fn clear_others(&mut self) -> Vec<Peer> {
        let codes: Vec<u32> = self.others.keys().copied().collect();
        codes
            .into_iter()
            .filter_map(|code| self.remove(code).ok())
            .collect()
    }

    /// Change a nick, returning the previous one
    pub fn set_nick(&mut self, code: u32, nick: &str) -> Result<String, PeerError> {
        if self.is_nick_taken_by_other(nick, code) {
            return Err(PeerError::NickInUse(nick.to_string()));
        }

        let peer = self.get_mut(code).ok_or(PeerError::UnknownPeer(code))?;
        Ok(std::mem::replace(&mut peer.nick, nick.to_string()))
    }

    /// Change away state and message
    pub fn set_away(&mut self, code: u32, away: bool, message: &str) -> Result<(), PeerError> {
        let peer = self.get_mut(code).ok_or(PeerError::UnknownPeer(code))?;
        peer.away = away;
        peer.away_message = message.to_string();
        Ok(())
    }

    /// Change the typing flag
    pub fn set_writing(&mut self, code: u32, writing: bool) -> Result<(), PeerError> {
        let peer = self.get_mut(code).ok_or(PeerError::UnknownPeer(code))?;
        peer.writing = writing;
        Ok(())
    }

    /// Record a liveness beacon
    pub fn touch(&mut self, code: u32, now: i64) -> Result<(), PeerError> {
        let peer = self.get_mut(code).ok_or(PeerError::UnknownPeer(code))?;
        peer.last_idle = now;
        Ok(())
    }

    /// Record the address a peer was seen at
    ///
    /// Returns the previous address when it was known and differs.
    pub fn set_ip_address(&mut self, code: u32, ip: IpAddr) -> Result<Option<IpAddr>, PeerError> {
        let peer = self.get_mut(code).ok_or(PeerError::UnknownPeer(code))?;
        let previous = peer.ip_address.replace(ip);
        Ok(previous.filter(|old| *old != ip))
    }

    /// Apply a change to any peer
    ///
    /// Code and nick stay protected; use [`PeerList::set_nick`] for the nick.
    pub fn update<F>(&mut self, code: u32, change: F) -> Result<(), PeerError>
    where
        F: FnOnce(&mut Peer),
    {
        let peer = self.get_mut(code).ok_or(PeerError::UnknownPeer(code))?;
        let nick = peer.nick.clone();
        let is_self = peer.is_self;
        change(&mut *peer);
        peer.nick = nick;
        peer.is_self = is_self;
        Ok(())
    }

    /// Mark a private conversation as open
    pub fn open_private_chat(&mut self, code: u32) -> Result<(), PeerError> {
        let peer = self.get_mut(code).ok_or(PeerError::UnknownPeer(code))?;
        peer.private_chat.get_or_insert_with(PrivateChat::default).closed = false;
        Ok(())
    }

    /// Reset the local user after logging off
    pub fn reset_me(&mut self) {
        self.me.away = false;
        self.me.away_message.clear();
        self.me.writing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn list() -> PeerList {
        let mut peers = PeerList::new(Peer::new_self(11111111, "Me", 0));
        peers.add(Peer::new(22222222, "Tina", 1000)).unwrap();
        peers.add(Peer::new(33333333, "Bob", 5000)).unwrap();
        peers
    }

    #[test]
    fn test_remove_timed_out_only_stale_peers() {
        let mut peers = list();
        // Self is never removed even though it is the stalest
        let removed = peers.remove_timed_out(121_500, 120_000);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].code(), 22222222);
        assert!(!removed[0].online);
        assert!(peers.contains(11111111));
        assert!(peers.contains(33333333));
        assert!(!peers.contains(22222222));
    }

    #[test]
    fn test_remove_timed_out_is_exclusive() {
        let mut peers = list();
        assert_eq!(peers.remove_timed_out(121_000, 120_000).len(), 0);
        assert_eq!(peers.remove_timed_out(121_001, 120_000).len(), 1);
        assert_eq!(peers.remove_timed_out(121_001, 120_000).len(), 0);
    }

    #[test]
    fn test_remove_closes_private_chat() {
        let mut peers = list();
        peers.open_private_chat(22222222).unwrap();

        let removed = peers.remove(22222222).unwrap();

        assert_eq!(removed.private_chat, Some(PrivateChat { closed: true }));
        assert_eq!(peers.remove(22222222), Err(PeerError::UnknownPeer(22222222)));
    }

    #[test]
    fn test_set_nick_returns_previous() {
        let mut peers = list();
        assert_eq!(peers.set_nick(22222222, "Tine").unwrap(), "Tina");
        // Changing case of own nick is allowed
        assert_eq!(peers.set_nick(22222222, "TINE").unwrap(), "Tine");
        assert_eq!(peers.by_nick("tine").map(|p| p.code()), Some(22222222));
    }

    #[test]
    fn test_set_ip_address_reports_changes() {
        let mut peers = list();
        let first = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 2));
        let second = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 3));

        assert_eq!(peers.set_ip_address(22222222, first), Ok(None));
        assert_eq!(peers.set_ip_address(22222222, first), Ok(None));
        assert_eq!(peers.set_ip_address(22222222, second), Ok(Some(first)));
    }

    #[test]
    fn test_update_cannot_change_nick() {
        let mut peers = list();
        peers
            .update(22222222, |peer| {
                peer.nick = "Bob".to_string();
                peer.away = true;
            })
            .unwrap();

        let tina = peers.get(22222222).unwrap();
        assert_eq!(tina.nick, "Tina");
        assert!(tina.away);
    }

    #[test]
    fn test_clear_others_keeps_self() {
        let mut peers = list();
        assert_eq!(peers.clear_others().len(), 2);
        assert_eq!(peers.len(), 1);
        assert!(peers.me().is_self);
    }
}
