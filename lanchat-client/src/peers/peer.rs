//! A chat participant

use std::net::IpAddr;

use lanchat_common::protocol::ClientInfo;

/// Private conversation with a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrivateChat {
    /// The peer went away for good (logged off or timed out)
    pub closed: bool,
}

/// A peer on the network, or the local user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Random code, unique on the network and fixed for the whole session
    code: u32,
    pub nick: String,
    pub is_self: bool,
    pub away: bool,
    pub away_message: String,
    /// Last time a liveness beacon was seen (millis since epoch)
    pub last_idle: i64,
    /// When the peer logged on (millis since epoch)
    pub logon_time: i64,
    pub online: bool,
    pub writing: bool,
    pub ip_address: Option<IpAddr>,
    pub client: String,
    pub operating_system: String,
    /// UDP port for private messages (0 when unknown or unavailable)
    pub private_port: u16,
    pub tcp_port: u16,
    pub private_chat: Option<PrivateChat>,
}

impl Peer {
    /// Create an online peer seen at `now`
    pub fn new(code: u32, nick: impl Into<String>, now: i64) -> Self {
        Self {
            code,
            nick: nick.into(),
            is_self: false,
            away: false,
            away_message: String::new(),
            last_idle: now,
            logon_time: now,
            online: true,
            writing: false,
            ip_address: None,
            client: String::new(),
            operating_system: String::new(),
            private_port: 0,
            tcp_port: 0,
            private_chat: None,
        }
    }

    /// Create the peer representing the local user
    pub fn new_self(code: u32, nick: impl Into<String>, now: i64) -> Self {
        Self {
            is_self: true,
            ..Self::new(code, nick, now)
        }
    }

    /// The peer's code
    pub fn code(&self) -> u32 {
        self.code
    }

    /// Whether the nick matches, ignoring case
    pub fn has_nick(&self, nick: &str) -> bool {
        self.nick.eq_ignore_ascii_case(nick)
    }

    /// Whether private messages can be sent to this peer
    pub fn has_private_port(&self) -> bool {
        self.private_port != 0 && self.ip_address.is_some()
    }

    /// Record announced client details
    ///
    /// The uptime comes off the wire unchecked: it is clamped so the logon
    /// time lands between the epoch and `now`.
    pub fn apply_client_info(&mut self, info: &ClientInfo, now: i64) {
        self.client = info.client.clone();
        self.logon_time = now.saturating_sub(info.uptime_ms.clamp(0, now.max(0)));
        self.operating_system = info.operating_system.clone();
        self.private_port = info.private_port;
        self.tcp_port = info.tcp_port;
    }

    /// Mark the peer as gone, closing any private conversation
    pub(crate) fn go_offline(&mut self) {
        self.online = false;
        self.writing = false;
        if let Some(chat) = self.private_chat.as_mut() {
            chat.closed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_peer_is_online() {
        let peer = Peer::new(12345678, "Tina", 1000);
        assert!(peer.online);
        assert!(!peer.is_self);
        assert_eq!(peer.last_idle, 1000);
        assert_eq!(peer.logon_time, 1000);
    }

    #[test]
    fn test_has_nick_ignores_case() {
        let peer = Peer::new(12345678, "Tina", 0);
        assert!(peer.has_nick("tINA"));
        assert!(!peer.has_nick("Tin"));
    }

    #[test]
    fn test_client_info_sets_logon_time() {
        let mut peer = Peer::new(12345678, "Tina", 0);
        let info = ClientInfo {
            client: "LanChat v0.3.0".to_string(),
            uptime_ms: 4000,
            operating_system: "Linux".to_string(),
            private_port: 40656,
            tcp_port: 0,
        };

        peer.apply_client_info(&info, 10_000);

        assert_eq!(peer.logon_time, 6000);
        assert_eq!(peer.private_port, 40656);
        assert_eq!(peer.operating_system, "Linux");
        assert!(!peer.has_private_port());
    }

    #[test]
    fn test_client_info_uptime_out_of_range() {
        let mut peer = Peer::new(12345678, "Tina", 0);
        let mut info = ClientInfo {
            client: "LanChat v0.3.0".to_string(),
            uptime_ms: i64::MIN,
            operating_system: "Linux".to_string(),
            private_port: 0,
            tcp_port: 0,
        };

        peer.apply_client_info(&info, 10_000);
        assert_eq!(peer.logon_time, 10_000);

        info.uptime_ms = -1;
        peer.apply_client_info(&info, 10_000);
        assert_eq!(peer.logon_time, 10_000);

        info.uptime_ms = i64::MAX;
        peer.apply_client_info(&info, 10_000);
        assert_eq!(peer.logon_time, 0);
    }

    #[test]
    fn test_go_offline_closes_private_chat() {
        let mut peer = Peer::new(12345678, "Tina", 0);
        peer.private_chat = Some(PrivateChat::default());
        peer.writing = true;

        peer.go_offline();

        assert!(!peer.online);
        assert!(!peer.writing);
        assert_eq!(peer.private_chat, Some(PrivateChat { closed: true }));
    }
}
