//! Integration tests for the session controller
//!
//! Logon and recovery sequences, presence changes and the checks every
//! outgoing chat line goes through.

mod common;

use std::net::SocketAddr;

use common::*;
use lanchat_client::config::Settings;
use lanchat_client::errors::SessionError;
use lanchat_client::notices::Notice;
use lanchat_client::session::SessionPhase;
use lanchat_common::protocol::{MessageKind, MessageType};

// ============================================================================
// Logon and logoff
// ============================================================================

#[tokio::test]
async fn test_logon_sends_sequence_in_order() {
    let test = new_session();

    test.session.log_on().await;

    assert_eq!(
        test.messenger.types(),
        vec![
            MessageType::Logon,
            MessageType::Client,
            MessageType::Expose,
            MessageType::GetTopic
        ]
    );
    assert_eq!(test.session.phase().await, SessionPhase::Connecting);
}

#[tokio::test]
async fn test_own_logon_echo_completes_logon() {
    let test = new_session();
    test.session.log_on().await;

    test.receive(ME, MY_NICK, MessageKind::Logon).await;

    assert_eq!(
        test.session.phase().await,
        SessionPhase::Connected { confirmed: false }
    );
    assert_eq!(test.session.me().await.ip_address, Some(MY_IP));
    assert!(
        test.listener
            .systems()
            .contains(&"You logged on as 192.168.1.10".to_string())
    );
}

#[tokio::test]
async fn test_logon_is_confirmed_after_delay() {
    let test = logged_on_session().await;
    test.wait_for_confirmation().await;
}

#[tokio::test]
async fn test_logon_echo_ignored_when_logged_off() {
    let test = new_session();

    test.receive(ME, MY_NICK, MessageKind::Logon).await;

    assert_eq!(test.session.phase().await, SessionPhase::Disconnected);
}

#[tokio::test]
async fn test_log_off_forgets_peers() {
    let test = logged_on_session().await;
    test.add_peer(TINA, "Tina").await;
    test.clear();

    test.session.log_off(true).await;

    assert_eq!(test.messenger.types(), vec![MessageType::Logoff]);
    assert_eq!(test.session.phase().await, SessionPhase::Disconnected);
    assert!(test.session.peer(TINA).await.is_none());
    assert!(!test.session.topic().await.is_set());
    assert!(test.listener.systems().contains(&"You logged off".to_string()));
}

// ============================================================================
// Link recovery
// ============================================================================

#[tokio::test]
async fn test_recovery_sends_sequence_in_order() {
    let test = logged_on_session().await;

    test.session.network_came_up(false).await;

    assert_eq!(
        test.messenger.types(),
        vec![
            MessageType::Topic,
            MessageType::Exposing,
            MessageType::GetTopic,
            MessageType::Expose,
            MessageType::Idle
        ]
    );
    assert_eq!(
        test.listener.systems(),
        vec!["You are connected to the network again".to_string()]
    );
}

#[tokio::test]
async fn test_silent_recovery_has_no_notice() {
    let test = logged_on_session().await;

    test.session.network_came_up(true).await;

    assert_eq!(test.messenger.types().len(), 5);
    assert!(test.listener.systems().is_empty());
}

#[tokio::test]
async fn test_network_up_while_logged_off_logs_on() {
    let test = new_session();

    test.session.network_came_up(false).await;

    assert_eq!(test.messenger.types()[0], MessageType::Logon);
    assert_eq!(test.session.phase().await, SessionPhase::Connecting);
}

#[tokio::test]
async fn test_network_down_keeps_session() {
    let test = logged_on_session().await;
    test.add_peer(TINA, "Tina").await;
    test.messenger.set_up(false);

    test.session.network_went_down(false).await;

    assert!(test.session.is_logged_on().await);
    assert!(!test.session.is_connected().await);
    assert!(test.session.peer(TINA).await.is_some());
    assert!(
        test.listener
            .systems()
            .contains(&"You lost contact with the network".to_string())
    );
}

// ============================================================================
// Chat lines
// ============================================================================

#[tokio::test]
async fn test_chat_message_is_broadcast_and_shown() {
    let test = logged_on_session().await;

    test.session.send_chat_message("hello").await.unwrap();

    let sent = test.messenger.broadcasts();
    assert_eq!(sent.len(), 1);
    assert!(matches!(
        &sent[0].kind,
        MessageKind::Chat { text, .. } if text == "hello"
    ));
    assert!(test.listener.notices().contains(&Notice::Chat {
        nick: MY_NICK.to_string(),
        color: Settings::default().own_color,
        text: "hello".to_string(),
    }));
}

#[tokio::test]
async fn test_chat_requires_connection() {
    let test = logged_on_session().await;
    test.messenger.set_up(false);

    let result = test.session.send_chat_message("hello").await;

    assert_eq!(result, Err(SessionError::NotConnected));
    assert!(test.messenger.sent().is_empty());
}

#[tokio::test]
async fn test_chat_refused_while_away() {
    let test = logged_on_session().await;
    test.session
        .change_away_status(ME, true, "lunch")
        .await
        .unwrap();
    test.clear();

    let result = test.session.send_chat_message("hello").await;

    assert_eq!(result, Err(SessionError::Away));
    assert!(test.messenger.sent().is_empty());
}

#[tokio::test]
async fn test_chat_text_is_validated() {
    let test = logged_on_session().await;

    assert_eq!(
        test.session.send_chat_message("").await,
        Err(SessionError::EmptyMessage)
    );
    assert_eq!(
        test.session.send_chat_message(&"x".repeat(451)).await,
        Err(SessionError::MessageTooLong)
    );
    assert!(test.messenger.sent().is_empty());
}

// ============================================================================
// Private chat
// ============================================================================

#[tokio::test]
async fn test_private_message_goes_to_private_port() {
    let test = logged_on_session().await;
    test.add_peer(TINA, "Tina").await;
    test.clear();

    test.session
        .send_private_message(TINA, "psst")
        .await
        .unwrap();

    let unicasts = test.messenger.unicasts();
    assert_eq!(unicasts.len(), 1);
    assert_eq!(
        unicasts[0].0,
        SocketAddr::new(peer_ip(TINA), PEER_PRIVATE_PORT)
    );
    assert!(matches!(
        &unicasts[0].1.kind,
        MessageKind::PrivateMessage { target, text, .. } if *target == TINA && text == "psst"
    ));
    assert!(test.session.peer(TINA).await.unwrap().private_chat.is_some());
}

#[tokio::test]
async fn test_private_message_to_self_sends_nothing() {
    let test = logged_on_session().await;

    let result = test.session.send_private_message(ME, "hi me").await;

    assert_eq!(result, Err(SessionError::SendToSelf));
    assert!(test.messenger.sent().is_empty());
}

#[tokio::test]
async fn test_private_message_to_away_peer_refused() {
    let test = logged_on_session().await;
    test.add_peer(TINA, "Tina").await;
    test.receive(
        TINA,
        "Tina",
        MessageKind::Away {
            message: "brb".to_string(),
        },
    )
    .await;
    test.clear();

    let result = test.session.send_private_message(TINA, "hi").await;

    assert_eq!(result, Err(SessionError::PeerAway("Tina".to_string())));
    assert!(test.messenger.sent().is_empty());
}

// ============================================================================
// Presence
// ============================================================================

#[tokio::test]
async fn test_away_and_back_are_announced() {
    let test = logged_on_session().await;

    test.session
        .change_away_status(ME, true, "lunch")
        .await
        .unwrap();
    assert!(test.session.me().await.away);

    test.session.change_away_status(ME, false, "").await.unwrap();
    assert!(!test.session.me().await.away);

    assert_eq!(
        test.messenger.types(),
        vec![MessageType::Away, MessageType::Back]
    );
    assert_eq!(
        test.listener.systems(),
        vec![
            "You went away: lunch".to_string(),
            "You came back".to_string()
        ]
    );
}

#[tokio::test]
async fn test_away_requires_logon() {
    let test = new_session();

    let result = test.session.change_away_status(ME, true, "lunch").await;

    assert_eq!(result, Err(SessionError::NotConnected));
    assert!(test.messenger.sent().is_empty());
}

#[tokio::test]
async fn test_nick_change_is_announced_and_saved() {
    let test = logged_on_session().await;

    test.session.change_my_nick("Neo").await.unwrap();

    let sent = test.messenger.broadcasts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, MessageKind::Nick);
    assert_eq!(sent[0].nick, "Neo");
    assert_eq!(test.session.me().await.nick, "Neo");

    let saved = Settings::load(&test.config_path()).unwrap();
    assert_eq!(saved.nick, "Neo");
}

#[tokio::test]
async fn test_nick_in_use_refused() {
    let test = logged_on_session().await;
    test.add_peer(TINA, "Tina").await;
    test.clear();

    let result = test.session.change_my_nick("tina").await;

    assert_eq!(result, Err(SessionError::NickInUse("tina".to_string())));
    assert!(test.messenger.sent().is_empty());
    assert_eq!(test.session.me().await.nick, MY_NICK);
}

#[tokio::test]
async fn test_nick_change_refused_while_away() {
    let test = logged_on_session().await;
    test.session
        .change_away_status(ME, true, "lunch")
        .await
        .unwrap();
    test.clear();

    let result = test.session.change_my_nick("Neo").await;

    assert_eq!(result, Err(SessionError::NickWhileAway));
    assert!(test.messenger.sent().is_empty());
}

#[tokio::test]
async fn test_writing_announced_only_on_change() {
    let test = logged_on_session().await;

    test.session.update_me_writing(true).await.unwrap();
    test.session.update_me_writing(true).await.unwrap();
    test.session.update_me_writing(false).await.unwrap();

    assert_eq!(
        test.messenger.types(),
        vec![MessageType::Writing, MessageType::StoppedWriting]
    );
}

#[tokio::test]
async fn test_writing_tracked_locally_while_offline() {
    let test = new_session();

    test.session.update_me_writing(true).await.unwrap();

    assert!(test.messenger.sent().is_empty());
    assert!(test.session.me().await.writing);

    test.session.update_me_writing(false).await.unwrap();
    assert!(!test.session.me().await.writing);
}

#[tokio::test]
async fn test_writing_tracked_locally_while_network_down() {
    let test = logged_on_session().await;
    test.messenger.set_up(false);

    test.session.update_me_writing(true).await.unwrap();

    assert!(test.messenger.sent().is_empty());
    assert!(test.session.me().await.writing);
}

// ============================================================================
// Topic
// ============================================================================

#[tokio::test]
async fn test_topic_change_is_broadcast() {
    let test = logged_on_session().await;

    test.session.change_topic("Lunch at noon").await.unwrap();

    let topic = test.session.topic().await;
    assert_eq!(topic.text, "Lunch at noon");
    assert_eq!(topic.author, MY_NICK);
    assert!(topic.time_ms > 0);

    let sent = test.messenger.broadcasts();
    assert!(matches!(
        &sent[0].kind,
        MessageKind::Topic(payload) if payload.text == "Lunch at noon" && payload.author == MY_NICK
    ));
}

#[tokio::test]
async fn test_topic_removed_with_empty_text() {
    let test = logged_on_session().await;
    test.session.change_topic("Lunch").await.unwrap();

    test.session.change_topic("").await.unwrap();

    assert!(!test.session.topic().await.is_set());
    assert!(
        test.listener
            .systems()
            .contains(&"You removed the topic".to_string())
    );
}
