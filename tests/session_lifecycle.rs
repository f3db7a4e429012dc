//! Integration tests for active sessions: chat relay, built-in commands,
//! and session teardown.

mod common;

use common::{TestClient, TestServer, wait_for_sessions};
use std::time::Duration;

#[tokio::test]
async fn chat_relays_to_everyone_except_the_sender() {
    let server = TestServer::spawn().await;

    let mut alice = TestClient::connect(server.address()).await;
    alice.login("alice", "p4s$w0rd!").await;
    let mut bob = TestClient::connect(server.address()).await;
    bob.login("bob", "hunter2").await;
    wait_for_sessions(&server.roster, 2).await;

    alice.send("hi").await;

    assert_eq!(bob.recv().await, "alice: hi");
    alice.expect_silence(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn empty_lines_are_ignored() {
    let server = TestServer::spawn().await;

    let mut alice = TestClient::connect(server.address()).await;
    alice.login("alice", "p4s$w0rd!").await;
    let mut bob = TestClient::connect(server.address()).await;
    bob.login("bob", "hunter2").await;
    wait_for_sessions(&server.roster, 2).await;

    alice.send("").await;
    alice.send("after the blank").await;

    // Only the real line arrives; the blank one was dropped server-side.
    assert_eq!(bob.recv().await, "alice: after the blank");
    bob.expect_silence(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn users_command_lists_sessions_in_join_order() {
    let server = TestServer::spawn().await;

    let mut alice = TestClient::connect(server.address()).await;
    alice.login("alice", "p4s$w0rd!").await;
    let mut bob = TestClient::connect(server.address()).await;
    bob.login("bob", "hunter2").await;
    wait_for_sessions(&server.roster, 2).await;

    bob.send("/users").await;
    assert_eq!(bob.recv().await, "alice");
    assert_eq!(bob.recv().await, "bob");
}

#[tokio::test]
async fn help_command_describes_builtins() {
    let server = TestServer::spawn().await;
    let mut alice = TestClient::connect(server.address()).await;
    alice.login("alice", "p4s$w0rd!").await;

    alice.send("/help").await;

    let mut lines = Vec::new();
    while let Ok(Some(line)) = alice.try_recv().await {
        let done = line == " - Parameters: 0" && lines.contains(&"help".to_string());
        lines.push(line);
        if done {
            break;
        }
    }
    assert!(lines.contains(&"Available Commands".to_string()));
    for name in ["quit", "users", "help"] {
        assert!(lines.contains(&name.to_string()), "missing {name} in {lines:?}");
    }
    assert!(lines.contains(&" - Disconnect from chat".to_string()));
}

#[tokio::test]
async fn unknown_command_gets_exactly_one_reply() {
    let server = TestServer::spawn().await;
    let mut alice = TestClient::connect(server.address()).await;
    alice.login("alice", "p4s$w0rd!").await;

    alice.send("/eject").await;
    assert_eq!(alice.recv().await, "Server: Unknown command [eject]");
    alice.expect_silence(Duration::from_millis(200)).await;

    // The session survives the unknown command.
    alice.send("/users").await;
    assert_eq!(alice.recv().await, "alice");
}

#[tokio::test]
async fn quit_says_goodbye_and_deregisters() {
    let server = TestServer::spawn().await;

    let mut alice = TestClient::connect(server.address()).await;
    alice.login("alice", "p4s$w0rd!").await;
    let mut bob = TestClient::connect(server.address()).await;
    bob.login("bob", "hunter2").await;
    wait_for_sessions(&server.roster, 2).await;

    alice.send("/quit").await;
    assert_eq!(alice.recv().await, "Server: Later dude.");
    alice.expect_closed().await;
    wait_for_sessions(&server.roster, 1).await;

    // Bob is untouched.
    bob.send("/users").await;
    assert_eq!(bob.recv().await, "bob");
}

#[tokio::test]
async fn abrupt_disconnect_deregisters_the_session() {
    let server = TestServer::spawn().await;

    let mut alice = TestClient::connect(server.address()).await;
    alice.login("alice", "p4s$w0rd!").await;
    let mut bob = TestClient::connect(server.address()).await;
    bob.login("bob", "hunter2").await;
    wait_for_sessions(&server.roster, 2).await;

    drop(alice);
    wait_for_sessions(&server.roster, 1).await;

    // One dead client must not silence the room for the rest.
    bob.send("anyone there?").await;
    bob.expect_silence(Duration::from_millis(200)).await;
    assert_eq!(server.roster.usernames(), vec!["bob"]);
}
