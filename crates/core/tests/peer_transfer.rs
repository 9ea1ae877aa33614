use std::time::Duration;

use anyhow::Result;
use tokio::{io::AsyncWriteExt, net::TcpStream, sync::mpsc, time::timeout};
use tycoon_core::{
    transfer::ListenerSettings, GameSession, Ledger, SaveManager, TransferEvent,
    TransferListener, TransferSender,
};

fn peer(username: &str) -> GameSession {
    GameSession::new(Ledger::new_game(username), SaveManager::default())
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<TransferEvent>) -> TransferEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("listener event timed out")
        .expect("listener stopped")
}

#[tokio::test]
async fn money_moves_between_two_peers() -> Result<()> {
    let alice = peer("alice");
    let bob = peer("bob");

    let listener =
        TransferListener::bind("127.0.0.1:0", bob.clone(), ListenerSettings::default()).await?;
    let port = listener.local_addr()?.port();
    let (tx, mut events) = mpsc::unbounded_channel();
    tokio::spawn(listener.run(tx));

    let sender = TransferSender::new(alice.clone(), port, Duration::from_secs(5));
    let receipt = sender.send("127.0.0.1", 30.0).await?;
    assert_eq!(receipt.balance, 70.0);

    match next_event(&mut events).await {
        TransferEvent::Received { sender, amount, balance, .. } => {
            assert_eq!(sender, "alice");
            assert_eq!(amount, 30.0);
            assert_eq!(balance, 130.0);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(alice.balance(), 70.0);
    assert_eq!(bob.balance(), 130.0);
    Ok(())
}

#[tokio::test]
async fn listener_survives_garbage_between_transfers() -> Result<()> {
    let alice = peer("alice");
    let bob = peer("bob");

    let listener =
        TransferListener::bind("127.0.0.1:0", bob.clone(), ListenerSettings::default()).await?;
    let addr = listener.local_addr()?;
    let (tx, mut events) = mpsc::unbounded_channel();
    tokio::spawn(listener.run(tx));

    let mut garbage = TcpStream::connect(addr).await?;
    garbage.write_all(b"this is not a transfer").await?;
    garbage.shutdown().await?;
    assert!(matches!(
        next_event(&mut events).await,
        TransferEvent::Rejected { .. }
    ));

    let sender = TransferSender::new(alice.clone(), addr.port(), Duration::from_secs(5));
    sender.send("127.0.0.1", 100.0).await?;
    assert!(matches!(
        next_event(&mut events).await,
        TransferEvent::Received { .. }
    ));
    assert_eq!(alice.balance(), 0.0);
    assert_eq!(bob.balance(), 200.0);
    Ok(())
}

#[tokio::test]
async fn received_money_can_fund_an_upgrade() -> Result<()> {
    let alice = peer("alice");
    let bob = peer("bob");
    bob.upgrade(0)?;
    assert_eq!(bob.balance(), 50.0);
    assert!(bob.upgrade(0).is_err());

    let listener =
        TransferListener::bind("127.0.0.1:0", bob.clone(), ListenerSettings::default()).await?;
    let port = listener.local_addr()?.port();
    let (tx, mut events) = mpsc::unbounded_channel();
    tokio::spawn(listener.run(tx));

    TransferSender::new(alice, port, Duration::from_secs(5))
        .send("127.0.0.1", 50.0)
        .await?;
    next_event(&mut events).await;

    let receipt = bob.upgrade(0)?;
    assert_eq!(receipt.cost, 100.0);
    assert_eq!(receipt.level, 3);
    assert_eq!(bob.balance(), 0.0);
    Ok(())
}
