//! # Full Node
//!
//! The node runtime with real schedulers, listeners and the supervisor.

#[cfg(test)]
mod tests {
    use crate::fixtures::{send_via, transfer, wallet};
    use node_runtime::config::GenesisAccount;
    use node_runtime::{NodeConfig, NodeError, ShardNode};
    use sc_02_storage::Storage;
    use sc_03_execution::read_account;
    use sc_04_collator::ReplayError;
    use shared_bus::{NetworkManager, Topic};
    use shared_types::{Address, Block, U256};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    fn config(sender: Address) -> NodeConfig {
        let mut config = NodeConfig::default();
        config.n_shards = 3;
        config.topology = "trivial".to_string();
        config.collator.tick_ms = 20;
        config.genesis.accounts.push(GenesisAccount {
            address: format!("{sender:?}"),
            balance: 1_000_000,
            code: None,
        });
        config
    }

    #[tokio::test]
    async fn test_node_delivers_cross_shard_transfer() {
        let sender = wallet(1, 1);
        let recipient = wallet(2, 2);
        let node = Arc::new(ShardNode::new(config(sender)).unwrap());
        let mut blocks = node
            .network()
            .unwrap()
            .subscribe(&Topic::shard_blocks(2))
            .unwrap();
        node.pool(1)
            .unwrap()
            .add(send_via(sender, 0, transfer(recipient, 10_000)))
            .unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let running = tokio::spawn({
            let node = Arc::clone(&node);
            async move { node.run(shutdown_rx).await }
        });

        let storage = node.storage();
        let mut credited = None;
        for _ in 0..200 {
            let ro = storage.begin_ro().unwrap();
            credited = read_account(ro.as_ref(), 2, &recipient).unwrap();
            if credited.is_some() {
                break;
            }
            drop(ro);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(credited.unwrap().balance, U256::from(9_000));

        let payload = tokio::time::timeout(Duration::from_secs(1), blocks.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Block::decode(&payload).unwrap().shard_id, 2);

        shutdown_tx.send(true).unwrap();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_failed_replay_stops_the_node() {
        let sender = wallet(1, 1);
        let mut config = config(sender);
        config.replay.shard = Some(1);
        config.replay.block = Some(4);
        let node = ShardNode::new(config).unwrap();

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let result = tokio::time::timeout(Duration::from_secs(5), node.run(shutdown_rx))
            .await
            .unwrap();

        assert!(matches!(
            result,
            Err(NodeError::Replay(ReplayError::BlockNotFound { shard_id: 1, block: 4 }))
        ));
    }
}
