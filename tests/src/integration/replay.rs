//! # Block Replay
//!
//! Blocks produced by the collator, including relayed and internal
//! messages, regenerate with an identical hash.

#[cfg(test)]
mod tests {
    use crate::fixtures::{self_call, send_via, transfer, wallet, TestNet};
    use sc_01_topology::ShardTopology;
    use shared_types::U256;

    #[tokio::test]
    async fn test_replay_of_head_block_matches() {
        let sender = wallet(1, 1);
        let recipient = wallet(3, 3);
        let net = TestNet::new(4, ShardTopology::Neighbouring, &[(sender, 1_000_000)]);
        net.submit(send_via(sender, 0, transfer(recipient, 40_000)));
        net.round().await;
        let (expected, _) = net.head(3);

        let report = net.replay(3, 1).await;

        assert!(report.matches);
        assert_eq!(report.expected, expected);
        assert_eq!(net.head(3).0, expected);
        assert_eq!(net.balance(&recipient), U256::from(39_000));
    }

    #[tokio::test]
    async fn test_replay_of_relaying_block_matches() {
        let sender = wallet(1, 1);
        let recipient = wallet(3, 3);
        let net = TestNet::new(4, ShardTopology::Neighbouring, &[(sender, 1_000_000)]);
        net.submit(send_via(sender, 0, transfer(recipient, 40_000)));
        net.round().await;
        let (expected, block) = net.head(2);
        assert!(block.in_messages_root.is_zero());

        let report = net.replay(2, 1).await;

        assert!(report.matches);
        assert_eq!(report.regenerated, expected);
        assert_eq!(net.out_messages(2, 1).len(), 1);
    }

    #[tokio::test]
    async fn test_replay_rewinds_later_blocks() {
        let sender = wallet(1, 1);
        let net = TestNet::new(3, ShardTopology::Neighbouring, &[(sender, 1_000_000)]);
        net.submit(self_call(sender, 0));
        net.submit(self_call(sender, 1));
        let first = net.collate(1).await.unwrap();
        let balance_after_first = net.balance(&sender);
        net.submit(self_call(sender, 2));
        net.collate(1).await.unwrap();
        net.submit(self_call(sender, 3));
        net.collate(1).await.unwrap();
        assert_eq!(net.head(1).1.id, 3);
        assert_eq!(net.account(&sender).unwrap().seqno, 4);

        let report = net.replay(1, 1).await;

        assert!(report.matches);
        assert_eq!(report.regenerated, first.hash);
        let (head, block) = net.head(1);
        assert_eq!((head, block.id), (first.hash, 1));
        let account = net.account(&sender).unwrap();
        assert_eq!(account.seqno, 2);
        assert_eq!(account.balance, balance_after_first);
    }

    #[tokio::test]
    async fn test_collation_resumes_after_replay() {
        let sender = wallet(1, 1);
        let net = TestNet::new(2, ShardTopology::Neighbouring, &[(sender, 1_000_000)]);
        net.submit(self_call(sender, 0));
        net.collate(1).await.unwrap();
        net.submit(self_call(sender, 1));
        let second = net.collate(1).await.unwrap();

        net.replay(1, 1).await;
        net.submit(self_call(sender, 1));
        let again = net.collate(1).await.unwrap();

        assert_eq!(again.block.id, 2);
        assert_eq!(again.hash, second.hash);
    }

    #[tokio::test]
    async fn test_replay_after_main_shard_advances_matches() {
        let main_wallet = wallet(0, 7);
        let sender = wallet(1, 1);
        let net = TestNet::new(
            2,
            ShardTopology::Neighbouring,
            &[(sender, 1_000_000), (main_wallet, 1_000_000)],
        );
        net.submit(self_call(sender, 0));
        let first = net.collate(1).await.unwrap();
        net.submit(self_call(main_wallet, 0));
        net.collate(0).await.unwrap();
        net.submit(self_call(sender, 1));
        let second = net.collate(1).await.unwrap();
        assert_eq!(second.block.main_chain_hash, net.head(0).0);
        assert_ne!(second.block.main_chain_hash, first.block.main_chain_hash);

        let report = net.replay(1, 2).await;

        assert!(report.matches);
        assert_eq!(report.regenerated, second.hash);
    }

    #[tokio::test]
    async fn test_internal_messages_of_rewound_blocks_are_delivered_again() {
        let sender = wallet(0, 1);
        let local = wallet(1, 1);
        let recipient = wallet(1, 2);
        let net = TestNet::new(
            2,
            ShardTopology::Neighbouring,
            &[(sender, 1_000_000), (local, 1_000_000)],
        );
        net.submit(self_call(local, 0));
        net.collate(1).await.unwrap();
        net.submit(self_call(local, 1));
        net.collate(1).await.unwrap();
        net.submit(send_via(sender, 0, transfer(recipient, 40_000)));
        net.collate(0).await.unwrap();
        let delivered = net.collate(1).await.unwrap();
        assert_eq!(delivered.block.id, 3);
        let received = net.balance(&recipient);
        assert!(!received.is_zero());

        let report = net.replay(1, 2).await;
        assert!(report.matches);
        assert!(net.balance(&recipient).is_zero());

        let again = net.collate(1).await.unwrap();
        assert_eq!(again.block.id, 3);
        assert_eq!(again.committed, delivered.committed);
        assert_eq!(net.balance(&recipient), received);
    }
}
