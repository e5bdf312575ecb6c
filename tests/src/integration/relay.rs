//! # Cross-Shard Delivery
//!
//! A message emitted on one shard reaches its destination as an internal
//! in-message: directly under the trivial topology, hop by hop along the
//! ring under the neighbouring one.

#[cfg(test)]
mod tests {
    use crate::fixtures::{send_via, transfer, wallet, TestNet};
    use sc_01_topology::{trace_relay, ShardTopology};
    use shared_types::U256;

    #[tokio::test]
    async fn test_ring_relay_reaches_destination() {
        let sender = wallet(1, 1);
        let recipient = wallet(3, 3);
        let net = TestNet::new(5, ShardTopology::Neighbouring, &[(sender, 1_000_000)]);
        let inner = transfer(recipient, 50_000);
        net.submit(send_via(sender, 0, inner.clone()));

        net.round().await;

        // Shard 1 emitted it, shard 2 relayed it, shard 3 executed it.
        let emitted = net.out_messages(1, 1);
        assert_eq!(emitted.len(), 1);
        let hash = emitted[0].hash();
        assert!(emitted[0].internal);
        assert_eq!(emitted[0].from, sender);

        let relayed = net.out_messages(2, 1);
        assert_eq!(relayed.iter().map(|m| m.hash()).collect::<Vec<_>>(), vec![hash]);

        let (_, head_3) = net.head(3);
        assert_eq!(head_3.id, 1);
        let receipts = net.receipts(3, 1);
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].msg_hash, hash);
        assert!(receipts[0].success);
        assert_eq!(net.balance(&recipient), U256::from(49_000));

        // Nothing crossed in the other direction.
        let (_, head_0) = net.head(0);
        assert_eq!(head_0.id, 0);
        assert_eq!(net.balance(&sender), U256::from(1_000_000 - 1_000 - 50_000));

        let trace = trace_relay(ShardTopology::Neighbouring, 1, 3, 5);
        assert_eq!(trace.relays, vec![2]);
    }

    #[tokio::test]
    async fn test_relayed_message_is_delivered_once() {
        let sender = wallet(1, 1);
        let recipient = wallet(3, 3);
        let net = TestNet::new(4, ShardTopology::Neighbouring, &[(sender, 1_000_000)]);
        net.submit(send_via(sender, 0, transfer(recipient, 20_000)));

        net.round().await;
        net.round().await;
        net.round().await;

        let (_, head_3) = net.head(3);
        assert_eq!(head_3.id, 1);
        assert_eq!(net.balance(&recipient), U256::from(19_000));
    }

    #[tokio::test]
    async fn test_trivial_topology_delivers_directly() {
        let sender = wallet(1, 1);
        let recipient = wallet(3, 3);
        let net = TestNet::new(5, ShardTopology::Trivial, &[(sender, 1_000_000)]);
        net.submit(send_via(sender, 0, transfer(recipient, 50_000)));

        net.round().await;

        let (_, head_2) = net.head(2);
        assert_eq!(head_2.id, 0);
        assert_eq!(net.receipts(3, 1).len(), 1);
        assert_eq!(net.balance(&recipient), U256::from(49_000));
        assert!(trace_relay(ShardTopology::Trivial, 1, 3, 5).relays.is_empty());
    }

    #[tokio::test]
    async fn test_message_to_own_shard_is_delivered_next_block() {
        let sender = wallet(2, 1);
        let recipient = wallet(2, 9);
        let net = TestNet::new(3, ShardTopology::Neighbouring, &[(sender, 1_000_000)]);
        net.submit(send_via(sender, 0, transfer(recipient, 30_000)));

        let first = net.collate(2).await.unwrap();
        assert_eq!(first.out_messages.len(), 1);
        assert_eq!(net.balance(&recipient), U256::zero());

        let second = net.collate(2).await.unwrap();
        assert_eq!(second.committed, vec![first.out_messages[0].hash()]);
        assert_eq!(net.balance(&recipient), U256::from(29_000));
    }
}
