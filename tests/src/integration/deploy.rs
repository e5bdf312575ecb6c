//! # Contract Deployment
//!
//! Main-shard deployments only succeed as internal messages from the system
//! wallet; other shards accept self-funded external deployments, after which
//! calls must carry an authorization proof keyed by the contract code.

#[cfg(test)]
mod tests {
    use crate::fixtures::{send_via, wallet, TestNet};
    use sc_01_topology::ShardTopology;
    use shared_types::{
        Address, DeployMessage, Gas, Hash, Message, MAIN_SHARD_ID, MAIN_WALLET_ADDRESS, U256,
    };

    fn deploy_message(shard_id: u16, code: &[u8], value: u64) -> (Address, Message) {
        let deploy = DeployMessage {
            shard_id,
            code: code.to_vec(),
            seqno: 0,
        };
        let address = deploy.address();
        let msg = Message {
            to: address,
            value: U256::from(value),
            gas_limit: Gas(20_000),
            gas_price: U256::one(),
            data: deploy.encode().unwrap(),
            deploy: true,
            ..Message::default()
        };
        (address, msg)
    }

    #[tokio::test]
    async fn test_system_wallet_deploys_onto_main_shard() {
        let net = TestNet::new(2, ShardTopology::Neighbouring, &[(MAIN_WALLET_ADDRESS, 1_000_000)]);
        let (address, inner) = deploy_message(MAIN_SHARD_ID, b"registry", 30_000);
        net.submit(send_via(MAIN_WALLET_ADDRESS, 0, inner));

        let emitting = net.collate(MAIN_SHARD_ID).await.unwrap();
        assert_eq!(emitting.out_messages.len(), 1);
        let deploying = net.collate(MAIN_SHARD_ID).await.unwrap();

        let receipts = net.receipts(MAIN_SHARD_ID, deploying.block.id);
        assert_eq!(receipts.len(), 1);
        assert!(receipts[0].success);
        assert_eq!(receipts[0].contract_address, address);
        assert_eq!(receipts[0].gas_used, Gas(10_000));
        assert_eq!(receipts[0].logs[0].topics, vec![Hash::keccak(b"registry")]);

        let contract = net.account(&address).unwrap();
        assert_eq!(contract.code, b"registry".to_vec());
        assert_eq!(contract.balance, U256::from(20_000));
    }

    #[tokio::test]
    async fn test_user_wallet_cannot_deploy_onto_main_shard() {
        let user = wallet(MAIN_SHARD_ID, 7);
        let net = TestNet::new(2, ShardTopology::Neighbouring, &[(user, 1_000_000)]);
        let (address, inner) = deploy_message(MAIN_SHARD_ID, b"registry", 30_000);
        net.submit(send_via(user, 0, inner));

        net.collate(MAIN_SHARD_ID).await.unwrap();
        let deploying = net.collate(MAIN_SHARD_ID).await.unwrap();

        let receipts = net.receipts(MAIN_SHARD_ID, deploying.block.id);
        assert_eq!(receipts.len(), 1);
        assert!(!receipts[0].success);
        assert_eq!(receipts[0].gas_used, Gas(20_000));
        let target = net.account(&address).unwrap();
        assert!(target.code.is_empty());
        assert_eq!(target.balance, U256::from(10_000));
    }

    #[tokio::test]
    async fn test_external_main_shard_deploy_is_evicted_from_pool() {
        let user = wallet(MAIN_SHARD_ID, 7);
        let net = TestNet::new(2, ShardTopology::Neighbouring, &[(user, 1_000_000)]);
        let (_, msg) = deploy_message(MAIN_SHARD_ID, b"registry", 0);
        net.submit(Message { from: user, ..msg });

        assert!(net.collate(MAIN_SHARD_ID).await.is_none());
        assert!(net.pool(MAIN_SHARD_ID).is_empty());
        assert_eq!(net.head(MAIN_SHARD_ID).1.id, 0);
    }

    #[tokio::test]
    async fn test_self_deployed_contract_requires_authorized_calls() {
        let code = b"counter".to_vec();
        let (address, deploy) = deploy_message(1, &code, 0);
        let net = TestNet::new(2, ShardTopology::Neighbouring, &[(address, 100_000)]);
        net.submit(Message {
            from: address,
            ..deploy
        });

        let deployed = net.collate(1).await.unwrap();
        assert_eq!(deployed.summary.accepted, 1);
        let contract = net.account(&address).unwrap();
        assert_eq!(contract.code, code);
        assert_eq!(contract.seqno, 1);
        assert_eq!(contract.balance, U256::from(90_000));

        let call = |seqno| Message {
            from: wallet(1, 5),
            to: address,
            seqno,
            gas_limit: Gas(5_000),
            gas_price: U256::one(),
            ..Message::default()
        };
        let mut authorized = call(1);
        authorized.authorize(&code);
        let unauthorized = call(2);
        let authorized_hash = net.submit(authorized);
        let unauthorized_hash = net.submit(unauthorized);

        let called = net.collate(1).await.unwrap();
        assert_eq!(called.committed, vec![authorized_hash, unauthorized_hash]);
        let receipts = net.receipts(1, called.block.id);
        assert!(receipts[0].success);
        assert!(!receipts[1].success);
        assert_eq!(receipts[1].gas_used, Gas::ZERO);

        let contract = net.account(&address).unwrap();
        assert_eq!(contract.seqno, 2);
        assert_eq!(contract.balance, U256::from(89_000));
    }
}
