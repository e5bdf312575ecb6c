//! # Collation Benchmarks
//!
//! | Benchmark | Measures |
//! |-----------|----------|
//! | `handler/batch` | executing a batch of self calls against fresh state |
//! | `generator/block` | executing and committing a whole block |
//! | `topology/neighbours` | neighbour selection on large rings |

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use node_runtime::GenesisBuilder;
use sc_01_topology::ShardTopology;
use sc_02_storage::{MemoryStorage, Storage};
use sc_03_execution::{
    AccountState, MessageHandler, ReferenceEngine, StorageMessageLookup, StorageState,
};
use sc_04_collator::{BlockGeneratorFactory, GeneratorParams, StateBlockGeneratorFactory};
use shared_types::{Address, BlockContext, Gas, Hash, Message, Proposal, U256};
use std::sync::Arc;

const BATCH_SIZES: [u64; 3] = [10, 100, 1_000];

fn wallet(i: u64) -> Address {
    let mut payload = [0u8; 18];
    payload[10..].copy_from_slice(&i.to_be_bytes());
    Address::on_shard(1, payload)
}

fn funded_storage(accounts: u64) -> MemoryStorage {
    let storage = MemoryStorage::new();
    GenesisBuilder::new(2)
        .with_accounts(
            (0..accounts).map(|i| (wallet(i), AccountState::with_balance(U256::from(1_000_000_000u64)))),
        )
        .build(&storage)
        .expect("genesis");
    storage
}

fn batch(size: u64) -> Vec<Message> {
    (0..size)
        .map(|i| Message {
            from: wallet(i),
            to: wallet(i),
            gas_limit: Gas(5_000),
            gas_price: U256::one(),
            ..Message::default()
        })
        .collect()
}

fn bench_handler(c: &mut Criterion) {
    let mut group = c.benchmark_group("handler");
    let ctx = BlockContext {
        shard_id: 1,
        block_number: 1,
        prev_block: Hash::ZERO,
        main_chain_hash: Hash::ZERO,
    };

    for size in BATCH_SIZES {
        let storage = funded_storage(size);
        let shared: Arc<dyn Storage> = Arc::new(storage.clone());
        let lookup = StorageMessageLookup::new(Arc::clone(&shared));
        let handler = MessageHandler::new(1);
        let messages = batch(size);

        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("batch", size), &messages, |b, messages| {
            b.iter(|| {
                let tx = storage.begin_rw().expect("tx");
                let mut state = StorageState::new(1, tx, ReferenceEngine::default());
                black_box(
                    handler
                        .handle_messages(&mut state, &lookup, messages, &ctx)
                        .expect("batch"),
                )
            })
        });
    }
    group.finish();
}

fn bench_generator(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");

    for size in BATCH_SIZES {
        let proposal = Proposal {
            in_msgs: batch(size),
            ..Proposal::default()
        };

        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("block", size), &proposal, |b, proposal| {
            b.iter_batched(
                || {
                    let storage: Arc<dyn Storage> = Arc::new(funded_storage(size));
                    StateBlockGeneratorFactory::new(storage, ReferenceEngine::default())
                        .new_generator(GeneratorParams { shard_id: 1 })
                        .expect("generator")
                },
                |mut generator| {
                    black_box(
                        runtime
                            .block_on(generator.generate_block(proposal))
                            .expect("block"),
                    )
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_topology(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology");
    for n_shards in [16u16, 256, 4096] {
        for topology in [ShardTopology::Neighbouring, ShardTopology::Trivial] {
            group.bench_with_input(
                BenchmarkId::new(format!("neighbours/{}", topology.id()), n_shards),
                &n_shards,
                |b, &n| b.iter(|| black_box(topology.neighbours(n / 2, n))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_handler, bench_generator, bench_topology);
criterion_main!(benches);
