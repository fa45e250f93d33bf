//! Serve a few requests against an in-memory node and print the responses.
//!
//! Run: `cargo run --example local_node -- --verbose`

use std::sync::Arc;

use clap::Parser;
use tracing::Level;

use kad_server::{
    collaborators::MemoryRoutingTable,
    server::PrefixClassifier,
    validators::{NamespacedValidator, SignedValue, SignedValueValidator},
    Context, DefaultServer, Message, MessageType, PeerId, PeerInfo, Record, Server, SigningKey,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Value to publish
    #[arg(default_value = "hello world")]
    value: String,
    /// Number of peers in the routing table
    #[arg(short, long, default_value_t = 32)]
    peers: usize,
    /// Log every request
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    let local_id = PeerId::random();
    let routing_table = Arc::new(MemoryRoutingTable::new(local_id.clone()));
    for _ in 0..cli.peers {
        routing_table.add(PeerId::random());
    }

    let server = DefaultServer::builder(local_id.clone())
        .validator(Arc::new(
            NamespacedValidator::new().with("pk", Arc::new(SignedValueValidator)),
        ))
        .routing_table(routing_table)
        .local_addrs(vec!["127.0.0.1:4000".parse().expect("addr")])
        .classifier(Arc::new(PrefixClassifier::new(&b"ptr"[..])))
        .build()
        .expect("server");

    let ctx = Context::new();
    let requester = PeerId::random();

    let signer = SigningKey::from_bytes(&rand::random());
    let key = SignedValue::record_key("pk", signer.verifying_key().as_bytes());

    println!("\n=== PUT_VALUE ===");
    for seq in [2, 1] {
        let value = SignedValue::new(&signer, cli.value.as_bytes(), seq)
            .to_bytes()
            .expect("encode signed value");
        let request = Message::new(MessageType::PutValue, key.clone(), 0)
            .with_record(Record::new(key.clone(), value));

        match server.handle_request(&ctx, &requester, request) {
            Ok(_) => println!("seq {}: stored", seq),
            Err(error) => println!("seq {}: {}", seq, error),
        }
    }

    println!("\n=== GET_VALUE ===");
    let response = server
        .handle_request(
            &ctx,
            &requester,
            Message::new(MessageType::GetValue, key.clone(), 0),
        )
        .expect("get_value");

    if let Some(record) = response.and_then(|r| r.record) {
        let value = SignedValue::from_bytes(&record.value).expect("signed value");
        println!(
            "seq {} = {:?} (received {:?})",
            value.seq(),
            String::from_utf8_lossy(value.value()),
            record.time_received
        );
    }

    println!("\n=== FIND_NODE ===");
    let response = server
        .handle_request(
            &ctx,
            &requester,
            Message::new(MessageType::FindNode, local_id.to_bytes(), 0),
        )
        .expect("find_node");
    println!("{:?}", response.map(|r| r.closer_peers));

    // A content id is a CIDv0 here: the sha2-256 multihash header followed by a digest.
    let mut cid = vec![0x12, 0x20];
    cid.extend(rand::random::<[u8; 32]>());

    println!("\n=== ADD_PROVIDER ===");
    let provider = PeerInfo::new(PeerId::random(), vec!["127.0.0.1:4001".parse().expect("addr")]);
    server
        .handle_request(
            &ctx,
            &requester,
            Message::new(MessageType::AddProvider, cid.clone(), 0)
                .with_provider_peers(vec![provider.clone()]),
        )
        .expect("add_provider");
    println!("added {}", provider.id);

    println!("\n=== GET_PROVIDERS ===");
    let response = server
        .handle_request(
            &ctx,
            &requester,
            Message::new(MessageType::GetProviders, cid, 0),
        )
        .expect("get_providers");

    if let Some(response) = response {
        for provider in response.provider_peers {
            println!("provider {} at {:?}", provider.id, provider.addrs);
        }
        println!("{} closer peers", response.closer_peers.len());
    }
}
