//! Router Module Tests
//!
//! Runs real nodes on loopback ports and checks routing end to end.
//!
//! ## Test Scopes
//! - **Join**: Bootstrap admission, ring propagation, convergence of N members.
//! - **Single key**: Insert/query/delete land on exactly one owner.
//! - **Scatter-gather**: `*` queries return the union, `*` deletes return the total.
//! - **Failures**: Unreachable members are dropped from scans; forwarded inserts report errors.

#[cfg(test)]
mod tests {
    use crate::config::NodeConfig;
    use crate::membership::types::{JoinState, NodeId};
    use crate::node::Node;
    use crate::protocol::client::{ClientSettings, PeerClient};
    use crate::protocol::types::{Envelope, Request, Response};
    use crate::router::selector::KeySelector;
    use std::collections::BTreeMap;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};

    fn test_config(bootstrap: Option<SocketAddr>) -> NodeConfig {
        NodeConfig {
            connect_timeout_ms: 500,
            connect_attempts: 1,
            request_timeout_ms: Some(5_000),
            ..NodeConfig::local("127.0.0.1:0".parse().unwrap(), bootstrap)
        }
    }

    async fn spawn_node(bootstrap: Option<SocketAddr>) -> Node {
        Node::start(&test_config(bootstrap))
            .await
            .expect("Failed to start node")
    }

    /// Polls until every node is `Joined` with a ring of `size` members.
    async fn wait_for_ring(nodes: &[Node], size: usize) {
        let converged = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let mut done = true;
                for node in nodes {
                    let membership = node.membership();
                    if membership.len().await != size
                        || membership.join_state().await != JoinState::Joined
                    {
                        done = false;
                        break;
                    }
                }
                if done {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;

        assert!(converged.is_ok(), "Ring did not converge to {} members", size);
    }

    /// Bootstrap first, then `n - 1` sequential joins.
    async fn start_cluster(n: usize) -> Vec<Node> {
        let bootstrap = spawn_node(None).await;
        let bootstrap_addr = bootstrap.addr();
        let mut nodes = vec![bootstrap];

        for _ in 1..n {
            nodes.push(spawn_node(Some(bootstrap_addr)).await);
            wait_for_ring(&nodes, nodes.len()).await;
        }

        nodes
    }

    /// First `key-<i>` whose owner is `owner`.
    async fn key_owned_by(node: &Node, owner: SocketAddr) -> String {
        for i in 0..10_000 {
            let key = format!("key-{}", i);
            if node.membership().owner_of_key(&key).await == owner {
                return key;
            }
        }
        panic!("No key owned by {} in the first 10000 candidates", owner);
    }

    async fn wait_until_refused(addr: SocketAddr) {
        for _ in 0..100 {
            if TcpStream::connect(addr).await.is_err() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("{} still accepts connections", addr);
    }

    // ============================================================
    // SINGLE NODE
    // ============================================================

    #[tokio::test]
    async fn test_single_node_serves_everything_locally() {
        let node = spawn_node(None).await;
        let router = &node.router;

        router
            .insert("foo".to_string(), "bar".to_string())
            .await
            .unwrap();
        router
            .insert("baz".to_string(), "qux".to_string())
            .await
            .unwrap();

        let found = router.query(&KeySelector::key("foo")).await;
        assert_eq!(found.get("foo"), Some(&"bar".to_string()));
        assert_eq!(found.len(), 1);

        assert_eq!(router.query(&KeySelector::Local).await.len(), 2);
        assert_eq!(router.query(&KeySelector::All).await.len(), 2);

        assert_eq!(router.delete(&KeySelector::key("foo")).await, 1);
        assert!(router.query(&KeySelector::key("foo")).await.is_empty());
        assert_eq!(router.delete(&KeySelector::All).await, 1);
        assert!(router.query(&KeySelector::All).await.is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_join_is_noop() {
        let node = spawn_node(None).await;

        assert!(node.membership().is_bootstrap());
        node.router.join().await.unwrap();
        assert_eq!(node.membership().len().await, 1);
        assert_eq!(node.membership().join_state().await, JoinState::Joined);
    }

    // ============================================================
    // JOIN PROTOCOL
    // ============================================================

    #[tokio::test]
    async fn test_two_node_join() {
        let b = spawn_node(None).await;
        let c = spawn_node(Some(b.addr())).await;

        let nodes = vec![b, c];
        wait_for_ring(&nodes, 2).await;

        let expected = vec![nodes[0].addr(), nodes[1].addr()];
        for node in &nodes {
            let mut addrs: Vec<SocketAddr> = node
                .membership()
                .members()
                .await
                .into_iter()
                .map(|m| m.addr)
                .collect();
            addrs.sort();
            let mut want = expected.clone();
            want.sort();
            assert_eq!(addrs, want);
        }
    }

    #[tokio::test]
    async fn test_sequential_joins_converge() {
        let nodes = start_cluster(5).await;

        let reference = nodes[0].membership().snapshot().await;
        assert_eq!(reference.len(), 5);

        for node in &nodes {
            assert_eq!(
                node.membership().snapshot().await,
                reference,
                "Node {} disagrees on the ring",
                node.addr()
            );
        }

        // Ids really are derived from the listening addresses
        for member in reference.members() {
            assert_eq!(member.id, NodeId::for_addr(&member.addr));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_back_to_back_joins_converge() {
        for _ in 0..5 {
            let bootstrap = spawn_node(None).await;
            let bootstrap_addr = bootstrap.addr();
            let mut nodes = vec![bootstrap];

            // No wait between joins: propagation rounds pile up on the bootstrap
            for _ in 0..6 {
                nodes.push(spawn_node(Some(bootstrap_addr)).await);
            }

            wait_for_ring(&nodes, 7).await;

            let reference = nodes[0].membership().snapshot().await;
            for node in &nodes {
                assert_eq!(
                    node.membership().snapshot().await,
                    reference,
                    "Node {} disagrees on the ring",
                    node.addr()
                );
            }
        }
    }

    #[tokio::test]
    async fn test_join_with_unreachable_bootstrap() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_bootstrap = listener.local_addr().unwrap();
        drop(listener);

        let node = spawn_node(Some(dead_bootstrap)).await;

        assert_eq!(node.membership().join_state().await, JoinState::Unjoined);
        assert_eq!(node.membership().len().await, 1);

        // Still usable as a ring of one
        node.router
            .insert("solo".to_string(), "yes".to_string())
            .await
            .unwrap();
        assert_eq!(node.router.query(&KeySelector::key("solo")).await.len(), 1);
    }

    // ============================================================
    // SINGLE-KEY ROUTING
    // ============================================================

    #[tokio::test]
    async fn test_foo_routes_to_owner() {
        let nodes = start_cluster(2).await;

        let owner = nodes[0].membership().owner_of_key("foo").await;
        let (owner_node, other) = if nodes[0].addr() == owner {
            (&nodes[0], &nodes[1])
        } else {
            (&nodes[1], &nodes[0])
        };

        other
            .router
            .insert("foo".to_string(), "bar".to_string())
            .await
            .unwrap();

        let found = other.router.query(&KeySelector::key("foo")).await;
        assert_eq!(found.get("foo"), Some(&"bar".to_string()));

        // Physically stored on the owner only
        assert_eq!(
            owner_node.router.query(&KeySelector::Local).await.get("foo"),
            Some(&"bar".to_string())
        );
        assert!(other.router.query(&KeySelector::Local).await.is_empty());
    }

    #[tokio::test]
    async fn test_insert_then_query_from_every_node() {
        let nodes = start_cluster(4).await;

        for i in 0..40 {
            let writer = &nodes[i % nodes.len()];
            writer
                .router
                .insert(format!("item-{}", i), format!("value-{}", i))
                .await
                .unwrap();
        }

        for i in 0..40 {
            let key = format!("item-{}", i);
            for reader in &nodes {
                let found = reader.router.query(&KeySelector::key(key.as_str())).await;
                assert_eq!(found.len(), 1, "{} should be found exactly once", key);
                assert_eq!(found.get(&key), Some(&format!("value-{}", i)));
            }
        }

        // Each key lives on exactly one node
        let mut stored = 0;
        for node in &nodes {
            stored += node.router.query(&KeySelector::Local).await.len();
        }
        assert_eq!(stored, 40);
    }

    #[tokio::test]
    async fn test_delete_then_query_is_empty() {
        let nodes = start_cluster(3).await;
        let target = key_owned_by(&nodes[0], nodes[2].addr()).await;

        nodes[0]
            .router
            .insert(target.clone(), "doomed".to_string())
            .await
            .unwrap();

        assert_eq!(nodes[1].router.delete(&KeySelector::key(target.as_str())).await, 1);
        assert_eq!(nodes[1].router.delete(&KeySelector::key(target.as_str())).await, 0);
        assert!(
            nodes[0]
                .router
                .query(&KeySelector::key(target.as_str()))
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_inbound_requests_are_never_reforwarded() {
        let nodes = start_cluster(2).await;
        let foreign = key_owned_by(&nodes[0], nodes[1].addr()).await;

        // Deliver an INSERT for a key node 0 does not own straight to node 0
        let envelope = Envelope {
            sender: nodes[1].addr(),
            receiver: nodes[0].addr(),
            request: Request::Insert {
                key: foreign.clone(),
                value: "here".to_string(),
            },
        };
        assert_eq!(nodes[0].router.handle(envelope).await, Response::Ack);

        let local = nodes[0].router.query(&KeySelector::Local).await;
        assert_eq!(local.get(&foreign), Some(&"here".to_string()));
        assert!(nodes[1].router.query(&KeySelector::Local).await.is_empty());
    }

    // ============================================================
    // SCATTER-GATHER
    // ============================================================

    #[tokio::test]
    async fn test_query_all_returns_union() {
        let nodes = start_cluster(4).await;

        let mut expected = BTreeMap::new();
        for i in 0..50 {
            let key = format!("book-{:03}", i);
            let value = format!("title-{}", i);
            nodes[i % 4]
                .router
                .insert(key.clone(), value.clone())
                .await
                .unwrap();
            expected.insert(key, value);
        }

        for node in &nodes {
            assert_eq!(node.router.query(&KeySelector::All).await, expected);
        }
    }

    #[tokio::test]
    async fn test_delete_all_counts_every_entry() {
        let nodes = start_cluster(3).await;

        for i in 0..30 {
            nodes[0]
                .router
                .insert(format!("k{}", i), "v".to_string())
                .await
                .unwrap();
        }

        assert_eq!(nodes[2].router.delete(&KeySelector::All).await, 30);
        assert!(nodes[1].router.query(&KeySelector::All).await.is_empty());
        assert_eq!(nodes[0].router.delete(&KeySelector::All).await, 0);
    }

    #[tokio::test]
    async fn test_local_selector_stays_local() {
        let nodes = start_cluster(2).await;
        let key0 = key_owned_by(&nodes[0], nodes[0].addr()).await;
        let key1 = key_owned_by(&nodes[0], nodes[1].addr()).await;

        nodes[0].router.insert(key0.clone(), "a".to_string()).await.unwrap();
        nodes[0].router.insert(key1.clone(), "b".to_string()).await.unwrap();

        assert_eq!(nodes[1].router.delete(&KeySelector::Local).await, 1);
        let remaining = nodes[0].router.query(&KeySelector::All).await;
        assert_eq!(remaining.len(), 1);
        assert!(remaining.contains_key(&key0));
    }

    // ============================================================
    // FAILURES
    // ============================================================

    #[tokio::test]
    async fn test_scatter_gather_skips_unreachable_member() {
        let mut nodes = start_cluster(3).await;

        let mut expected = BTreeMap::new();
        let dead_addr = nodes[2].addr();
        for i in 0..30 {
            let key = format!("entry-{}", i);
            nodes[0]
                .router
                .insert(key.clone(), i.to_string())
                .await
                .unwrap();
            if nodes[0].membership().owner_of_key(&key).await != dead_addr {
                expected.insert(key, i.to_string());
            }
        }

        drop(nodes.remove(2));
        wait_until_refused(dead_addr).await;

        // Survivors still answer; the dead member's keys are simply missing
        assert_eq!(nodes[0].router.query(&KeySelector::All).await, expected);
        assert_eq!(
            nodes[1].router.delete(&KeySelector::All).await,
            expected.len() as u64
        );
    }

    #[tokio::test]
    async fn test_forward_failures_degrade_per_operation() {
        let mut nodes = start_cluster(2).await;
        let dead_addr = nodes[1].addr();
        let orphan = key_owned_by(&nodes[0], dead_addr).await;

        drop(nodes.remove(1));
        wait_until_refused(dead_addr).await;

        let survivor = &nodes[0];
        assert!(
            survivor
                .router
                .insert(orphan.clone(), "lost".to_string())
                .await
                .is_err(),
            "Forwarding to a dead owner should be reported"
        );
        assert!(survivor.router.query(&KeySelector::key(orphan.as_str())).await.is_empty());
        assert_eq!(survivor.router.delete(&KeySelector::key(orphan.as_str())).await, 0);
    }

    #[tokio::test]
    async fn test_peer_client_against_running_node() {
        let nodes = start_cluster(2).await;
        let client = PeerClient::new("127.0.0.1:1".parse().unwrap(), ClientSettings::default());

        client
            .call(
                nodes[1].addr(),
                Request::Insert {
                    key: "direct".to_string(),
                    value: "write".to_string(),
                },
            )
            .await
            .unwrap();

        let response = client.call(nodes[1].addr(), Request::QueryAll).await.unwrap();
        let entries = response.into_entries().unwrap();
        assert_eq!(entries.get("direct"), Some(&"write".to_string()));

        let response = client.call(nodes[1].addr(), Request::DeleteAll).await.unwrap();
        assert_eq!(response, Response::Count(1));
    }
}
