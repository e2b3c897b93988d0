//! Completion providers backed by a real config file and a mock daemon.

use std::sync::Arc;

use clashctl_config::ServerConfig;
use clashctl_core::providers::{ProxySetProvider, ServerNameProvider};
use clashctl_core::{ChildProvider, CommandNode, CommandTree, Proxy, ProxyKind};
use clashctl_test_utils::{MockDaemon, TestConfigBuilder, TestStore};
use pretty_assertions::assert_eq;

fn texts(tree_out: &[clashctl_core::Suggestion]) -> Vec<&str> {
    tree_out.iter().map(|s| s.text.as_str()).collect()
}

#[tokio::test]
async fn server_rm_suggests_configured_names() {
    let config = TestConfigBuilder::new()
        .server("us1", ServerConfig::new("10.0.0.1", 9090))
        .server("jp2", ServerConfig::new("10.0.0.2", 9090))
        .selected("us1")
        .build();
    let fixture = TestStore::with_config(&config).await;

    let tree = CommandTree::new(vec![CommandNode::new("server", "Manage servers").with_children(
        vec![
            CommandNode::new("rm", "Remove a server")
                .with_provider(Arc::new(ServerNameProvider::new(fixture.store.clone()))),
        ],
    )]);

    let out = tree.complete("server rm ").await;
    let mut names = texts(&out);
    names.sort();
    assert_eq!(names, vec!["jp2", "us1"]);

    let out = tree.complete("server rm u").await;
    assert_eq!(texts(&out), vec!["us1"]);
}

#[tokio::test]
async fn server_names_follow_the_file() {
    let fixture = TestStore::empty().await;
    let provider = ServerNameProvider::new(fixture.store.clone());
    let (consumed, nodes) = provider.children(&[""]).await;
    assert_eq!(consumed, 1);
    assert!(nodes.is_empty());

    fixture
        .store
        .add_server("eu3", ServerConfig::new("10.0.0.3", 9090))
        .await
        .unwrap();
    let (_, nodes) = provider.children(&[""]).await;
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].label, "eu3");
}

async fn proxy_fixture() -> (MockDaemon, TestStore) {
    let daemon = MockDaemon::builder()
        .proxy(
            Proxy::new("Proxy Group", ProxyKind::Selector)
                .with_members(["JP 02", "HK 01"])
                .with_now("HK 01"),
        )
        .proxy(
            Proxy::new("Auto", ProxyKind::Selector)
                .with_members(["HK 01"])
                .with_now("HK 01"),
        )
        .proxy(Proxy::new("HK 01", ProxyKind::Other("Vmess".into())))
        .proxy(Proxy::new("JP 02", ProxyKind::Other("Vmess".into())))
        .start()
        .await;
    let config = TestConfigBuilder::new()
        .server("local", daemon.server_config())
        .selected("local")
        .build();
    let fixture = TestStore::with_config(&config).await;
    (daemon, fixture)
}

#[tokio::test]
async fn proxy_set_lists_groups_then_members() {
    let (_daemon, fixture) = proxy_fixture().await;
    let provider = ProxySetProvider::new(fixture.store.clone());

    let (consumed, groups) = provider.children(&[""]).await;
    assert_eq!(consumed, 1);
    let labels: Vec<_> = groups.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, vec!["Auto", "Proxy%20Group"]);
    assert_eq!(groups[1].description, "select `HK 01` now");

    let (consumed, members) = provider.children(&["Proxy%20Group", ""]).await;
    assert_eq!(consumed, 2);
    let labels: Vec<_> = members.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, vec!["HK%2001", "JP%2002"]);
}

#[tokio::test]
async fn proxy_set_unknown_group_is_empty() {
    let (_daemon, fixture) = proxy_fixture().await;
    let provider = ProxySetProvider::new(fixture.store.clone());
    let (consumed, nodes) = provider.children(&["Nope", ""]).await;
    assert_eq!(consumed, 0);
    assert!(nodes.is_empty());
}

#[tokio::test]
async fn proxy_set_walk_through_tree() {
    let (_daemon, fixture) = proxy_fixture().await;
    let tree = CommandTree::new(vec![CommandNode::new("proxy", "").with_children(vec![
        CommandNode::new("set", "")
            .with_provider(Arc::new(ProxySetProvider::new(fixture.store.clone()))),
    ])]);

    let out = tree.complete("proxy set Pro").await;
    assert_eq!(texts(&out), vec!["Proxy%20Group"]);
    let out = tree.complete("proxy set Proxy%20Group J").await;
    assert_eq!(texts(&out), vec!["JP%2002"]);
}
