use std::time::Duration;

use assert_matches::assert_matches;
use deployer_network_client_interface::{ClusterInfo, MockNetworkControlClient, NetworkClientError};
use mockall::Sequence;
use rstest::rstest;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

use crate::core::context::{ContextError, DeployContext};
use crate::core::health::{HealthError, HealthPoller, ProgressIndicator};
use crate::tests::common::{ctx, healthy_cluster};

const INTERVAL: Duration = Duration::from_millis(1);

#[rstest]
#[case::network_unhealthy(ClusterInfo { healthy: false, ..healthy_cluster(&["s1"], &[]) })]
#[case::vms_unhealthy(ClusterInfo { custom_vms_healthy: false, ..healthy_cluster(&["s1"], &[]) })]
#[tokio::test]
async fn polls_until_both_flags_are_set(ctx: DeployContext, #[case] not_ready: ClusterInfo) {
    let mut client = MockNetworkControlClient::new();
    let mut seq = Sequence::new();
    client.expect_health().times(2).in_sequence(&mut seq).returning(move || Ok(Some(not_ready.clone())));
    client.expect_health().times(1).in_sequence(&mut seq).returning(|| Ok(Some(healthy_cluster(&["s1"], &[]))));

    let info = HealthPoller::new(&client, INTERVAL).wait_healthy(&ctx).await.unwrap();

    assert!(info.is_ready());
}

#[rstest]
#[tokio::test]
async fn missing_cluster_info_polls_again(ctx: DeployContext) {
    let mut client = MockNetworkControlClient::new();
    let mut seq = Sequence::new();
    client.expect_health().times(1).in_sequence(&mut seq).returning(|| Ok(None));
    client.expect_health().times(1).in_sequence(&mut seq).returning(|| Ok(Some(healthy_cluster(&["s1"], &[]))));

    let info = HealthPoller::new(&client, INTERVAL).wait_healthy(&ctx).await.unwrap();

    assert_eq!(info.subnets, vec!["s1".to_string()]);
}

#[rstest]
#[case::not_bootstrapped(NetworkClientError::NotBootstrapped)]
#[case::transport(NetworkClientError::Transport("connection refused".to_string()))]
#[tokio::test]
async fn client_errors_are_not_retried(ctx: DeployContext, #[case] error: NetworkClientError) {
    let mut client = MockNetworkControlClient::new();
    let message = error.to_string();
    let mut error = Some(error);
    client.expect_health().times(1).returning(move || Err(error.take().unwrap()));

    let result = HealthPoller::new(&client, INTERVAL).wait_healthy(&ctx).await;

    assert_matches!(result, Err(HealthError::Client(e)) if e.to_string() == message);
}

#[tokio::test]
async fn deadline_ends_an_endless_wait() {
    let ctx = DeployContext::with_timeout(Duration::from_millis(50));
    let mut client = MockNetworkControlClient::new();
    client.expect_health().returning(|| Ok(None));

    let started = tokio::time::Instant::now();
    let result = HealthPoller::new(&client, Duration::from_millis(5)).wait_healthy(&ctx).await;

    assert_matches!(result, Err(HealthError::Context(ContextError::DeadlineExceeded)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn deadline_wins_over_a_later_healthy_report() {
    let ctx = DeployContext::with_timeout(Duration::from_millis(100));
    let mut client = MockNetworkControlClient::new();
    let mut polls = 0;
    client.expect_health().returning(move || {
        polls += 1;
        let cluster = healthy_cluster(&["s1"], &[]);
        match polls {
            1 => Ok(Some(ClusterInfo { healthy: false, ..cluster })),
            _ => Ok(Some(cluster)),
        }
    });

    // The second poll is due after the deadline
    let result = HealthPoller::new(&client, Duration::from_millis(60)).wait_healthy(&ctx).await;

    assert_matches!(result, Err(HealthError::Context(ContextError::DeadlineExceeded)));
}

#[tokio::test]
async fn cancelled_context_issues_no_request() {
    let token = CancellationToken::new();
    let ctx = DeployContext::new(token.clone(), None);
    let client = MockNetworkControlClient::new();
    token.cancel();

    let result = HealthPoller::new(&client, INTERVAL).wait_healthy(&ctx).await;

    assert_matches!(result, Err(HealthError::Context(ContextError::Cancelled)));
}

#[tokio::test]
#[traced_test]
async fn progress_is_reported_while_waiting() {
    let progress = ProgressIndicator::spawn(Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!progress.is_finished());
    assert!(logs_contain("Waiting for the network to become healthy"));
}
