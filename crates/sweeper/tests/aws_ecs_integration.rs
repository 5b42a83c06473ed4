//! ECS integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```text
//! AWS_PROFILE=your_profile cargo test --test aws_ecs_integration -- --ignored
//! ```
//!
//! They only touch a task definition family created by the test itself.

mod aws_test_helpers;

use aws_sdk_ecs::types::ContainerDefinition;
use aws_test_helpers::*;
use sweeper::aws::{EcsClient, FromAwsContext};
use sweeper_core::{Inventory, Recency, RetentionPolicy};

async fn register_revision(client: &aws_sdk_ecs::Client, family: &str) {
    client
        .register_task_definition()
        .family(family)
        .container_definitions(
            ContainerDefinition::builder()
                .name("app")
                .image("public.ecr.aws/docker/library/busybox:latest")
                .memory(128)
                .build(),
        )
        .send()
        .await
        .expect("Should register task definition");
}

/// Register three revisions, keep one, deregister the rest
#[tokio::test]
#[ignore]
async fn test_task_definition_revision_lifecycle() {
    let (ctx, _) = test_context().await;
    let raw = ctx.ecs_client();
    let family = test_group_name();

    for _ in 0..3 {
        register_revision(&raw, &family).await;
    }

    let ecs = EcsClient::from_context(&ctx);
    let revisions = ecs
        .list_resources(&family)
        .await
        .expect("Should list revisions");
    assert_eq!(revisions.len(), 3);
    assert!(revisions.iter().all(|r| matches!(r.recency, Recency::Revision(_))));

    let candidates = RetentionPolicy::keep_most_recent(1).select(revisions);
    assert_eq!(candidates.len(), 2);

    let outcomes = ecs
        .delete_batch(&family, &candidates.into_resources())
        .await
        .expect("Should deregister revisions");
    assert_eq!(outcomes.len(), 2);

    let remaining = ecs
        .list_resources(&family)
        .await
        .expect("Should list remaining revisions");
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].id.ends_with(":3"));

    // Clean up the last revision
    ecs.delete_batch(&family, &remaining)
        .await
        .expect("Should deregister last revision");
}

/// In-use lookups are read-only and must succeed on any account
#[tokio::test]
#[ignore]
async fn test_in_use_lookups() {
    let (ctx, _) = test_context().await;
    let ecs = EcsClient::from_context(&ctx);

    let services = ecs
        .service_task_definitions()
        .await
        .expect("Should list service task definitions");
    assert!(services.iter().all(|arn| arn.contains(":task-definition/")));

    ecs.active_task_definition_images()
        .await
        .expect("Should describe active task definitions");
}
