//! Read-only listing against a real account
//!
//! Run with:
//! ```text
//! AWS_PROFILE=your_profile cargo test --test aws_readonly_integration -- --ignored
//! ```

mod aws_test_helpers;

use aws_test_helpers::*;
use sweeper::aws::{BeanstalkClient, EcrClient, FromAwsContext, ImageSelection, SharedImageUsage};
use sweeper_core::Inventory;

#[tokio::test]
#[ignore]
async fn test_list_beanstalk_applications() {
    let (ctx, _) = test_context().await;
    let beanstalk = BeanstalkClient::from_context(&ctx);

    let applications = beanstalk
        .list_groups()
        .await
        .expect("Should describe applications");
    let deployed = beanstalk
        .list_in_use()
        .await
        .expect("Should describe environments");

    for reference in deployed.iter() {
        let (application, _) = reference.split_once('/').expect("app/label reference");
        assert!(applications.iter().any(|a| a == application));
    }
}

#[tokio::test]
#[ignore]
async fn test_list_ecr_repositories() {
    let (ctx, account) = test_context().await;
    let ecr = EcrClient::from_context(&ctx, &account, ImageSelection::Untagged, SharedImageUsage::new());

    let repositories = ecr
        .list_groups()
        .await
        .expect("Should describe repositories");

    if let Some(repository) = repositories.first() {
        let images = ecr
            .list_resources(repository)
            .await
            .expect("Should describe images");
        assert!(images.iter().all(|i| i.id.starts_with("sha256:")));
        assert!(images.iter().all(|i| i.label.is_none()));
    }
}
