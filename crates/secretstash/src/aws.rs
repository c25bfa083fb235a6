//! AWS client configuration

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::debug;

/// Resolve credentials and region the standard way, pinning the region when
/// one is given
pub async fn load(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    let sdk_config = loader.load().await;
    debug!(region = ?sdk_config.region(), "Loaded AWS configuration");
    sdk_config
}
