//! restore-parameters and restore-secrets commands

use anyhow::{Context as _, Result};
use secretstash_backup::{
    ParameterRestore, RestoreOptions, RestoreRunner, RestoreTarget, SealedStore, SecretRestore,
};
use secretstash_core::types::RetryPolicy;
use secretstash_envelope::{KmsKeyService, S3ObjectStore};
use secretstash_inventory::{SecretsManagerStore, SsmParameterStore};

use super::{Context, Locations};
use crate::cli::RestoreArgs;
use crate::output;

pub async fn run_parameters(args: RestoreArgs, context: &Context) -> Result<()> {
    let locations = context.locations(&args.bundle)?;
    let sdk_config = context.current_aws().await;
    let store = SsmParameterStore::new(&sdk_config);
    let policy = write_policy(&context.config.restore.parameter_writes, args.write_attempts);
    let target = ParameterRestore::new(&store, policy);
    run("Restore parameters", &target, locations, &args, context, &sdk_config).await
}

pub async fn run_secrets(args: RestoreArgs, context: &Context) -> Result<()> {
    let locations = context.locations(&args.bundle)?;
    let sdk_config = context.current_aws().await;
    let store = SecretsManagerStore::new(&sdk_config);
    let policy = write_policy(&context.config.restore.secret_writes, args.write_attempts);
    let target = SecretRestore::new(&store, policy);
    run("Restore secrets", &target, locations, &args, context, &sdk_config).await
}

/// The configured policy, with `--write-attempts` replacing its attempt count
fn write_policy(configured: &RetryPolicy, attempts: Option<u32>) -> RetryPolicy {
    match attempts {
        Some(attempts) => configured.with_attempts(attempts),
        None => configured.clone(),
    }
}

async fn run<T>(
    title: &str,
    target: &T,
    locations: Locations,
    args: &RestoreArgs,
    context: &Context,
    sdk_config: &aws_config::SdkConfig,
) -> Result<()>
where
    T: RestoreTarget,
{
    let Locations { bundle, data_key } = locations;
    let cipher = context.cipher(&args.bundle);

    output::header(title);
    output::kv("Bundle", &bundle.to_string());
    output::kv("Data key", &data_key.to_string());
    output::kv(
        "Write attempts",
        &target.write_policy().max_attempts.max(1).to_string(),
    );
    if args.dry_run {
        output::dry_run_notice();
    }

    let storage = S3ObjectStore::new(sdk_config, context.endpoint());
    let kms = KmsKeyService::new(sdk_config);
    let runner = RestoreRunner::new(SealedStore::new(&storage, &kms, cipher));
    let options = RestoreOptions {
        bundle,
        data_key,
        dry_run: args.dry_run,
    };

    let report = runner
        .run(target, &options)
        .await
        .with_context(|| format!("Restore from {} failed", options.bundle))?;

    output::restore_report(&report, target.kind());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secretstash_core::types::RetryStrategy;

    #[test]
    fn test_write_attempts_override() {
        let configured = RetryPolicy::fixed(3, 2000);

        let overridden = write_policy(&configured, Some(5));
        assert_eq!(overridden.max_attempts, 5);
        assert_eq!(overridden.initial_delay_ms, 2000);

        assert_eq!(write_policy(&configured, None), configured);
    }

    #[test]
    fn test_secret_policy_gains_a_pause_with_retries() {
        let overridden = write_policy(&RetryPolicy::single_attempt(), Some(3));
        assert_eq!(overridden.max_attempts, 3);
        assert_eq!(overridden.strategy, RetryStrategy::FixedDelay);
        assert_eq!(overridden.initial_delay_ms, 2000);
    }
}
