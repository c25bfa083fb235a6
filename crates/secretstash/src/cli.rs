//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{ArgAction, Args, Parser, Subcommand};
use secretstash_core::types::EncryptionAlgorithm;

/// secretstash - encrypted backups of SSM parameters and Secrets Manager secrets
#[derive(Parser, Debug)]
#[command(name = "secretstash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to secretstash.yaml
    #[arg(short, long, global = true, env = "SECRETSTASH_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Region of the current account
    #[arg(long, global = true, env = "SECRETSTASH_REGION")]
    pub region: Option<String>,

    /// S3-compatible endpoint (MinIO, LocalStack)
    #[arg(long, global = true, env = "SECRETSTASH_ENDPOINT")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a data key and store its wrapped form
    GenerateDataKey(GenerateDataKeyArgs),

    /// Back up parameters to an encrypted bundle
    BackupParameters(BackupParametersArgs),

    /// Back up secrets to an encrypted bundle
    BackupSecrets(BackupSecretsArgs),

    /// Decrypt a bundle and print the backup document
    DownloadBackup(DownloadBackupArgs),

    /// Restore parameters whose current value is the placeholder
    RestoreParameters(RestoreArgs),

    /// Restore secrets whose current value is the placeholder
    RestoreSecrets(RestoreArgs),

    /// Show version information
    Version(VersionArgs),
}

/// Where the bundle and the wrapped data key live
#[derive(Args, Debug, Clone, Default)]
pub struct BundleArgs {
    /// Bucket holding the bundle
    #[arg(long, env = "SECRETSTASH_BUCKET")]
    pub bucket_name: Option<String>,

    /// Object key of the bundle; the nonce is stored at `<key>.nonce`
    #[arg(long, env = "SECRETSTASH_KEY")]
    pub key: Option<String>,

    /// Bucket holding the wrapped data key [default: --bucket-name]
    #[arg(long, env = "SECRETSTASH_DATA_KEY_BUCKET")]
    pub data_key_bucket_name: Option<String>,

    /// Object key of the wrapped data key
    #[arg(long, env = "SECRETSTASH_DATA_KEY_KEY")]
    pub data_key_key: Option<String>,

    /// Cipher (aes256gcm or chacha20poly1305); must match the backup
    #[arg(long, env = "SECRETSTASH_ALGORITHM")]
    pub algorithm: Option<EncryptionAlgorithm>,
}

#[derive(Args, Debug)]
pub struct GenerateDataKeyArgs {
    /// Region of the KMS key and the bucket
    #[arg(long, env = "SECRETSTASH_TARGET_REGION")]
    pub target_region: Option<String>,

    /// Bucket to store the wrapped data key in
    #[arg(long, env = "SECRETSTASH_DATA_KEY_BUCKET")]
    pub bucket_name: Option<String>,

    /// Object key for the wrapped data key
    #[arg(long, env = "SECRETSTASH_DATA_KEY_KEY")]
    pub key: Option<String>,

    /// KMS master key (id, ARN, or alias) that wraps the data key
    #[arg(long, env = "SECRETSTASH_KMS_KEY_ID")]
    pub encryption_kms_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct BackupParametersArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    /// Region holding the bucket and KMS key
    #[arg(long, env = "SECRETSTASH_TARGET_REGION")]
    pub target_region: Option<String>,

    /// Back up only this parameter
    #[arg(long)]
    pub parameter_name: Option<String>,
}

#[derive(Args, Debug)]
pub struct BackupSecretsArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    /// Region holding the bucket and KMS key
    #[arg(long, env = "SECRETSTASH_TARGET_REGION")]
    pub target_region: Option<String>,

    /// Back up only this secret (name or ARN)
    #[arg(long)]
    pub secret_name: Option<String>,
}

#[derive(Args, Debug)]
pub struct DownloadBackupArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    /// Report what would be written without writing it
    #[arg(long, default_value_t = true, action = ArgAction::Set, env = "SECRETSTASH_DRY_RUN")]
    pub dry_run: bool,

    /// Attempts per write, overriding the configured policy
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub write_attempts: Option<u32>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
