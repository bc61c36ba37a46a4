// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use caravan::commands::InitArgs;
use caravan::provider::ProviderOptions;
use caravan::types::Edition;

#[derive(Parser)]
#[command(name = "caravan")]
#[command(about = "Provision and tear down a caravan cluster on AWS, GCP or Azure")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Workspace directory holding .caravan/ (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub workdir: Option<PathBuf>,

    /// Settings file (defaults to caravan.yml in the workspace)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the project, check out its repositories and create the state store
    Init(ProjectFlags),

    /// Build machine images, initializing the project if needed
    Bake(ProjectFlags),

    /// Deploy infrastructure, platform and application support
    Up {
        /// Break an existing run lock
        #[arg(long)]
        break_lock: bool,
    },

    /// Destroy every layer and remove the project
    Clean {
        /// Continue when the state store cannot be removed, accepting leaked resources
        #[arg(long)]
        force: bool,

        /// Break an existing run lock
        #[arg(long)]
        break_lock: bool,
    },

    /// Show the project's status and service versions
    Status,
}

#[derive(Args)]
pub struct ProjectFlags {
    /// Project name, used as a prefix for every cloud resource
    #[arg(short, long)]
    pub project: Option<String>,

    /// Cloud provider: aws, gcp or azure
    #[arg(long)]
    pub provider: Option<String>,

    /// Cloud region
    #[arg(short, long)]
    pub region: Option<String>,

    /// Branch of the layer repositories to check out
    #[arg(short, long)]
    pub branch: Option<String>,

    /// DNS domain the services are exposed under
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Product edition: oss or ent
    #[arg(long)]
    pub edition: Option<Edition>,

    /// AWS credentials profile
    #[arg(long)]
    pub aws_profile: Option<String>,

    /// GCP project hosting the state bucket and service account
    #[arg(long)]
    pub gcp_parent_project: Option<String>,

    /// GCP organization id
    #[arg(long)]
    pub gcp_organization_id: Option<String>,

    /// GCP billing account
    #[arg(long)]
    pub gcp_billing_account: Option<String>,

    /// Azure resource group
    #[arg(long)]
    pub azure_resource_group: Option<String>,

    /// Azure subscription id
    #[arg(long)]
    pub azure_subscription_id: Option<String>,

    /// Azure tenant id
    #[arg(long)]
    pub azure_tenant_id: Option<String>,

    /// Break an existing run lock
    #[arg(long)]
    pub break_lock: bool,
}

impl From<ProjectFlags> for InitArgs {
    fn from(flags: ProjectFlags) -> Self {
        InitArgs {
            project: flags.project,
            provider: flags.provider,
            region: flags.region,
            branch: flags.branch,
            domain: flags.domain,
            edition: flags.edition,
            options: ProviderOptions {
                aws_profile: flags.aws_profile,
                gcp_parent_project: flags.gcp_parent_project,
                gcp_organization_id: flags.gcp_organization_id,
                gcp_billing_account: flags.gcp_billing_account,
                azure_resource_group: flags.azure_resource_group,
                azure_subscription_id: flags.azure_subscription_id,
                azure_tenant_id: flags.azure_tenant_id,
            },
            break_lock: flags.break_lock,
        }
    }
}
