use clap::Subcommand;

use super::fingerprint::FingerprintArgs;
use super::plan::PlanArgs;
use super::resolve::ResolveArgs;
use super::validate::ValidateArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Resolve the effective template for one node or a batch of nodes
    Resolve(ResolveArgs),

    /// List the rules that match a node, in application order
    Plan(PlanArgs),

    /// Print the revision fingerprint a node would get
    Fingerprint(FingerprintArgs),

    /// Check a rule collection and report every violation
    Validate(ValidateArgs),

    /// Show version, build and configuration information
    Info,
}
