//! Arguments for the piptool utility

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Evaluates authorization requests against an X.509 policy information point
#[derive(Parser, Debug, Serialize, Deserialize, Default)]
#[command(arg_required_else_help(true))]
#[clap(author, version, about, long_about = None)]
pub struct PiptoolArgs {
    /// Full path and filename of a JSON-formatted PipSettings file. Values given on the command
    /// line override values read from the file.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub settings: Option<String>,

    /// Full path of folder containing PEM or DER-encoded trust anchors used to validate certificate
    /// chains.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub ta_folder: Option<String>,

    /// Full path of folder containing PEM or DER-encoded attribute authority certificates. When
    /// present, VOMS attribute certificate support is enabled.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub ac_trust_folder: Option<String>,

    /// Time to use for validity checks expressed as the number of seconds since Unix epoch
    /// (defaults to current system time).
    #[clap(short = 'i', long, help_heading = "COMMON OPTIONS")]
    pub time_of_interest: Option<u64>,

    /// Full path and filename of YAML-formatted configuration file for log4rs logging mechanism.
    /// See <https://docs.rs/log4rs/latest/log4rs/> for details.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub logging_config: Option<String>,

    /// Full path and filename of a JSON-formatted request to populate.
    #[clap(short, long, help_heading = "EVALUATION", conflicts_with = "chain")]
    pub request: Option<String>,

    /// Full path and filename of a PEM-encoded certificate chain. A request with a single subject
    /// carrying the chain is evaluated.
    #[clap(short, long, help_heading = "EVALUATION")]
    pub chain: Option<String>,

    /// Flag that indicates certificate chains must include a proxy certificate.
    #[clap(short = 'p', long, help_heading = "EVALUATION")]
    pub require_proxy: bool,

    /// Flag that indicates certificate chains should not be validated.
    #[clap(long, help_heading = "EVALUATION")]
    pub no_pkix: bool,

    /// Flag that indicates RSA with SHA-1 signatures should be accepted.
    #[clap(long, help_heading = "EVALUATION")]
    pub allow_sha1: bool,

    /// Flag that indicates trust anchors should be listed, then exit.
    #[clap(long, help_heading = "DIAGNOSTICS")]
    pub list_trust_anchors: bool,
}
