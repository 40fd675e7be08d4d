use clap::Parser;

/// Arguments for the link helper
#[derive(Parser, Debug)]
pub struct LinkArgs {
    /// Base64url-encoded JSON array of {"old", "new"} pairs
    pub payload: String,
}
