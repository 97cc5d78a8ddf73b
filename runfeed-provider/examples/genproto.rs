//! Generate updated proto code for the ML metadata store client.
//!
//! This is setup as an example instead of as part of the build.rs so that building the provider
//! does not require protoc.

use anyhow::{Context, Result};

fn main() -> Result<()> {
    tonic_build::configure()
        .out_dir("src/grpc")
        .build_client(true)
        .build_server(false)
        .compile(&["../proto/ml_metadata.proto"], &["../proto"])
        .context("error compiling ml_metadata proto")?;

    Ok(())
}
